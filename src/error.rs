use actix_web::{http::StatusCode, ResponseError};
use log::{error, warn};
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

use crate::response::response_from_error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Param(String),
    #[error("{0}")]
    Conflict(String),
    #[error("system_exception")]
    System,
}

impl AppError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn param_error(msg: impl Into<String>) -> Self {
        Self::Param(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn system_exception() -> Self {
        Self::System
    }

    /// Maps a store failure. Constraint violations become 409, anything else 500.
    pub fn from_db(context: &str, err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(msg)) => {
                warn!("{} rejected: {}", context, msg);
                Self::conflict(format!("{}: value already exists", context))
            }
            Some(SqlErr::ForeignKeyConstraintViolation(msg)) => {
                warn!("{} rejected: {}", context, msg);
                Self::conflict(format!("{}: referenced row does not exist", context))
            }
            _ => {
                error!("{} failed: {}", context, err);
                Self::system_exception()
            }
        }
    }

    pub fn msg(&self) -> String {
        self.to_string()
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Param(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::System => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> actix_web::HttpResponse {
        response_from_error(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(AppError::not_found("user 1").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::param_error("title").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::conflict("tag").status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::system_exception().status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn plain_db_error_is_system() {
        let err = AppError::from_db("list users", DbErr::Custom("boom".to_string()));
        assert!(matches!(err, AppError::System));
    }
}
