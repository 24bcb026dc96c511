use actix_web::{
    error::{PathError, UrlencodedError},
    http::header,
    HttpRequest, HttpResponse, ResponseError,
};
use log::error;
use minijinja::context;
use serde::Serialize;

use crate::error::AppError;
use crate::templates;

/// A rendered page: the template to use plus the values it needs.
pub struct View {
    pub template: &'static str,
    pub context: minijinja::Value,
}

impl View {
    pub fn new(template: &'static str, context: minijinja::Value) -> Self {
        Self { template, context }
    }

    pub fn into_response(self) -> Result<HttpResponse, AppError> {
        let html = templates::render(self.template, self.context).map_err(|e| {
            error!("render {} failed: {}", self.template, e);
            AppError::system_exception()
        })?;
        Ok(HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(html))
    }
}

pub fn redirect(location: impl AsRef<str>) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location.as_ref()))
        .finish()
}

#[derive(Serialize)]
struct ErrorPage {
    status: u16,
    reason: &'static str,
    msg: String,
}

pub fn form_error_handler(err: UrlencodedError, _req: &HttpRequest) -> actix_web::Error {
    let app_err = match err {
        UrlencodedError::ContentType => AppError::param_error("expected a form submission"),
        UrlencodedError::Parse(_) => AppError::param_error("malformed form data"),
        UrlencodedError::Overflow { .. } => AppError::param_error("form data too large"),
        other => AppError::param_error(other.to_string()),
    };
    app_err.into()
}

/// Ids that match `\d+` but overflow `i32` cannot name a row.
pub fn path_error_handler(err: PathError, req: &HttpRequest) -> actix_web::Error {
    AppError::not_found(format!("{} not found ({})", req.path(), err)).into()
}

pub async fn not_found_page(req: HttpRequest) -> HttpResponse {
    AppError::not_found(format!("{} not found", req.path())).error_response()
}

pub fn response_from_error(err: &AppError) -> HttpResponse {
    let status = err.status_code();
    let page = ErrorPage {
        status: status.as_u16(),
        reason: status.canonical_reason().unwrap_or("Error"),
        msg: err.msg(),
    };
    match templates::render("error.html", context! { error => page }) {
        Ok(html) => HttpResponse::build(status)
            .content_type("text/html; charset=utf-8")
            .body(html),
        Err(e) => {
            error!("render error page failed: {}", e);
            HttpResponse::build(status)
                .content_type("text/plain; charset=utf-8")
                .body(format!("{} {}", status.as_u16(), err.msg()))
        }
    }
}
