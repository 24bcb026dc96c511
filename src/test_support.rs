use actix_web::{body::MessageBody, dev::ServiceResponse, http::header, test};
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::db::connect_db;
use crate::store::{PostFields, UserFields};

/// Builds the full application around `$db` the same way `main` does.
macro_rules! init_test_app {
    ($db:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($db.clone()))
                .app_data(
                    actix_web::web::FormConfig::default()
                        .error_handler(crate::response::form_error_handler),
                )
                .app_data(
                    actix_web::web::PathConfig::default()
                        .error_handler(crate::response::path_error_handler),
                )
                .configure(crate::routes::config),
        )
        .await
    };
}

pub fn memory_config() -> AppConfig {
    AppConfig {
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        sqlite_path: String::new(),
        database_url: Some("sqlite::memory:".to_string()),
        max_connections: 1,
        sql_echo: false,
    }
}

pub async fn memory_db() -> DatabaseConnection {
    connect_db(&memory_config()).await.unwrap()
}

pub fn user_fields(first_name: &str, last_name: &str, image_url: &str) -> UserFields {
    UserFields {
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        image_url: Some(image_url.to_string()),
    }
}

pub fn post_fields(title: &str, content: &str) -> PostFields {
    PostFields {
        title: title.to_string(),
        content: content.to_string(),
    }
}

pub fn location<B>(res: &ServiceResponse<B>) -> Option<String> {
    res.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

pub async fn body_string<B: MessageBody>(res: ServiceResponse<B>) -> String {
    let bytes = test::read_body(res).await;
    String::from_utf8(bytes.to_vec()).unwrap()
}
