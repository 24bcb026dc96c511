#[cfg(test)]
#[macro_use]
mod test_support;

mod config;
mod db;
mod entity;
mod error;
mod response;
mod routes;
mod store;
mod templates;

use actix_web::{middleware, web, App, HttpServer};
use config::AppConfig;
use db::{close_db, connect_db};
use log::{error, info};
use response::{form_error_handler, path_error_handler};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();
    let config = AppConfig::from_env();
    let db = connect_db(&config).await.map_err(|e| {
        error!("db connect failed: {}", e);
        std::io::Error::other(e.to_string())
    })?;
    let bind = (config.server_host.clone(), config.server_port);

    let app_db = db.clone();
    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_db.clone()))
            .app_data(web::FormConfig::default().error_handler(form_error_handler))
            .app_data(web::PathConfig::default().error_handler(path_error_handler))
            .wrap(middleware::Logger::default())
            .configure(routes::config)
    })
    .bind(bind.clone())?;
    info!("server started at http://{}:{}", bind.0, bind.1);
    let result = server.run().await;

    close_db(db).await;
    info!("server stopped");
    result
}
