use actix_web::{web, HttpResponse};

use crate::response::{not_found_page, redirect};

pub mod post;
pub mod tag;
pub mod user;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(home)))
        .configure(user::config)
        .configure(post::config)
        .configure(tag::config)
        .default_service(web::to(not_found_page));
}

async fn home() -> HttpResponse {
    redirect("/users")
}
