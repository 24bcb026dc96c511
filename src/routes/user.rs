use actix_web::{web, HttpResponse};
use minijinja::context;
use sea_orm::DatabaseConnection;
use serde::Deserialize;

use crate::error::AppError;
use crate::response::{redirect, View};
use crate::store::{self, UserFields};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/users").route(web::get().to(list_users)))
        .service(
            web::resource("/users/new")
                .route(web::get().to(show_add_user))
                .route(web::post().to(add_user)),
        )
        .service(web::resource("/users/{id:\\d+}").route(web::get().to(show_user)))
        .service(
            web::resource("/users/{id:\\d+}/edit")
                .route(web::get().to(edit_user_form))
                .route(web::post().to(edit_user)),
        )
        .service(web::resource("/users/{id:\\d+}/delete").route(web::post().to(delete_user)));
}

#[derive(Deserialize)]
struct UserForm {
    first_name: String,
    last_name: String,
    image_url: String,
}

impl From<UserForm> for UserFields {
    fn from(form: UserForm) -> Self {
        Self {
            first_name: form.first_name,
            last_name: form.last_name,
            image_url: Some(form.image_url),
        }
    }
}

async fn list_users(db: web::Data<DatabaseConnection>) -> Result<HttpResponse, AppError> {
    let users = store::list_users(db.get_ref()).await?;
    View::new("index.html", context! { users => users }).into_response()
}

async fn show_add_user() -> Result<HttpResponse, AppError> {
    View::new("add_user.html", context! {}).into_response()
}

async fn add_user(
    db: web::Data<DatabaseConnection>,
    form: web::Form<UserForm>,
) -> Result<HttpResponse, AppError> {
    store::create_user(db.get_ref(), form.into_inner().into()).await?;
    Ok(redirect("/users"))
}

async fn show_user(
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let user = store::user_or_404(db.get_ref(), *path).await?;
    let posts = store::posts_for_user(db.get_ref(), &user).await?;
    View::new("show_user.html", context! { user => user, posts => posts }).into_response()
}

async fn edit_user_form(
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let user = store::user_or_404(db.get_ref(), *path).await?;
    View::new("edit_user.html", context! { user => user }).into_response()
}

async fn edit_user(
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    form: web::Form<UserForm>,
) -> Result<HttpResponse, AppError> {
    let user = store::user_or_404(db.get_ref(), *path).await?;
    store::update_user(db.get_ref(), user, form.into_inner().into()).await?;
    Ok(redirect("/users"))
}

async fn delete_user(
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let user = store::user_or_404(db.get_ref(), *path).await?;
    store::delete_user(db.get_ref(), user).await?;
    Ok(redirect("/users"))
}
