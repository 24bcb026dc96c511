use actix_web::{web, HttpResponse};
use minijinja::context;
use sea_orm::DatabaseConnection;
use serde::Deserialize;

use crate::error::AppError;
use crate::response::{redirect, View};
use crate::store;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/tags").route(web::get().to(list_tags)))
        .service(
            web::resource("/tags/new")
                .route(web::get().to(new_tag_form))
                .route(web::post().to(new_tag)),
        )
        .service(web::resource("/tags/{id:\\d+}").route(web::get().to(show_tag)))
        .service(
            web::resource("/tags/{id:\\d+}/edit")
                .route(web::get().to(edit_tag_form))
                .route(web::post().to(edit_tag)),
        )
        .service(web::resource("/tags/{id:\\d+}/delete").route(web::post().to(delete_tag)));
}

#[derive(Deserialize)]
struct TagForm {
    name: String,
}

async fn list_tags(db: web::Data<DatabaseConnection>) -> Result<HttpResponse, AppError> {
    let tags = store::list_tags(db.get_ref()).await?;
    View::new("list_tags.html", context! { tags => tags }).into_response()
}

async fn new_tag_form() -> Result<HttpResponse, AppError> {
    View::new("new_tag.html", context! {}).into_response()
}

async fn new_tag(
    db: web::Data<DatabaseConnection>,
    form: web::Form<TagForm>,
) -> Result<HttpResponse, AppError> {
    store::create_tag(db.get_ref(), &form.name).await?;
    Ok(redirect("/tags"))
}

async fn show_tag(
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let tag = store::tag_or_404(db.get_ref(), *path).await?;
    let posts = store::posts_for_tag(db.get_ref(), &tag).await?;
    View::new("show_tag.html", context! { tag => tag, posts => posts }).into_response()
}

async fn edit_tag_form(
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let tag = store::tag_or_404(db.get_ref(), *path).await?;
    View::new("edit_tag.html", context! { tag => tag }).into_response()
}

async fn edit_tag(
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    form: web::Form<TagForm>,
) -> Result<HttpResponse, AppError> {
    let tag = store::tag_or_404(db.get_ref(), *path).await?;
    store::rename_tag(db.get_ref(), tag, &form.name).await?;
    Ok(redirect("/tags"))
}

async fn delete_tag(
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let tag = store::tag_or_404(db.get_ref(), *path).await?;
    store::delete_tag(db.get_ref(), tag).await?;
    Ok(redirect("/tags"))
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test};

    use crate::store;
    use crate::test_support::{body_string, location, memory_db, post_fields, user_fields};

    #[actix_web::test]
    async fn new_tag_then_list() {
        let db = memory_db().await;
        let app = init_test_app!(db);

        let req = test::TestRequest::get().uri("/tags/new").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);

        let req = test::TestRequest::post()
            .uri("/tags/new")
            .set_form(&[("name", "rust")])
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::FOUND);
        assert_eq!(location(&res), Some("/tags".to_string()));

        let req = test::TestRequest::get().uri("/tags").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert!(body_string(res).await.contains("rust"));
    }

    #[actix_web::test]
    async fn duplicate_tag_is_rejected() {
        let db = memory_db().await;
        store::create_tag(&db, "rust").await.unwrap();
        let app = init_test_app!(db);

        let req = test::TestRequest::post()
            .uri("/tags/new")
            .set_form(&[("name", "rust")])
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::CONFLICT);
        assert_eq!(store::list_tags(&db).await.unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn show_tag_lists_posts() {
        let db = memory_db().await;
        let user = store::create_user(&db, user_fields("Ada", "Lovelace", "")).await.unwrap();
        let tag = store::create_tag(&db, "rust").await.unwrap();
        store::create_post(&db, &user, post_fields("Borrowing", "c"), vec![tag.id], None)
            .await
            .unwrap();
        let app = init_test_app!(db);

        let req = test::TestRequest::get()
            .uri(&format!("/tags/{}", tag.id))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert!(body_string(res).await.contains("Borrowing"));

        let req = test::TestRequest::get().uri("/tags/999999").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn edit_tag_renames() {
        let db = memory_db().await;
        let tag = store::create_tag(&db, "rust").await.unwrap();
        let app = init_test_app!(db);

        let req = test::TestRequest::get()
            .uri(&format!("/tags/{}/edit", tag.id))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);

        let req = test::TestRequest::post()
            .uri(&format!("/tags/{}/edit", tag.id))
            .set_form(&[("name", "ferris")])
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::FOUND);
        assert_eq!(location(&res), Some("/tags".to_string()));
        assert_eq!(store::tag_or_404(&db, tag.id).await.unwrap().name, "ferris");
    }

    #[actix_web::test]
    async fn delete_tag_keeps_posts() {
        let db = memory_db().await;
        let user = store::create_user(&db, user_fields("Ada", "Lovelace", "")).await.unwrap();
        let tag = store::create_tag(&db, "rust").await.unwrap();
        let post = store::create_post(&db, &user, post_fields("t", "c"), vec![tag.id], None)
            .await
            .unwrap();
        let app = init_test_app!(db);

        let req = test::TestRequest::post()
            .uri(&format!("/tags/{}/delete", tag.id))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::FOUND);
        assert_eq!(location(&res), Some("/tags".to_string()));
        assert!(store::find_tag(&db, tag.id).await.unwrap().is_none());
        let post = store::post_or_404(&db, post.id).await.unwrap();
        assert!(store::tags_for_post(&db, &post).await.unwrap().is_empty());
    }
}
