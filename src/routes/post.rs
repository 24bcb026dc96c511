use actix_web::{web, HttpResponse};
use minijinja::context;
use sea_orm::DatabaseConnection;

use crate::error::AppError;
use crate::response::{redirect, View};
use crate::store::{self, PostFields};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/users/{id:\\d+}/posts/new")
            .route(web::get().to(add_post_form))
            .route(web::post().to(add_post)),
    )
    .service(web::resource("/post/{id:\\d+}").route(web::get().to(show_post)))
    .service(
        web::resource("/posts/{id:\\d+}/edit")
            .route(web::get().to(edit_post_form))
            .route(web::post().to(edit_post)),
    )
    .service(web::resource("/posts/{id:\\d+}/delete").route(web::post().to(delete_post)));
}

/// Post form body. `tags` may repeat, so this is decoded from raw pairs.
#[derive(Debug, PartialEq)]
struct PostForm {
    title: String,
    content: String,
    tags: Vec<i32>,
}

impl PostForm {
    fn parse(body: &[u8]) -> Result<Self, AppError> {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(body)
            .map_err(|_| AppError::param_error("malformed form data"))?;

        let mut title = None;
        let mut content = None;
        let mut tags = Vec::new();
        for (key, value) in pairs {
            match key.as_str() {
                "title" => title = Some(value),
                "content" => content = Some(value),
                // ids that are not numbers cannot match a tag
                "tags" => tags.extend(value.trim().parse::<i32>().ok()),
                _ => {}
            }
        }

        Ok(Self {
            title: title.ok_or_else(|| AppError::param_error("missing field `title`"))?,
            content: content.ok_or_else(|| AppError::param_error("missing field `content`"))?,
            tags,
        })
    }

    fn into_parts(self) -> (PostFields, Vec<i32>) {
        (
            PostFields {
                title: self.title,
                content: self.content,
            },
            self.tags,
        )
    }
}

async fn add_post_form(
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let user = store::user_or_404(db.get_ref(), *path).await?;
    let tags = store::list_tags(db.get_ref()).await?;
    View::new("new_post.html", context! { user => user, tags => tags }).into_response()
}

async fn add_post(
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    body: web::Bytes,
) -> Result<HttpResponse, AppError> {
    let user = store::user_or_404(db.get_ref(), *path).await?;
    let (fields, tag_ids) = PostForm::parse(&body)?.into_parts();
    store::create_post(db.get_ref(), &user, fields, tag_ids, None).await?;
    Ok(redirect(format!("/users/{}", user.id)))
}

async fn show_post(
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let post = store::post_or_404(db.get_ref(), *path).await?;
    let user = store::user_or_404(db.get_ref(), post.user_id).await?;
    let tags = store::tags_for_post(db.get_ref(), &post).await?;
    View::new(
        "show_post.html",
        context! { post => post, user => user, tags => tags },
    )
    .into_response()
}

async fn edit_post_form(
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let post = store::post_or_404(db.get_ref(), *path).await?;
    let tags = store::list_tags(db.get_ref()).await?;
    let selected: Vec<i32> = store::tags_for_post(db.get_ref(), &post)
        .await?
        .into_iter()
        .map(|t| t.id)
        .collect();
    View::new(
        "edit_post.html",
        context! { post => post, tags => tags, selected => selected },
    )
    .into_response()
}

async fn edit_post(
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    body: web::Bytes,
) -> Result<HttpResponse, AppError> {
    let post = store::post_or_404(db.get_ref(), *path).await?;
    let (fields, tag_ids) = PostForm::parse(&body)?.into_parts();
    let post = store::update_post(db.get_ref(), post, fields, tag_ids).await?;
    Ok(redirect(format!("/users/{}", post.user_id)))
}

async fn delete_post(
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let post = store::post_or_404(db.get_ref(), *path).await?;
    let user_id = post.user_id;
    store::delete_post(db.get_ref(), post).await?;
    Ok(redirect(format!("/users/{}", user_id)))
}


#[cfg(test)]
mod form_tests {
    use super::PostForm;
    use crate::error::AppError;

    #[test]
    fn parse_collects_repeated_tags() {
        let form = PostForm::parse(b"title=Hi&content=Body+text&tags=1&tags=2&tags=x&tags=99").unwrap();
        assert_eq!(
            form,
            PostForm {
                title: "Hi".to_string(),
                content: "Body text".to_string(),
                tags: vec![1, 2, 99],
            }
        );
    }

    #[test]
    fn parse_without_tags_is_empty_set() {
        let form = PostForm::parse(b"title=Hi&content=Body").unwrap();
        assert!(form.tags.is_empty());
    }

    #[test]
    fn parse_requires_title_and_content() {
        assert!(matches!(PostForm::parse(b"content=Body"), Err(AppError::Param(_))));
        assert!(matches!(PostForm::parse(b"title=Hi"), Err(AppError::Param(_))));
    }
}
