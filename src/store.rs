use chrono::{DateTime, Utc};
use log::debug;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder, Set, TransactionError, TransactionTrait,
};

use crate::entity::{post, posts_tag, tag, user};
use crate::error::AppError;

#[derive(Clone, Debug)]
pub struct UserFields {
    pub first_name: String,
    pub last_name: String,
    pub image_url: Option<String>,
}

#[derive(Clone, Debug)]
pub struct PostFields {
    pub title: String,
    pub content: String,
}

// ---- users ----

pub async fn list_users<C: ConnectionTrait>(db: &C) -> Result<Vec<user::Model>, AppError> {
    user::Entity::find()
        .order_by_asc(user::Column::Id)
        .all(db)
        .await
        .map_err(|e| AppError::from_db("list users", e))
}

pub async fn find_user<C: ConnectionTrait>(db: &C, id: i32) -> Result<Option<user::Model>, AppError> {
    user::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(|e| AppError::from_db("find user", e))
}

pub async fn user_or_404<C: ConnectionTrait>(db: &C, id: i32) -> Result<user::Model, AppError> {
    find_user(db, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("user {} not found", id)))
}

pub async fn create_user<C: ConnectionTrait>(db: &C, fields: UserFields) -> Result<user::Model, AppError> {
    let fields = fields.validated()?;
    let inserted = user::ActiveModel {
        first_name: Set(fields.first_name),
        last_name: Set(fields.last_name),
        image_url: Set(fields.image_url),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(|e| AppError::from_db("create user", e))?;
    debug!("user created id={} name={}", inserted.id, inserted.full_name());
    Ok(inserted)
}

pub async fn update_user<C: ConnectionTrait>(
    db: &C,
    existing: user::Model,
    fields: UserFields,
) -> Result<user::Model, AppError> {
    let fields = fields.validated()?;
    let mut active: user::ActiveModel = existing.into();
    active.first_name = Set(fields.first_name);
    active.last_name = Set(fields.last_name);
    active.image_url = Set(fields.image_url);
    let updated = active
        .update(db)
        .await
        .map_err(|e| AppError::from_db("update user", e))?;
    debug!("user updated id={}", updated.id);
    Ok(updated)
}

/// Removes the user together with every post it owns and their tag links.
pub async fn delete_user(db: &DatabaseConnection, existing: user::Model) -> Result<(), AppError> {
    let user_id = existing.id;
    db.transaction::<_, (), AppError>(|txn| {
        Box::pin(async move {
            let post_ids: Vec<i32> = existing
                .find_related(post::Entity)
                .all(txn)
                .await
                .map_err(|e| AppError::from_db("delete user", e))?
                .into_iter()
                .map(|p| p.id)
                .collect();
            if !post_ids.is_empty() {
                posts_tag::Entity::delete_many()
                    .filter(posts_tag::Column::PostId.is_in(post_ids.clone()))
                    .exec(txn)
                    .await
                    .map_err(|e| AppError::from_db("delete user", e))?;
                post::Entity::delete_many()
                    .filter(post::Column::Id.is_in(post_ids))
                    .exec(txn)
                    .await
                    .map_err(|e| AppError::from_db("delete user", e))?;
            }
            existing
                .delete(txn)
                .await
                .map_err(|e| AppError::from_db("delete user", e))?;
            Ok(())
        })
    })
    .await
    .map_err(map_tx_error)?;
    debug!("user deleted id={}", user_id);
    Ok(())
}

pub async fn posts_for_user<C: ConnectionTrait>(
    db: &C,
    owner: &user::Model,
) -> Result<Vec<post::Model>, AppError> {
    owner
        .find_related(post::Entity)
        .order_by_desc(post::Column::CreatedAt)
        .order_by_desc(post::Column::Id)
        .all(db)
        .await
        .map_err(|e| AppError::from_db("list posts of user", e))
}

// ---- posts ----

pub async fn find_post<C: ConnectionTrait>(db: &C, id: i32) -> Result<Option<post::Model>, AppError> {
    post::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(|e| AppError::from_db("find post", e))
}

pub async fn post_or_404<C: ConnectionTrait>(db: &C, id: i32) -> Result<post::Model, AppError> {
    find_post(db, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("post {} not found", id)))
}

/// Creates a post owned by `owner`, tagged with whichever of `tag_ids` exist.
pub async fn create_post(
    db: &DatabaseConnection,
    owner: &user::Model,
    fields: PostFields,
    tag_ids: Vec<i32>,
    created_at: Option<DateTime<Utc>>,
) -> Result<post::Model, AppError> {
    let fields = fields.validated()?;
    let user_id = owner.id;
    let inserted = db
        .transaction::<_, post::Model, AppError>(|txn| {
            Box::pin(async move {
                let inserted = post::ActiveModel {
                    title: Set(fields.title),
                    content: Set(fields.content),
                    created_at: Set(created_at.unwrap_or_else(Utc::now)),
                    user_id: Set(user_id),
                    ..Default::default()
                }
                .insert(txn)
                .await
                .map_err(|e| AppError::from_db("create post", e))?;
                let tags = resolve_tags(txn, &tag_ids).await?;
                link_tags(txn, inserted.id, &tags).await?;
                Ok(inserted)
            })
        })
        .await
        .map_err(map_tx_error)?;
    debug!("post created id={} user_id={}", inserted.id, inserted.user_id);
    Ok(inserted)
}

/// Overwrites title and content and replaces the whole tag set.
pub async fn update_post(
    db: &DatabaseConnection,
    existing: post::Model,
    fields: PostFields,
    tag_ids: Vec<i32>,
) -> Result<post::Model, AppError> {
    let fields = fields.validated()?;
    let updated = db
        .transaction::<_, post::Model, AppError>(|txn| {
            Box::pin(async move {
                let mut active: post::ActiveModel = existing.into();
                active.title = Set(fields.title);
                active.content = Set(fields.content);
                let updated = active
                    .update(txn)
                    .await
                    .map_err(|e| AppError::from_db("update post", e))?;
                unlink_post(txn, updated.id).await?;
                let tags = resolve_tags(txn, &tag_ids).await?;
                link_tags(txn, updated.id, &tags).await?;
                Ok(updated)
            })
        })
        .await
        .map_err(map_tx_error)?;
    debug!("post updated id={}", updated.id);
    Ok(updated)
}

pub async fn delete_post(db: &DatabaseConnection, existing: post::Model) -> Result<(), AppError> {
    let post_id = existing.id;
    db.transaction::<_, (), AppError>(|txn| {
        Box::pin(async move {
            unlink_post(txn, existing.id).await?;
            existing
                .delete(txn)
                .await
                .map_err(|e| AppError::from_db("delete post", e))?;
            Ok(())
        })
    })
    .await
    .map_err(map_tx_error)?;
    debug!("post deleted id={}", post_id);
    Ok(())
}

pub async fn tags_for_post<C: ConnectionTrait>(
    db: &C,
    target: &post::Model,
) -> Result<Vec<tag::Model>, AppError> {
    target
        .find_related(tag::Entity)
        .order_by_asc(tag::Column::Name)
        .all(db)
        .await
        .map_err(|e| AppError::from_db("list tags of post", e))
}

// ---- tags ----

pub async fn list_tags<C: ConnectionTrait>(db: &C) -> Result<Vec<tag::Model>, AppError> {
    tag::Entity::find()
        .order_by_asc(tag::Column::Name)
        .all(db)
        .await
        .map_err(|e| AppError::from_db("list tags", e))
}

pub async fn find_tag<C: ConnectionTrait>(db: &C, id: i32) -> Result<Option<tag::Model>, AppError> {
    tag::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(|e| AppError::from_db("find tag", e))
}

pub async fn tag_or_404<C: ConnectionTrait>(db: &C, id: i32) -> Result<tag::Model, AppError> {
    find_tag(db, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("tag {} not found", id)))
}

pub async fn create_tag<C: ConnectionTrait>(db: &C, name: &str) -> Result<tag::Model, AppError> {
    let name = required("name", name)?;
    let inserted = tag::ActiveModel {
        name: Set(name),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(|e| AppError::from_db("create tag", e))?;
    debug!("tag created id={} name={}", inserted.id, inserted.name);
    Ok(inserted)
}

pub async fn rename_tag<C: ConnectionTrait>(
    db: &C,
    existing: tag::Model,
    name: &str,
) -> Result<tag::Model, AppError> {
    let name = required("name", name)?;
    let mut active: tag::ActiveModel = existing.into();
    active.name = Set(name);
    let updated = active
        .update(db)
        .await
        .map_err(|e| AppError::from_db("rename tag", e))?;
    debug!("tag renamed id={} name={}", updated.id, updated.name);
    Ok(updated)
}

pub async fn delete_tag(db: &DatabaseConnection, existing: tag::Model) -> Result<(), AppError> {
    let tag_id = existing.id;
    db.transaction::<_, (), AppError>(|txn| {
        Box::pin(async move {
            posts_tag::Entity::delete_many()
                .filter(posts_tag::Column::TagId.eq(existing.id))
                .exec(txn)
                .await
                .map_err(|e| AppError::from_db("delete tag", e))?;
            existing
                .delete(txn)
                .await
                .map_err(|e| AppError::from_db("delete tag", e))?;
            Ok(())
        })
    })
    .await
    .map_err(map_tx_error)?;
    debug!("tag deleted id={}", tag_id);
    Ok(())
}

pub async fn posts_for_tag<C: ConnectionTrait>(
    db: &C,
    target: &tag::Model,
) -> Result<Vec<post::Model>, AppError> {
    target
        .find_related(post::Entity)
        .order_by_desc(post::Column::CreatedAt)
        .order_by_desc(post::Column::Id)
        .all(db)
        .await
        .map_err(|e| AppError::from_db("list posts of tag", e))
}

/// Looks up tags by id. Unknown ids are dropped; an empty list resolves to nothing.
pub async fn resolve_tags<C: ConnectionTrait>(db: &C, ids: &[i32]) -> Result<Vec<tag::Model>, AppError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    tag::Entity::find()
        .filter(tag::Column::Id.is_in(ids.iter().copied()))
        .order_by_asc(tag::Column::Id)
        .all(db)
        .await
        .map_err(|e| AppError::from_db("resolve tags", e))
}

async fn link_tags<C: ConnectionTrait>(db: &C, post_id: i32, tags: &[tag::Model]) -> Result<(), AppError> {
    if tags.is_empty() {
        return Ok(());
    }
    let rows = tags.iter().map(|t| posts_tag::ActiveModel {
        post_id: Set(post_id),
        tag_id: Set(t.id),
    });
    posts_tag::Entity::insert_many(rows)
        .exec_without_returning(db)
        .await
        .map_err(|e| AppError::from_db("link tags", e))?;
    Ok(())
}

async fn unlink_post<C: ConnectionTrait>(db: &C, post_id: i32) -> Result<(), AppError> {
    posts_tag::Entity::delete_many()
        .filter(posts_tag::Column::PostId.eq(post_id))
        .exec(db)
        .await
        .map_err(|e| AppError::from_db("unlink post tags", e))?;
    Ok(())
}

// ---- validation ----

fn required(field: &str, value: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::param_error(format!("{} cannot be empty", field)));
    }
    Ok(trimmed.to_string())
}

impl UserFields {
    fn validated(self) -> Result<Self, AppError> {
        Ok(Self {
            first_name: required("first_name", &self.first_name)?,
            last_name: required("last_name", &self.last_name)?,
            image_url: self
                .image_url
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
        })
    }
}

impl PostFields {
    fn validated(self) -> Result<Self, AppError> {
        Ok(Self {
            title: required("title", &self.title)?,
            content: required("content", &self.content)?,
        })
    }
}

fn map_tx_error(err: TransactionError<AppError>) -> AppError {
    match err {
        TransactionError::Connection(e) => AppError::from_db("transaction", e),
        TransactionError::Transaction(app) => app,
    }
}
