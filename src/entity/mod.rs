pub mod post;
pub mod posts_tag;
pub mod tag;
pub mod user;
