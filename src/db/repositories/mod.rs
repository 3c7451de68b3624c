//! Database repositories
//!
//! One repository per entity, each a trait with an SQLx implementation that
//! serves both SQLite and MySQL.

pub mod article;
pub mod category;
pub mod comment;
pub mod tag;
pub mod user;

pub use article::{ArticleRepository, Counter, SqlxArticleRepository};
pub use category::{CategoryRepository, SqlxCategoryRepository};
pub use comment::{CommentRepository, SqlxCommentRepository};
pub use tag::{SqlxTagRepository, TagRepository};
pub use user::{SqlxUserRepository, UserRepository};
