//! Data models
//!
//! Database entities (User, Article, Comment, Category, Tag) and
//! the request/response types built around them.

mod article;
mod category;
mod comment;
mod tag;
mod user;

pub use article::{
    Article, ArticleDetail, ArticleFilter, BatchDeleteInput, CreateArticleInput, ListParams,
    PagedResult, UpdateArticleInput,
};
pub use category::{Category, CategoryInput, CategoryWithCount};
pub use comment::{Comment, CommentInput, CommentWithAuthor};
pub use tag::{Tag, TagInput, TagWithCount};
pub use user::{UpdateProfileInput, User, UserSummary};
