//! Services layer - Business logic
//!
//! Services sit between the HTTP handlers and the repositories. They
//! validate input, enforce ownership and the single-author rule, and report
//! failures through one `thiserror` enum each.

pub mod access;
pub mod article;
pub mod category;
pub mod comment;
pub mod password;
pub mod slug;
pub mod tag;
pub mod token;
pub mod user;

pub use access::{ensure_owner, NotOwner};
pub use article::{ArticleService, ArticleServiceError};
pub use category::{CategoryService, CategoryServiceError};
pub use comment::{CommentService, CommentServiceError};
pub use tag::{TagService, TagServiceError};
pub use token::{IssuedToken, TokenError, TokenService};
pub use user::{
    LoginInput, LoginOutput, RegisterInput, RegistrationStatus, UserService, UserServiceError,
};
