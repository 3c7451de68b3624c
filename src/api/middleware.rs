//! API middleware
//!
//! Contains:
//! - Shared application state
//! - The JSON error type every handler returns
//! - Bearer token authentication

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::{Config, UploadConfig};
use crate::db::repositories::{
    SqlxArticleRepository, SqlxCategoryRepository, SqlxCommentRepository, SqlxTagRepository,
    SqlxUserRepository,
};
use crate::services::{
    ArticleService, ArticleServiceError, CategoryService, CategoryServiceError, CommentService,
    CommentServiceError, TagService, TagServiceError, TokenError, TokenService, UserService,
    UserServiceError,
};

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub tokens: Arc<TokenService>,
    pub user_service: Arc<UserService>,
    pub article_service: Arc<ArticleService>,
    pub comment_service: Arc<CommentService>,
    pub category_service: Arc<CategoryService>,
    pub tag_service: Arc<TagService>,
    pub upload_config: Arc<UploadConfig>,
}

impl AppState {
    /// Wire repositories and services over a migrated pool
    pub fn new(pool: crate::db::DynDatabasePool, config: &Config) -> Self {
        let user_repo = SqlxUserRepository::boxed(pool.clone());
        let article_repo = SqlxArticleRepository::boxed(pool.clone());
        let category_repo = SqlxCategoryRepository::boxed(pool.clone());

        let tokens = Arc::new(TokenService::from_config(&config.auth));
        let tag_service = Arc::new(TagService::new(
            SqlxTagRepository::boxed(pool.clone()),
            pool.clone(),
        ));

        Self {
            user_service: Arc::new(UserService::new(user_repo.clone(), tokens.clone())),
            article_service: Arc::new(ArticleService::new(
                article_repo.clone(),
                category_repo.clone(),
                user_repo,
                tag_service.clone(),
            )),
            comment_service: Arc::new(CommentService::new(
                SqlxCommentRepository::boxed(pool.clone()),
                article_repo,
            )),
            category_service: Arc::new(CategoryService::new(category_repo, pool)),
            tag_service,
            tokens,
            upload_config: Arc::new(config.upload.clone()),
        }
    }
}

/// Subject of a verified bearer token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: i64,
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .copied()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("FORBIDDEN", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    /// Log the cause and hide it from the client
    pub fn internal(err: impl std::fmt::Display) -> Self {
        tracing::error!(error = %err, "Internal error");
        Self::new("INTERNAL_ERROR", "Internal server error")
    }

    pub fn status(&self) -> StatusCode {
        match self.error.code.as_str() {
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "FORBIDDEN" => StatusCode::FORBIDDEN,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        let message = match err {
            TokenError::Expired => "Token expired",
            TokenError::Malformed => "Malformed token",
            TokenError::Invalid => "Invalid token",
        };
        Self::unauthorized(message)
    }
}

impl From<UserServiceError> for ApiError {
    fn from(err: UserServiceError) -> Self {
        match err {
            UserServiceError::AuthenticationError(msg) => Self::unauthorized(msg),
            UserServiceError::ValidationError(msg) => Self::validation_error(msg),
            UserServiceError::RegistrationClosed => Self::forbidden("Registration is closed"),
            UserServiceError::NotFound(_) => Self::not_found("User not found"),
            UserServiceError::InternalError(e) => Self::internal(format!("{:#}", e)),
        }
    }
}

impl From<ArticleServiceError> for ApiError {
    fn from(err: ArticleServiceError) -> Self {
        match err {
            ArticleServiceError::NotFound(id) => Self::not_found(format!("Article not found: {}", id)),
            ArticleServiceError::ValidationError(msg) => Self::validation_error(msg),
            ArticleServiceError::Forbidden(_) => {
                Self::forbidden("You can only modify your own articles")
            }
            ArticleServiceError::InternalError(e) => Self::internal(format!("{:#}", e)),
        }
    }
}

impl From<CommentServiceError> for ApiError {
    fn from(err: CommentServiceError) -> Self {
        match err {
            CommentServiceError::NotFound(id) => Self::not_found(format!("Comment not found: {}", id)),
            CommentServiceError::ArticleNotFound(id) => {
                Self::not_found(format!("Article not found: {}", id))
            }
            CommentServiceError::ValidationError(msg) => Self::validation_error(msg),
            CommentServiceError::Forbidden(_) => {
                Self::forbidden("You can only modify your own comments")
            }
            CommentServiceError::InternalError(e) => Self::internal(format!("{:#}", e)),
        }
    }
}

impl From<CategoryServiceError> for ApiError {
    fn from(err: CategoryServiceError) -> Self {
        match err {
            CategoryServiceError::DuplicateName(name) => {
                Self::validation_error(format!("Category already exists: {}", name))
            }
            CategoryServiceError::NotFound(id) => Self::not_found(format!("Category not found: {}", id)),
            CategoryServiceError::ValidationError(msg) => Self::validation_error(msg),
            CategoryServiceError::InternalError(e) => Self::internal(format!("{:#}", e)),
        }
    }
}

impl From<TagServiceError> for ApiError {
    fn from(err: TagServiceError) -> Self {
        match err {
            TagServiceError::DuplicateName(name) => {
                Self::validation_error(format!("Tag already exists: {}", name))
            }
            TagServiceError::NotFound(id) => Self::not_found(format!("Tag not found: {}", id)),
            TagServiceError::ValidationError(msg) => Self::validation_error(msg),
            TagServiceError::InternalError(e) => Self::internal(format!("{:#}", e)),
        }
    }
}

/// Token from an `Authorization: Bearer <token>` header
fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Authentication middleware
///
/// Verifies the bearer token and makes its subject available to handlers as
/// [`AuthenticatedUser`].
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(request.headers())
        .ok_or_else(|| ApiError::unauthorized("Missing authentication token"))?;

    let user_id = state.tokens.verify(token).map_err(|e| {
        tracing::debug!(error = %e, "Rejected bearer token");
        ApiError::from(e)
    })?;

    request.extensions_mut().insert(AuthenticatedUser { user_id });
    Ok(next.run(request).await)
}
