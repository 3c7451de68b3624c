//! Comment API endpoints
//!
//! - GET /api/v1/articles/{id}/comments - List comments of an article
//! - POST /api/v1/articles/{id}/comments - Comment on an article
//! - PUT /api/v1/comments/{id} - Edit a comment (owner only)
//! - DELETE /api/v1/comments/{id} - Delete a comment (owner only)

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::api::common::{ApiJson, ApiPath};
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::MessageResponse;
use crate::models::{Comment, CommentInput, CommentWithAuthor};

/// GET /api/v1/articles/{id}/comments
pub async fn list_comments(
    State(state): State<AppState>,
    ApiPath(article_id): ApiPath<i64>,
) -> Result<Json<Vec<CommentWithAuthor>>, ApiError> {
    Ok(Json(state.comment_service.list(article_id).await?))
}

/// POST /api/v1/articles/{id}/comments
pub async fn create_comment(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(article_id): ApiPath<i64>,
    ApiJson(body): ApiJson<CommentInput>,
) -> Result<impl IntoResponse, ApiError> {
    let comment = state
        .comment_service
        .create(user.user_id, article_id, body)
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// PUT /api/v1/comments/{id}
pub async fn update_comment(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<CommentInput>,
) -> Result<Json<Comment>, ApiError> {
    Ok(Json(
        state.comment_service.update(user.user_id, id, body).await?,
    ))
}

/// DELETE /api/v1/comments/{id}
pub async fn delete_comment(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.comment_service.delete(user.user_id, id).await?;
    Ok(Json(MessageResponse::new("Comment deleted successfully")))
}
