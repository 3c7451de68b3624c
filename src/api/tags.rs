//! Tag API endpoints
//!
//! - GET /api/v1/tags - List tags with article counts
//! - POST /api/v1/tags - Create a tag
//! - PUT /api/v1/tags/{id} - Rename a tag
//! - DELETE /api/v1/tags/{id} - Delete a tag and every article carrying it

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::api::common::{ApiJson, ApiPath};
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::CascadeDeleteResponse;
use crate::models::{Tag, TagInput, TagWithCount};

/// GET /api/v1/tags
pub async fn list_tags(State(state): State<AppState>) -> Result<Json<Vec<TagWithCount>>, ApiError> {
    Ok(Json(state.tag_service.list().await?))
}

/// POST /api/v1/tags
pub async fn create_tag(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    ApiJson(body): ApiJson<TagInput>,
) -> Result<impl IntoResponse, ApiError> {
    let tag = state.tag_service.create(body).await?;
    Ok((StatusCode::CREATED, Json(tag)))
}

/// PUT /api/v1/tags/{id}
pub async fn update_tag(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<TagInput>,
) -> Result<Json<Tag>, ApiError> {
    Ok(Json(state.tag_service.update(id, body).await?))
}

/// DELETE /api/v1/tags/{id}
pub async fn delete_tag(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<CascadeDeleteResponse>, ApiError> {
    let removed = state.tag_service.delete(id).await?;
    Ok(Json(CascadeDeleteResponse {
        message: "Tag and associated articles deleted successfully".to_string(),
        removed,
    }))
}
