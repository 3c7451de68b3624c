//! Category API endpoints
//!
//! - GET /api/v1/categories - List categories with article counts
//! - POST /api/v1/categories - Create a category
//! - PUT /api/v1/categories/{id} - Rename a category
//! - DELETE /api/v1/categories/{id} - Delete a category and its articles

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::api::common::{ApiJson, ApiPath};
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::CascadeDeleteResponse;
use crate::models::{Category, CategoryInput, CategoryWithCount};

/// GET /api/v1/categories
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryWithCount>>, ApiError> {
    Ok(Json(state.category_service.list().await?))
}

/// POST /api/v1/categories
pub async fn create_category(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    ApiJson(body): ApiJson<CategoryInput>,
) -> Result<impl IntoResponse, ApiError> {
    let category = state.category_service.create(body).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// PUT /api/v1/categories/{id}
pub async fn update_category(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<CategoryInput>,
) -> Result<Json<Category>, ApiError> {
    Ok(Json(state.category_service.update(id, body).await?))
}

/// DELETE /api/v1/categories/{id}
///
/// Removes every article filed under the category, with their comments and
/// tag links.
pub async fn delete_category(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<CascadeDeleteResponse>, ApiError> {
    let removed = state.category_service.delete(id).await?;
    Ok(Json(CascadeDeleteResponse {
        message: "Category and associated articles deleted successfully".to_string(),
        removed,
    }))
}
