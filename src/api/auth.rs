//! Authentication and profile endpoints
//!
//! - POST /api/v1/auth/register - Register the blog's author (only while no user exists)
//! - POST /api/v1/auth/login - Exchange credentials for a bearer token
//! - GET/PUT /api/v1/user/profile - The caller's own profile
//! - GET /api/v1/author-profile - Public profile of the author
//! - GET /api/v1/registration-status - Whether registration is still open

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use crate::api::common::ApiJson;
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::{UpdateProfileInput, User};
use crate::services::{LoginInput, LoginOutput, RegisterInput, RegistrationStatus};

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user: User,
}

/// POST /api/v1/auth/register
pub async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RegisterInput>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.user_service.register(body).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "Registration successful".to_string(),
            user,
        }),
    ))
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginInput>,
) -> Result<Json<LoginOutput>, ApiError> {
    Ok(Json(state.user_service.login(body).await?))
}

/// GET /api/v1/user/profile
pub async fn get_profile(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<User>, ApiError> {
    Ok(Json(state.user_service.get_profile(user.user_id).await?))
}

/// PUT /api/v1/user/profile
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiJson(body): ApiJson<UpdateProfileInput>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(
        state.user_service.update_profile(user.user_id, body).await?,
    ))
}

/// GET /api/v1/author-profile
pub async fn author_profile(State(state): State<AppState>) -> Result<Json<User>, ApiError> {
    state
        .user_service
        .author_profile()
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("No author registered yet"))
}

/// GET /api/v1/registration-status
pub async fn registration_status(
    State(state): State<AppState>,
) -> Result<Json<RegistrationStatus>, ApiError> {
    Ok(Json(state.user_service.registration_status().await?))
}
