//! API layer - HTTP handlers and routing
//!
//! Every endpoint lives under `/api/v1`. Public routes and routes behind
//! [`middleware::require_auth`] are built separately and merged.

pub mod articles;
pub mod auth;
pub mod categories;
pub mod comments;
pub mod common;
pub mod middleware;
pub mod responses;
pub mod tags;
pub mod upload;

#[cfg(test)]
mod tests;

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{get, post, put},
    Json, Router,
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

pub use middleware::{ApiError, AppState, AuthenticatedUser};

use responses::MessageResponse;

/// Multipart framing allowance on top of the configured file size
const MULTIPART_OVERHEAD: u64 = 64 * 1024;

/// Build the `/api/v1` router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    let upload_limit = state
        .upload_config
        .max_file_size
        .saturating_add(MULTIPART_OVERHEAD);
    let upload_limit = usize::try_from(upload_limit).unwrap_or(usize::MAX);

    let protected_routes = Router::new()
        .route("/user/profile", get(auth::get_profile).put(auth::update_profile))
        .route("/articles", post(articles::create_article))
        .route("/articles/batch-delete", post(articles::batch_delete_articles))
        .route(
            "/articles/{id}",
            put(articles::update_article).delete(articles::delete_article),
        )
        .route("/articles/{id}/comments", post(comments::create_comment))
        .route("/articles/{id}/like", post(articles::like_article))
        .route(
            "/comments/{id}",
            put(comments::update_comment).delete(comments::delete_comment),
        )
        .route("/categories", post(categories::create_category))
        .route(
            "/categories/{id}",
            put(categories::update_category).delete(categories::delete_category),
        )
        .route("/tags", post(tags::create_tag))
        .route("/tags/{id}", put(tags::update_tag).delete(tags::delete_tag))
        .route(
            "/upload",
            post(upload::upload_file).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            middleware::require_auth,
        ));

    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/author-profile", get(auth::author_profile))
        .route("/registration-status", get(auth::registration_status))
        .route("/articles", get(articles::list_articles))
        .route("/articles/{id}", get(articles::get_article))
        .route("/articles/{id}/comments", get(comments::list_comments))
        .route("/articles/{id}/view", post(articles::view_article))
        .route("/categories", get(categories::list_categories))
        .route("/tags", get(tags::list_tags))
        .merge(protected_routes)
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> anyhow::Result<Router> {
    let origin = cors_origin
        .parse::<HeaderValue>()
        .with_context(|| format!("Invalid CORS origin: {}", cors_origin))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true);

    let uploads = ServeDir::new(&state.upload_config.path);

    Ok(Router::new()
        .nest("/api/v1", build_api_router(state.clone()))
        .route("/ping", get(ping))
        .nest_service("/uploads", uploads)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

async fn ping() -> Json<MessageResponse> {
    Json(MessageResponse::new("pong"))
}
