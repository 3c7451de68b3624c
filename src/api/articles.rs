//! Article API endpoints
//!
//! - GET /api/v1/articles - List articles with filters and pagination
//! - GET /api/v1/articles/{id} - Get a single article
//! - POST /api/v1/articles - Create an article
//! - PUT /api/v1/articles/{id} - Update an article (owner only)
//! - DELETE /api/v1/articles/{id} - Soft-delete an article (owner only)
//! - POST /api/v1/articles/batch-delete - Soft-delete several articles (owner only)
//! - POST /api/v1/articles/{id}/like - Increment the like counter
//! - POST /api/v1/articles/{id}/view - Increment the view counter

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

use crate::api::common::{empty_string_as_none, ApiJson, ApiPath, ApiQuery};
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::{ArticleListResponse, MessageResponse};
use crate::models::{
    ArticleDetail, ArticleFilter, BatchDeleteInput, CreateArticleInput, ListParams,
    UpdateArticleInput,
};

/// Query parameters for listing articles
#[derive(Debug, Default, Deserialize)]
pub struct ListArticlesQuery {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub page: Option<u32>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub page_size: Option<u32>,
    /// Matched against title and content
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub category_id: Option<i64>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub tag_id: Option<i64>,
}

impl ListArticlesQuery {
    fn into_parts(self) -> (ArticleFilter, ListParams) {
        let defaults = ListParams::default();
        let params = ListParams::new(
            self.page.unwrap_or(defaults.page),
            self.page_size.unwrap_or(defaults.page_size),
        );
        let filter = ArticleFilter {
            search: self.search.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
            category_id: self.category_id,
            tag_id: self.tag_id,
        };
        (filter, params)
    }
}

#[derive(Debug, Serialize)]
pub struct BatchDeleteResponse {
    pub message: String,
    pub deleted: u64,
}

#[derive(Debug, Serialize)]
pub struct LikesResponse {
    pub likes: i64,
}

#[derive(Debug, Serialize)]
pub struct ViewsResponse {
    pub views: i64,
}

/// GET /api/v1/articles
pub async fn list_articles(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListArticlesQuery>,
) -> Result<Json<ArticleListResponse>, ApiError> {
    let (filter, params) = query.into_parts();
    let result = state.article_service.list(&filter, &params).await?;
    Ok(Json(result.into()))
}

/// GET /api/v1/articles/{id}
pub async fn get_article(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<ArticleDetail>, ApiError> {
    Ok(Json(state.article_service.get(id).await?))
}

/// POST /api/v1/articles
pub async fn create_article(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiJson(body): ApiJson<CreateArticleInput>,
) -> Result<impl IntoResponse, ApiError> {
    let article = state.article_service.create(user.user_id, body).await?;
    Ok((StatusCode::CREATED, Json(article)))
}

/// PUT /api/v1/articles/{id}
pub async fn update_article(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<UpdateArticleInput>,
) -> Result<Json<ArticleDetail>, ApiError> {
    Ok(Json(
        state.article_service.update(user.user_id, id, body).await?,
    ))
}

/// DELETE /api/v1/articles/{id}
pub async fn delete_article(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.article_service.delete(user.user_id, id).await?;
    Ok(Json(MessageResponse::new("Article deleted successfully")))
}

/// POST /api/v1/articles/batch-delete
pub async fn batch_delete_articles(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiJson(body): ApiJson<BatchDeleteInput>,
) -> Result<Json<BatchDeleteResponse>, ApiError> {
    let deleted = state
        .article_service
        .batch_delete(user.user_id, &body.ids)
        .await?;

    Ok(Json(BatchDeleteResponse {
        message: format!("{} article(s) deleted", deleted),
        deleted,
    }))
}

/// POST /api/v1/articles/{id}/like
pub async fn like_article(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<LikesResponse>, ApiError> {
    let likes = state.article_service.like(id).await?;
    Ok(Json(LikesResponse { likes }))
}

/// POST /api/v1/articles/{id}/view
pub async fn view_article(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<ViewsResponse>, ApiError> {
    let views = state.article_service.view(id).await?;
    Ok(Json(ViewsResponse { views }))
}
