//! Article model
//!
//! Articles are soft-deleted: `deleted_at` is set instead of removing the
//! row, and soft-deleted articles are hidden from every normal read. Only the
//! category/tag cascade removes article rows for good.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Category, Tag, UserSummary};

/// Article entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub author_id: i64,
    pub category_id: Option<i64>,
    pub likes: i64,
    pub views: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Article {
    /// Build an article that has not been stored yet. The id is assigned on insert.
    pub fn new(title: String, content: String, author_id: i64, category_id: Option<i64>) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            title,
            content,
            author_id,
            category_id,
            likes: 0,
            views: 0,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

/// Article with its author, category and tags resolved
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleDetail {
    #[serde(flatten)]
    pub article: Article,
    pub author: Option<UserSummary>,
    pub category: Option<Category>,
    pub tags: Vec<Tag>,
}

/// Body of `POST /articles`
#[derive(Debug, Clone, Deserialize)]
pub struct CreateArticleInput {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub category_id: Option<i64>,
    /// Tag names, created on first use
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Body of `PUT /articles/{id}`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateArticleInput {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub category_id: Option<i64>,
    /// Replaces every tag link when present; an empty list clears them
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

/// Body of `POST /articles/batch-delete`
#[derive(Debug, Clone, Deserialize)]
pub struct BatchDeleteInput {
    pub ids: Vec<i64>,
}

/// Filters for listing articles
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArticleFilter {
    /// Substring matched against title or content
    pub search: Option<String>,
    pub category_id: Option<i64>,
    pub tag_id: Option<i64>,
}

/// Pagination parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ListParams {
    /// Page number (1-indexed)
    pub page: u32,
    pub page_size: u32,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 10,
        }
    }
}

impl ListParams {
    /// Clamp to page >= 1 and 1 <= page_size <= 100
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.clamp(1, 100),
        }
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.page_size)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }
}

/// One page of results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    /// Total number of items across all pages
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
}

impl<T> PagedResult<T> {
    pub fn new(items: Vec<T>, total: i64, params: &ListParams) -> Self {
        Self {
            items,
            total,
            page: params.page,
            page_size: params.page_size,
        }
    }

    pub fn total_pages(&self) -> u32 {
        if self.page_size == 0 || self.total <= 0 {
            return 0;
        }
        let pages = (self.total + i64::from(self.page_size) - 1) / i64::from(self.page_size);
        u32::try_from(pages).unwrap_or(u32::MAX)
    }
}
