//! Shared API response types

use serde::Serialize;

use crate::db::CascadeReport;
use crate::models::{ArticleDetail, PagedResult};

/// Plain acknowledgement
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Paginated article list
#[derive(Debug, Serialize)]
pub struct ArticleListResponse {
    pub articles: Vec<ArticleDetail>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
}

impl From<PagedResult<ArticleDetail>> for ArticleListResponse {
    fn from(result: PagedResult<ArticleDetail>) -> Self {
        let total_pages = result.total_pages();
        Self {
            articles: result.items,
            total: result.total,
            page: result.page,
            page_size: result.page_size,
            total_pages,
        }
    }
}

/// Result of deleting a category or tag
#[derive(Debug, Serialize)]
pub struct CascadeDeleteResponse {
    pub message: String,
    pub removed: CascadeReport,
}
