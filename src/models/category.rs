//! Category model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Category an article may be filed under
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
    /// URL-friendly slug derived from the name
    pub slug: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    /// Build a category that has not been stored yet. The id is assigned on insert.
    pub fn new(name: String, slug: String) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            name,
            slug,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Category with the number of live articles filed under it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryWithCount {
    #[serde(flatten)]
    pub category: Category,
    pub article_count: i64,
}

/// Body of `POST /categories` and `PUT /categories/{id}`
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryInput {
    pub name: String,
}
