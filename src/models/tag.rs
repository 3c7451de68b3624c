//! Tag model
//!
//! Tags are attached to articles through the `article_tags` association.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tag entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    /// URL-friendly slug derived from the name
    pub slug: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tag {
    /// Build a tag that has not been stored yet. The id is assigned on insert.
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

/// Tag with the number of live articles carrying it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagWithCount {
    #[serde(flatten)]
    pub tag: Tag,
    pub article_count: i64,
}

/// Body of `POST /tags` and `PUT /tags/{id}`
#[derive(Debug, Clone, Deserialize)]
pub struct TagInput {
    pub name: String,
}
