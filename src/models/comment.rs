//! Comment model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UserSummary;

/// Comment entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    pub content: String,
    pub article_id: i64,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Comment {
    pub fn new(content: String, article_id: i64, user_id: i64) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            content,
            article_id,
            user_id,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

/// Comment with its author resolved, as listed under an article
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentWithAuthor {
    #[serde(flatten)]
    pub comment: Comment,
    pub user: Option<UserSummary>,
}

/// Body of `POST /articles/{id}/comments` and `PUT /comments/{id}`
#[derive(Debug, Clone, Deserialize)]
pub struct CommentInput {
    pub content: String,
}
