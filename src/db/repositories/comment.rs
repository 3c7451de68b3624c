//! Comment repository
//!
//! Comments are soft-deleted; listings skip them.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::db::{DynDatabasePool, InsertedId};
use crate::models::{Comment, CommentWithAuthor, UserSummary};

#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn create(&self, comment: &Comment) -> Result<Comment>;

    /// Live comment by id
    async fn get_by_id(&self, id: i64) -> Result<Option<Comment>>;

    /// Live comments of an article, oldest first, with their authors
    async fn list_by_article(&self, article_id: i64) -> Result<Vec<CommentWithAuthor>>;

    async fn update_content(&self, comment: &Comment) -> Result<Comment>;

    /// Returns false if the comment was missing or already deleted
    async fn soft_delete(&self, id: i64) -> Result<bool>;
}

pub struct SqlxCommentRepository {
    pool: DynDatabasePool,
}

impl SqlxCommentRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn CommentRepository> {
        Arc::new(Self::new(pool))
    }
}

#[derive(sqlx::FromRow)]
struct CommentAuthorRow {
    id: i64,
    content: String,
    article_id: i64,
    user_id: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
    username: Option<String>,
    avatar_url: Option<String>,
}

impl From<CommentAuthorRow> for CommentWithAuthor {
    fn from(row: CommentAuthorRow) -> Self {
        let user = row.username.map(|username| UserSummary {
            id: row.user_id,
            username,
            avatar_url: row.avatar_url.unwrap_or_default(),
        });
        Self {
            comment: Comment {
                id: row.id,
                content: row.content,
                article_id: row.article_id,
                user_id: row.user_id,
                created_at: row.created_at,
                updated_at: row.updated_at,
                deleted_at: row.deleted_at,
            },
            user,
        }
    }
}

#[async_trait]
impl CommentRepository for SqlxCommentRepository {
    async fn create(&self, comment: &Comment) -> Result<Comment> {
        let id = with_pool!(self.pool, db => {
            sqlx::query(
                "INSERT INTO comments (content, article_id, user_id, created_at, updated_at) \
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(&comment.content)
            .bind(comment.article_id)
            .bind(comment.user_id)
            .bind(comment.created_at)
            .bind(comment.updated_at)
            .execute(db)
            .await
            .context("Failed to create comment")?
            .inserted_id()
        });

        Ok(Comment {
            id,
            ..comment.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Comment>> {
        with_pool!(self.pool, db => {
            sqlx::query_as::<_, Comment>(
                "SELECT id, content, article_id, user_id, created_at, updated_at, deleted_at \
                 FROM comments WHERE id = ? AND deleted_at IS NULL",
            )
            .bind(id)
            .fetch_optional(db)
            .await
            .context("Failed to get comment by ID")
        })
    }

    async fn list_by_article(&self, article_id: i64) -> Result<Vec<CommentWithAuthor>> {
        let rows = with_pool!(self.pool, db => {
            sqlx::query_as::<_, CommentAuthorRow>(
                r#"
                SELECT c.id, c.content, c.article_id, c.user_id, c.created_at, c.updated_at,
                       c.deleted_at, u.username, u.avatar_url
                FROM comments c
                LEFT JOIN users u ON u.id = c.user_id
                WHERE c.article_id = ? AND c.deleted_at IS NULL
                ORDER BY c.created_at ASC, c.id ASC
                "#,
            )
            .bind(article_id)
            .fetch_all(db)
            .await
            .context("Failed to list comments")?
        });

        Ok(rows.into_iter().map(CommentWithAuthor::from).collect())
    }

    async fn update_content(&self, comment: &Comment) -> Result<Comment> {
        with_pool!(self.pool, db => {
            sqlx::query(
                "UPDATE comments SET content = ?, updated_at = ? \
                 WHERE id = ? AND deleted_at IS NULL",
            )
            .bind(&comment.content)
            .bind(comment.updated_at)
            .bind(comment.id)
            .execute(db)
            .await
            .context("Failed to update comment")?;
        });

        Ok(comment.clone())
    }

    async fn soft_delete(&self, id: i64) -> Result<bool> {
        let affected = with_pool!(self.pool, db => {
            sqlx::query("UPDATE comments SET deleted_at = ? WHERE id = ? AND deleted_at IS NULL")
                .bind(Utc::now())
                .bind(id)
                .execute(db)
                .await
                .context("Failed to delete comment")?
                .rows_affected()
        });

        Ok(affected > 0)
    }
}
