//! Comment service

use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;

use crate::db::repositories::{ArticleRepository, CommentRepository};
use crate::models::{Comment, CommentInput, CommentWithAuthor};
use crate::services::access::{ensure_owner, NotOwner};

#[derive(Debug, thiserror::Error)]
pub enum CommentServiceError {
    #[error("Comment not found: {0}")]
    NotFound(i64),

    #[error("Article not found: {0}")]
    ArticleNotFound(i64),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Forbidden: {0}")]
    Forbidden(#[from] NotOwner),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

pub struct CommentService {
    comments: Arc<dyn CommentRepository>,
    articles: Arc<dyn ArticleRepository>,
}

impl CommentService {
    pub fn new(comments: Arc<dyn CommentRepository>, articles: Arc<dyn ArticleRepository>) -> Self {
        Self { comments, articles }
    }

    /// Live comments of a live article, oldest first
    pub async fn list(&self, article_id: i64) -> Result<Vec<CommentWithAuthor>, CommentServiceError> {
        self.ensure_article(article_id).await?;
        Ok(self
            .comments
            .list_by_article(article_id)
            .await
            .context("Failed to list comments")?)
    }

    pub async fn create(
        &self,
        user_id: i64,
        article_id: i64,
        input: CommentInput,
    ) -> Result<Comment, CommentServiceError> {
        let content = validate_content(input)?;
        self.ensure_article(article_id).await?;

        let created = self
            .comments
            .create(&Comment::new(content, article_id, user_id))
            .await
            .context("Failed to create comment")?;

        tracing::debug!(comment_id = created.id, article_id, "Comment created");
        Ok(created)
    }

    pub async fn update(
        &self,
        subject_id: i64,
        id: i64,
        input: CommentInput,
    ) -> Result<Comment, CommentServiceError> {
        let mut comment = self.find(id).await?;
        ensure_owner(subject_id, comment.user_id)?;

        comment.content = validate_content(input)?;
        comment.updated_at = Utc::now();

        Ok(self
            .comments
            .update_content(&comment)
            .await
            .context("Failed to update comment")?)
    }

    /// Soft delete
    pub async fn delete(&self, subject_id: i64, id: i64) -> Result<(), CommentServiceError> {
        let comment = self.find(id).await?;
        ensure_owner(subject_id, comment.user_id)?;

        self.comments
            .soft_delete(id)
            .await
            .context("Failed to delete comment")?;
        Ok(())
    }

    async fn find(&self, id: i64) -> Result<Comment, CommentServiceError> {
        self.comments
            .get_by_id(id)
            .await
            .context("Failed to get comment")?
            .ok_or(CommentServiceError::NotFound(id))
    }

    async fn ensure_article(&self, article_id: i64) -> Result<(), CommentServiceError> {
        self.articles
            .get_by_id(article_id)
            .await
            .context("Failed to get article")?
            .map(|_| ())
            .ok_or(CommentServiceError::ArticleNotFound(article_id))
    }
}

fn validate_content(input: CommentInput) -> Result<String, CommentServiceError> {
    if input.content.trim().is_empty() {
        return Err(CommentServiceError::ValidationError(
            "Content cannot be empty".to_string(),
        ));
    }
    Ok(input.content)
}
