//! Tag service
//!
//! Tags are created explicitly or on the fly from the names attached to an
//! article. Deleting a tag cascades to every article carrying it.

use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;

use crate::db::repositories::TagRepository;
use crate::db::{cascade_delete, CascadeError, CascadeReport, CascadeTarget, DynDatabasePool};
use crate::models::{Tag, TagInput, TagWithCount};
use crate::services::slug::name_and_slug;

#[derive(Debug, thiserror::Error)]
pub enum TagServiceError {
    #[error("Tag name already exists: {0}")]
    DuplicateName(String),

    #[error("Tag not found: {0}")]
    NotFound(i64),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl From<CascadeError> for TagServiceError {
    fn from(err: CascadeError) -> Self {
        match err {
            CascadeError::NotFound(CascadeTarget::Tag(id)) => Self::NotFound(id),
            other => Self::InternalError(other.into()),
        }
    }
}

pub struct TagService {
    repo: Arc<dyn TagRepository>,
    pool: DynDatabasePool,
}

impl TagService {
    pub fn new(repo: Arc<dyn TagRepository>, pool: DynDatabasePool) -> Self {
        Self { repo, pool }
    }

    pub async fn list(&self) -> Result<Vec<TagWithCount>, TagServiceError> {
        Ok(self
            .repo
            .list_with_counts()
            .await
            .context("Failed to list tags")?)
    }

    pub async fn get(&self, id: i64) -> Result<Tag, TagServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get tag")?
            .ok_or(TagServiceError::NotFound(id))
    }

    pub async fn create(&self, input: TagInput) -> Result<Tag, TagServiceError> {
        let (name, slug) = name_and_slug(&input.name)
            .map_err(|msg| TagServiceError::ValidationError(msg.to_string()))?;
        if self.find_existing(&name, &slug).await?.is_some() {
            return Err(TagServiceError::DuplicateName(name));
        }

        Ok(self
            .repo
            .create(&Tag::new(name, slug))
            .await
            .context("Failed to create tag")?)
    }

    pub async fn update(&self, id: i64, input: TagInput) -> Result<Tag, TagServiceError> {
        let mut tag = self.get(id).await?;
        let (name, slug) = name_and_slug(&input.name)
            .map_err(|msg| TagServiceError::ValidationError(msg.to_string()))?;
        if let Some(existing) = self.find_existing(&name, &slug).await? {
            if existing.id != id {
                return Err(TagServiceError::DuplicateName(name));
            }
        }

        tag.name = name;
        tag.slug = slug;
        tag.updated_at = Utc::now();

        Ok(self.repo.update(&tag).await.context("Failed to update tag")?)
    }

    /// Delete the tag and every article carrying it
    pub async fn delete(&self, id: i64) -> Result<CascadeReport, TagServiceError> {
        Ok(cascade_delete(&self.pool, CascadeTarget::Tag(id)).await?)
    }

    /// `(article_id, tag)` pairs for a batch of articles
    pub async fn tags_of_articles(&self, article_ids: &[i64]) -> Result<Vec<(i64, Tag)>, TagServiceError> {
        Ok(self
            .repo
            .get_by_article_ids(article_ids)
            .await
            .context("Failed to get article tags")?)
    }

    async fn find_existing(&self, name: &str, slug: &str) -> Result<Option<Tag>, TagServiceError> {
        if let Some(tag) = self.repo.get_by_name(name).await.context("Failed to check name")? {
            return Ok(Some(tag));
        }
        Ok(self.repo.get_by_slug(slug).await.context("Failed to check slug")?)
    }
}

/// Unsaved tags for the names attached to an article.
///
/// Names are trimmed, blanks dropped, and names sharing a slug yield one tag,
/// in first-seen order. The article repository matches them against stored
/// tags inside its own transaction.
pub fn tag_drafts(names: &[String]) -> Result<Vec<Tag>, TagServiceError> {
    let mut drafts: Vec<Tag> = Vec::with_capacity(names.len());

    for raw in names {
        if raw.trim().is_empty() {
            continue;
        }
        let (name, slug) = name_and_slug(raw)
            .map_err(|msg| TagServiceError::ValidationError(format!("{}: {:?}", msg, raw)))?;

        if !drafts.iter().any(|t| t.name == name || t.slug == slug) {
            drafts.push(Tag::new(name, slug));
        }
    }

    Ok(drafts)
}
