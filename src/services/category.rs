//! Category service
//!
//! Names and slugs are unique. Deleting a category cascades to every
//! article filed under it (see [`crate::db::cascade`]).

use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;

use crate::db::repositories::CategoryRepository;
use crate::db::{cascade_delete, CascadeError, CascadeReport, CascadeTarget, DynDatabasePool};
use crate::models::{Category, CategoryInput, CategoryWithCount};
use crate::services::slug::name_and_slug;

#[derive(Debug, thiserror::Error)]
pub enum CategoryServiceError {
    #[error("Category name already exists: {0}")]
    DuplicateName(String),

    #[error("Category not found: {0}")]
    NotFound(i64),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl From<CascadeError> for CategoryServiceError {
    fn from(err: CascadeError) -> Self {
        match err {
            CascadeError::NotFound(CascadeTarget::Category(id)) => Self::NotFound(id),
            other => Self::InternalError(other.into()),
        }
    }
}

pub struct CategoryService {
    repo: Arc<dyn CategoryRepository>,
    pool: DynDatabasePool,
}

impl CategoryService {
    pub fn new(repo: Arc<dyn CategoryRepository>, pool: DynDatabasePool) -> Self {
        Self { repo, pool }
    }

    /// All categories with their live article counts, by name
    pub async fn list(&self) -> Result<Vec<CategoryWithCount>, CategoryServiceError> {
        Ok(self
            .repo
            .list_with_counts()
            .await
            .context("Failed to list categories")?)
    }

    pub async fn get(&self, id: i64) -> Result<Category, CategoryServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get category")?
            .ok_or(CategoryServiceError::NotFound(id))
    }

    pub async fn create(&self, input: CategoryInput) -> Result<Category, CategoryServiceError> {
        let (name, slug) = name_and_slug(&input.name)
            .map_err(|msg| CategoryServiceError::ValidationError(msg.to_string()))?;
        self.ensure_unique(&name, &slug, None).await?;

        let created = self
            .repo
            .create(&Category::new(name, slug))
            .await
            .context("Failed to create category")?;

        tracing::info!(category_id = created.id, name = %created.name, "Category created");
        Ok(created)
    }

    pub async fn update(&self, id: i64, input: CategoryInput) -> Result<Category, CategoryServiceError> {
        let mut category = self.get(id).await?;
        let (name, slug) = name_and_slug(&input.name)
            .map_err(|msg| CategoryServiceError::ValidationError(msg.to_string()))?;
        self.ensure_unique(&name, &slug, Some(id)).await?;

        category.name = name;
        category.slug = slug;
        category.updated_at = Utc::now();

        Ok(self
            .repo
            .update(&category)
            .await
            .context("Failed to update category")?)
    }

    /// Delete the category and everything filed under it
    pub async fn delete(&self, id: i64) -> Result<CascadeReport, CategoryServiceError> {
        Ok(cascade_delete(&self.pool, CascadeTarget::Category(id)).await?)
    }

    async fn ensure_unique(
        &self,
        name: &str,
        slug: &str,
        except: Option<i64>,
    ) -> Result<(), CategoryServiceError> {
        let by_name = self.repo.get_by_name(name).await.context("Failed to check name")?;
        let by_slug = self.repo.get_by_slug(slug).await.context("Failed to check slug")?;

        let taken = [by_name, by_slug]
            .into_iter()
            .flatten()
            .any(|existing| Some(existing.id) != except);
        if taken {
            return Err(CategoryServiceError::DuplicateName(name.to_string()));
        }
        Ok(())
    }
}
