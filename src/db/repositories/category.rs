//! Category repository
//!
//! Deletion is not offered here: removing a category goes through
//! [`crate::db::cascade`], which also removes the articles filed under it.

use crate::db::{DynDatabasePool, InsertedId};
use crate::models::{Category, CategoryWithCount};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Category repository trait
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn create(&self, category: &Category) -> Result<Category>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Category>>;

    async fn get_by_name(&self, name: &str) -> Result<Option<Category>>;

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Category>>;

    /// All categories by name, each with its count of live articles
    async fn list_with_counts(&self) -> Result<Vec<CategoryWithCount>>;

    async fn update(&self, category: &Category) -> Result<Category>;
}

pub struct SqlxCategoryRepository {
    pool: DynDatabasePool,
}

impl SqlxCategoryRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn CategoryRepository> {
        Arc::new(Self::new(pool))
    }

    async fn get_where(&self, column: &str, value: String) -> Result<Option<Category>> {
        let sql = format!(
            "SELECT id, name, slug, created_at, updated_at FROM categories WHERE {} = ?",
            column
        );
        with_pool!(self.pool, db => {
            sqlx::query_as::<_, Category>(&sql)
                .bind(value)
                .fetch_optional(db)
                .await
                .with_context(|| format!("Failed to get category by {}", column))
        })
    }
}

#[derive(sqlx::FromRow)]
struct CategoryCountRow {
    id: i64,
    name: String,
    slug: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    article_count: i64,
}

#[async_trait]
impl CategoryRepository for SqlxCategoryRepository {
    async fn create(&self, category: &Category) -> Result<Category> {
        let id = with_pool!(self.pool, db => {
            sqlx::query(
                "INSERT INTO categories (name, slug, created_at, updated_at) VALUES (?, ?, ?, ?)",
            )
            .bind(&category.name)
            .bind(&category.slug)
            .bind(category.created_at)
            .bind(category.updated_at)
            .execute(db)
            .await
            .context("Failed to create category")?
            .inserted_id()
        });

        Ok(Category {
            id,
            ..category.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Category>> {
        with_pool!(self.pool, db => {
            sqlx::query_as::<_, Category>(
                "SELECT id, name, slug, created_at, updated_at FROM categories WHERE id = ?",
            )
            .bind(id)
            .fetch_optional(db)
            .await
            .context("Failed to get category by ID")
        })
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Category>> {
        self.get_where("name", name.to_string()).await
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Category>> {
        self.get_where("slug", slug.to_string()).await
    }

    async fn list_with_counts(&self) -> Result<Vec<CategoryWithCount>> {
        let rows = with_pool!(self.pool, db => {
            sqlx::query_as::<_, CategoryCountRow>(
                r#"
                SELECT c.id, c.name, c.slug, c.created_at, c.updated_at,
                       (SELECT COUNT(*) FROM articles a
                        WHERE a.category_id = c.id AND a.deleted_at IS NULL) AS article_count
                FROM categories c
                ORDER BY c.name
                "#,
            )
            .fetch_all(db)
            .await
            .context("Failed to list categories")?
        });

        Ok(rows
            .into_iter()
            .map(|row| CategoryWithCount {
                category: Category {
                    id: row.id,
                    name: row.name,
                    slug: row.slug,
                    created_at: row.created_at,
                    updated_at: row.updated_at,
                },
                article_count: row.article_count,
            })
            .collect())
    }

    async fn update(&self, category: &Category) -> Result<Category> {
        with_pool!(self.pool, db => {
            sqlx::query("UPDATE categories SET name = ?, slug = ?, updated_at = ? WHERE id = ?")
                .bind(&category.name)
                .bind(&category.slug)
                .bind(category.updated_at)
                .bind(category.id)
                .execute(db)
                .await
                .context("Failed to update category")?;
        });

        Ok(category.clone())
    }
}
