//! Tag repository
//!
//! Tags reach articles through `article_tags`; the link rows themselves are
//! written by the article repository. Deleting a tag is a cascade, see
//! [`crate::db::cascade`].

use crate::db::{placeholders, DynDatabasePool, InsertedId};
use crate::models::{Tag, TagWithCount};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

#[async_trait]
pub trait TagRepository: Send + Sync {
    async fn create(&self, tag: &Tag) -> Result<Tag>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Tag>>;

    async fn get_by_name(&self, name: &str) -> Result<Option<Tag>>;

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Tag>>;

    /// All tags by name, each with its count of live articles
    async fn list_with_counts(&self) -> Result<Vec<TagWithCount>>;

    async fn update(&self, tag: &Tag) -> Result<Tag>;

    /// Tags of several articles as `(article_id, tag)` pairs
    async fn get_by_article_ids(&self, article_ids: &[i64]) -> Result<Vec<(i64, Tag)>>;
}

pub struct SqlxTagRepository {
    pool: DynDatabasePool,
}

impl SqlxTagRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn TagRepository> {
        Arc::new(Self::new(pool))
    }

    async fn get_where(&self, column: &str, value: String) -> Result<Option<Tag>> {
        let sql = format!(
            "SELECT id, name, slug, created_at, updated_at FROM tags WHERE {} = ?",
            column
        );
        with_pool!(self.pool, db => {
            sqlx::query_as::<_, Tag>(&sql)
                .bind(value)
                .fetch_optional(db)
                .await
                .with_context(|| format!("Failed to get tag by {}", column))
        })
    }
}

#[derive(sqlx::FromRow)]
struct TagCountRow {
    id: i64,
    name: String,
    slug: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    article_count: i64,
}

#[derive(sqlx::FromRow)]
struct LinkedTagRow {
    article_id: i64,
    id: i64,
    name: String,
    slug: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[async_trait]
impl TagRepository for SqlxTagRepository {
    async fn create(&self, tag: &Tag) -> Result<Tag> {
        let id = with_pool!(self.pool, db => {
            sqlx::query("INSERT INTO tags (name, slug, created_at, updated_at) VALUES (?, ?, ?, ?)")
                .bind(&tag.name)
                .bind(&tag.slug)
                .bind(tag.created_at)
                .bind(tag.updated_at)
                .execute(db)
                .await
                .context("Failed to create tag")?
                .inserted_id()
        });

        Ok(Tag { id, ..tag.clone() })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Tag>> {
        with_pool!(self.pool, db => {
            sqlx::query_as::<_, Tag>(
                "SELECT id, name, slug, created_at, updated_at FROM tags WHERE id = ?",
            )
            .bind(id)
            .fetch_optional(db)
            .await
            .context("Failed to get tag by ID")
        })
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Tag>> {
        self.get_where("name", name.to_string()).await
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Tag>> {
        self.get_where("slug", slug.to_string()).await
    }

    async fn list_with_counts(&self) -> Result<Vec<TagWithCount>> {
        let rows = with_pool!(self.pool, db => {
            sqlx::query_as::<_, TagCountRow>(
                r#"
                SELECT t.id, t.name, t.slug, t.created_at, t.updated_at,
                       (SELECT COUNT(*) FROM article_tags link
                        JOIN articles a ON a.id = link.article_id
                        WHERE link.tag_id = t.id AND a.deleted_at IS NULL) AS article_count
                FROM tags t
                ORDER BY t.name
                "#,
            )
            .fetch_all(db)
            .await
            .context("Failed to list tags")?
        });

        Ok(rows
            .into_iter()
            .map(|row| TagWithCount {
                tag: Tag {
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

    async fn update(&self, tag: &Tag) -> Result<Tag> {
        with_pool!(self.pool, db => {
            sqlx::query("UPDATE tags SET name = ?, slug = ?, updated_at = ? WHERE id = ?")
                .bind(&tag.name)
                .bind(&tag.slug)
                .bind(tag.updated_at)
                .bind(tag.id)
                .execute(db)
                .await
                .context("Failed to update tag")?;
        });

        Ok(tag.clone())
    }

    async fn get_by_article_ids(&self, article_ids: &[i64]) -> Result<Vec<(i64, Tag)>> {
        if article_ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT link.article_id, t.id, t.name, t.slug, t.created_at, t.updated_at \
             FROM article_tags link JOIN tags t ON t.id = link.tag_id \
             WHERE link.article_id IN ({}) ORDER BY t.name",
            placeholders(article_ids.len())
        );

        let rows = with_pool!(self.pool, db => {
            let mut query = sqlx::query_as::<_, LinkedTagRow>(&sql);
            for id in article_ids {
                query = query.bind(*id);
            }
            query
                .fetch_all(db)
                .await
                .context("Failed to load article tags")?
        });

        Ok(rows
            .into_iter()
            .map(|row| {
                (
                    row.article_id,
                    Tag {
                        id: row.id,
                        name: row.name,
                        slug: row.slug,
                        created_at: row.created_at,
                        updated_at: row.updated_at,
                    },
                )
            })
            .collect())
    }
}
