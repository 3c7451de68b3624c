//! Article repository
//!
//! Every read skips soft-deleted rows. Writes that touch both `articles` and
//! `article_tags` run in a single transaction.

use crate::db::{placeholders, DynDatabasePool, InsertedId};
use crate::models::{Article, ArticleFilter, ListParams, Tag};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

const ARTICLE_COLUMNS: &str = "a.id, a.title, a.content, a.author_id, a.category_id, \
    a.likes, a.views, a.created_at, a.updated_at, a.deleted_at";

/// Which counter `increment` bumps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    Likes,
    Views,
}

impl Counter {
    fn column(&self) -> &'static str {
        match self {
            Self::Likes => "likes",
            Self::Views => "views",
        }
    }
}

#[async_trait]
pub trait ArticleRepository: Send + Sync {
    /// Insert `article` and link it to `tags`, in one transaction.
    ///
    /// `tags` may be unsaved: each is matched to a stored tag by name, then
    /// by slug, and inserted when neither matches.
    async fn create(&self, article: &Article, tags: &[Tag]) -> Result<Article>;

    /// Live (not soft-deleted) article by id
    async fn get_by_id(&self, id: i64) -> Result<Option<Article>>;

    /// Newest-first page of live articles matching `filter`, with the total count
    async fn list(&self, filter: &ArticleFilter, params: &ListParams)
        -> Result<(Vec<Article>, i64)>;

    /// Persist title, content and category; replace tag links when `tags` is
    /// given, resolving them as in [`ArticleRepository::create`]
    async fn update(&self, article: &Article, tags: Option<&[Tag]>) -> Result<Article>;

    /// Soft-delete one article. Returns false if it was missing or already deleted.
    async fn soft_delete(&self, id: i64) -> Result<bool>;

    /// Soft-delete several articles in one transaction, returning how many changed
    async fn soft_delete_many(&self, ids: &[i64]) -> Result<u64>;

    /// Atomically add one to a counter and return the new value, or `None`
    /// when the article is missing
    async fn increment(&self, id: i64, counter: Counter) -> Result<Option<i64>>;
}

pub struct SqlxArticleRepository {
    pool: DynDatabasePool,
}

impl SqlxArticleRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ArticleRepository> {
        Arc::new(Self::new(pool))
    }
}

/// WHERE clause (after `deleted_at IS NULL`) and its bind values, in order
fn filter_clause(filter: &ArticleFilter) -> (String, Vec<FilterValue>) {
    let mut clause = String::from("a.deleted_at IS NULL");
    let mut values = Vec::new();

    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        clause.push_str(" AND (a.title LIKE ? OR a.content LIKE ?)");
        values.push(FilterValue::Text(pattern.clone()));
        values.push(FilterValue::Text(pattern));
    }
    if let Some(category_id) = filter.category_id {
        clause.push_str(" AND a.category_id = ?");
        values.push(FilterValue::Id(category_id));
    }
    if let Some(tag_id) = filter.tag_id {
        clause.push_str(
            " AND EXISTS (SELECT 1 FROM article_tags link \
             WHERE link.article_id = a.id AND link.tag_id = ?)",
        );
        values.push(FilterValue::Id(tag_id));
    }

    (clause, values)
}

#[derive(Debug, Clone, PartialEq)]
enum FilterValue {
    Text(String),
    Id(i64),
}

/// Resolve `$tags` to distinct stored tag ids inside `$tx`, inserting the
/// missing ones
macro_rules! resolve_tags {
    ($tx:ident, $tags:expr) => {{
        let mut ids: Vec<i64> = Vec::new();
        for tag in $tags {
            let existing: Option<i64> = sqlx::query_scalar(
                "SELECT id FROM tags WHERE name = ? OR slug = ? \
                 ORDER BY CASE WHEN name = ? THEN 0 ELSE 1 END LIMIT 1",
            )
            .bind(&tag.name)
            .bind(&tag.slug)
            .bind(&tag.name)
            .fetch_optional(&mut *$tx)
            .await
            .context("Failed to look up tag")?;

            let id = match existing {
                Some(id) => id,
                None => sqlx::query(
                    "INSERT INTO tags (name, slug, created_at, updated_at) VALUES (?, ?, ?, ?)",
                )
                .bind(&tag.name)
                .bind(&tag.slug)
                .bind(tag.created_at)
                .bind(tag.updated_at)
                .execute(&mut *$tx)
                .await
                .context("Failed to create tag")?
                .inserted_id(),
            };
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids
    }};
}

/// Link `$article_id` to each of `$tag_ids` inside `$tx`
macro_rules! link_tags {
    ($tx:ident, $article_id:expr, $tag_ids:expr) => {{
        for tag_id in $tag_ids {
            sqlx::query("INSERT INTO article_tags (article_id, tag_id) VALUES (?, ?)")
                .bind($article_id)
                .bind(*tag_id)
                .execute(&mut *$tx)
                .await
                .context("Failed to link tag")?;
        }
    }};
}

/// Bind filter values onto a query; expands to the same code for both backends
macro_rules! bind_filter {
    ($query:expr, $values:expr) => {{
        let mut query = $query;
        for value in $values {
            query = match value {
                FilterValue::Text(text) => query.bind(text.clone()),
                FilterValue::Id(id) => query.bind(*id),
            };
        }
        query
    }};
}

#[async_trait]
impl ArticleRepository for SqlxArticleRepository {
    async fn create(&self, article: &Article, tags: &[Tag]) -> Result<Article> {
        let id = with_pool!(self.pool, db => {
            let mut tx = db.begin().await.context("Failed to begin transaction")?;
            let tag_ids = resolve_tags!(tx, tags);

            let id = sqlx::query(
                "INSERT INTO articles (title, content, author_id, category_id, likes, views, \
                 created_at, updated_at) VALUES (?, ?, ?, ?, 0, 0, ?, ?)",
            )
            .bind(&article.title)
            .bind(&article.content)
            .bind(article.author_id)
            .bind(article.category_id)
            .bind(article.created_at)
            .bind(article.updated_at)
            .execute(&mut *tx)
            .await
            .context("Failed to create article")?
            .inserted_id();

            link_tags!(tx, id, &tag_ids);

            tx.commit().await.context("Failed to commit article")?;
            id
        });

        Ok(Article {
            id,
            likes: 0,
            views: 0,
            deleted_at: None,
            ..article.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Article>> {
        let sql = format!(
            "SELECT {} FROM articles a WHERE a.id = ? AND a.deleted_at IS NULL",
            ARTICLE_COLUMNS
        );
        with_pool!(self.pool, db => {
            sqlx::query_as::<_, Article>(&sql)
                .bind(id)
                .fetch_optional(db)
                .await
                .context("Failed to get article by ID")
        })
    }

    async fn list(
        &self,
        filter: &ArticleFilter,
        params: &ListParams,
    ) -> Result<(Vec<Article>, i64)> {
        let (clause, values) = filter_clause(filter);
        let count_sql = format!("SELECT COUNT(*) FROM articles a WHERE {}", clause);
        let list_sql = format!(
            "SELECT {} FROM articles a WHERE {} ORDER BY a.created_at DESC, a.id DESC \
             LIMIT ? OFFSET ?",
            ARTICLE_COLUMNS, clause
        );

        with_pool!(self.pool, db => {
            let total: i64 = bind_filter!(sqlx::query_scalar(&count_sql), &values)
                .fetch_one(db)
                .await
                .context("Failed to count articles")?;

            let articles = bind_filter!(sqlx::query_as::<_, Article>(&list_sql), &values)
                .bind(params.limit())
                .bind(params.offset())
                .fetch_all(db)
                .await
                .context("Failed to list articles")?;

            Ok((articles, total))
        })
    }

    async fn update(&self, article: &Article, tags: Option<&[Tag]>) -> Result<Article> {
        with_pool!(self.pool, db => {
            let mut tx = db.begin().await.context("Failed to begin transaction")?;
            let tag_ids = match tags {
                Some(tags) => Some(resolve_tags!(tx, tags)),
                None => None,
            };

            sqlx::query(
                "UPDATE articles SET title = ?, content = ?, category_id = ?, updated_at = ? \
                 WHERE id = ? AND deleted_at IS NULL",
            )
            .bind(&article.title)
            .bind(&article.content)
            .bind(article.category_id)
            .bind(article.updated_at)
            .bind(article.id)
            .execute(&mut *tx)
            .await
            .context("Failed to update article")?;

            if let Some(tag_ids) = tag_ids {
                sqlx::query("DELETE FROM article_tags WHERE article_id = ?")
                    .bind(article.id)
                    .execute(&mut *tx)
                    .await
                    .context("Failed to clear article tags")?;
                link_tags!(tx, article.id, &tag_ids);
            }

            tx.commit().await.context("Failed to commit article update")?;
        });

        Ok(article.clone())
    }

    async fn soft_delete(&self, id: i64) -> Result<bool> {
        Ok(self.soft_delete_many(&[id]).await? > 0)
    }

    async fn soft_delete_many(&self, ids: &[i64]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let sql = format!(
            "UPDATE articles SET deleted_at = ? WHERE deleted_at IS NULL AND id IN ({})",
            placeholders(ids.len())
        );
        let now: DateTime<Utc> = Utc::now();

        with_pool!(self.pool, db => {
            let mut tx = db.begin().await.context("Failed to begin transaction")?;
            let mut query = sqlx::query(&sql).bind(now);
            for id in ids {
                query = query.bind(*id);
            }
            let affected = query
                .execute(&mut *tx)
                .await
                .context("Failed to soft-delete articles")?
                .rows_affected();
            tx.commit().await.context("Failed to commit soft delete")?;
            Ok(affected)
        })
    }

    async fn increment(&self, id: i64, counter: Counter) -> Result<Option<i64>> {
        let column = counter.column();
        let update_sql = format!(
            "UPDATE articles SET {col} = {col} + 1 WHERE id = ? AND deleted_at IS NULL",
            col = column
        );
        let select_sql = format!("SELECT {} FROM articles WHERE id = ?", column);

        with_pool!(self.pool, db => {
            let mut tx = db.begin().await.context("Failed to begin transaction")?;
            let affected = sqlx::query(&update_sql)
                .bind(id)
                .execute(&mut *tx)
                .await
                .with_context(|| format!("Failed to increment {}", column))?
                .rows_affected();
            if affected == 0 {
                return Ok(None);
            }
            let value: i64 = sqlx::query_scalar(&select_sql)
                .bind(id)
                .fetch_one(&mut *tx)
                .await
                .with_context(|| format!("Failed to read {}", column))?;
            tx.commit().await.context("Failed to commit counter")?;
            Ok(Some(value))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::*;

    fn draft(name: &str) -> Tag {
        Tag::new(name.to_string(), name.to_lowercase())
    }

    async fn setup() -> (DynDatabasePool, SqlxArticleRepository, i64) {
        let pool = migrated_pool().await;
        let user = seed_user(&pool, "solo").await;
        let repo = SqlxArticleRepository::new(pool.clone());
        (pool, repo, user)
    }

    #[tokio::test]
    async fn test_create_with_tags() {
        let (pool, repo, user) = setup().await;
        let category = seed_category(&pool, "Rust").await;
        let existing = seed_tag(&pool, "async").await;

        let created = repo
            .create(
                &Article::new("Hello".into(), "World".into(), user, Some(category)),
                &[draft("async"), draft("tokio"), draft("Tokio")],
            )
            .await
            .unwrap();

        assert!(created.id > 0);
        assert_eq!(count_rows(&pool, "tags").await, 2);
        assert_eq!(count_rows(&pool, "article_tags").await, 2);
        let linked: Vec<i64> =
            sqlx::query_scalar("SELECT tag_id FROM article_tags WHERE article_id = ? ORDER BY tag_id")
                .bind(created.id)
                .fetch_all(sqlite(&pool))
                .await
                .unwrap();
        assert_eq!(linked[0], existing);

        let stored = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(stored.title, "Hello");
        assert_eq!(stored.category_id, Some(category));
        assert_eq!(stored.likes, 0);
    }

    #[tokio::test]
    async fn test_failed_create_leaves_no_new_tags() {
        let (pool, repo, _user) = setup().await;

        let result = repo
            .create(
                &Article::new("T".into(), "C".into(), 999, None),
                &[draft("fresh"), draft("new")],
            )
            .await;

        assert!(result.is_err());
        assert_eq!(count_rows(&pool, "articles").await, 0);
        assert_eq!(count_rows(&pool, "tags").await, 0);
    }

    #[tokio::test]
    async fn test_failed_update_leaves_no_new_tags() {
        let (pool, repo, user) = setup().await;
        let mut article = repo
            .create(&Article::new("T".into(), "C".into(), user, None), &[])
            .await
            .unwrap();
        article.category_id = Some(404);

        let result = repo.update(&article, Some(&[draft("fresh")][..])).await;

        assert!(result.is_err());
        assert_eq!(count_rows(&pool, "tags").await, 0);
        let stored = repo.get_by_id(article.id).await.unwrap().unwrap();
        assert_eq!(stored.category_id, None);
    }

    #[tokio::test]
    async fn test_soft_deleted_hidden_from_reads() {
        let (pool, repo, user) = setup().await;
        let live = seed_article(&pool, user, None).await;
        let gone = seed_article(&pool, user, None).await;

        assert!(repo.soft_delete(gone).await.unwrap());
        assert!(!repo.soft_delete(gone).await.unwrap());

        assert!(repo.get_by_id(gone).await.unwrap().is_none());
        let (items, total) = repo
            .list(&ArticleFilter::default(), &ListParams::default())
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(items[0].id, live);

        // The row itself is still there.
        assert_eq!(count_rows(&pool, "articles").await, 2);
    }

    #[tokio::test]
    async fn test_list_filters_and_pagination() {
        let (pool, repo, user) = setup().await;
        let rust = seed_category(&pool, "Rust").await;
        let tag = seed_tag(&pool, "web").await;

        let tagged = repo
            .create(
                &Article::new("Axum routing".into(), "handlers".into(), user, Some(rust)),
                &[draft("web")],
            )
            .await
            .unwrap();
        repo.create(
            &Article::new("Other".into(), "mentions axum inside".into(), user, None),
            &[],
        )
        .await
        .unwrap();
        for i in 0..5 {
            repo.create(
                &Article::new(format!("Filler {}", i), "x".into(), user, Some(rust)),
                &[],
            )
            .await
            .unwrap();
        }

        let search = ArticleFilter {
            search: Some("axum".into()),
            ..Default::default()
        };
        let (_, total) = repo.list(&search, &ListParams::default()).await.unwrap();
        assert_eq!(total, 2);

        let by_category = ArticleFilter {
            category_id: Some(rust),
            ..Default::default()
        };
        let (page, total) = repo
            .list(&by_category, &ListParams::new(2, 4))
            .await
            .unwrap();
        assert_eq!(total, 6);
        assert_eq!(page.len(), 2);

        let by_tag = ArticleFilter {
            tag_id: Some(tag),
            ..Default::default()
        };
        let (items, total) = repo.list(&by_tag, &ListParams::default()).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(items[0].id, tagged.id);
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let (_pool, repo, user) = setup().await;
        let mut older = Article::new("older".into(), "c".into(), user, None);
        older.created_at = Utc::now() - chrono::Duration::hours(1);
        repo.create(&older, &[]).await.unwrap();
        repo.create(&Article::new("newer".into(), "c".into(), user, None), &[])
            .await
            .unwrap();

        let (items, _) = repo
            .list(&ArticleFilter::default(), &ListParams::default())
            .await
            .unwrap();
        assert_eq!(items[0].title, "newer");
        assert_eq!(items[1].title, "older");
    }

    #[tokio::test]
    async fn test_update_replaces_tags_only_when_given() {
        let (pool, repo, user) = setup().await;
        seed_tag(&pool, "one").await;
        let t2 = seed_tag(&pool, "two").await;
        let mut article = repo
            .create(&Article::new("T".into(), "C".into(), user, None), &[draft("one")])
            .await
            .unwrap();

        article.title = "Renamed".into();
        repo.update(&article, None).await.unwrap();
        assert_eq!(count_rows(&pool, "article_tags").await, 1);

        repo.update(&article, Some(&[draft("two")][..])).await.unwrap();
        let tag_id: i64 = sqlx::query_scalar("SELECT tag_id FROM article_tags WHERE article_id = ?")
            .bind(article.id)
            .fetch_one(sqlite(&pool))
            .await
            .unwrap();
        assert_eq!(tag_id, t2);

        repo.update(&article, Some(&[][..])).await.unwrap();
        assert_eq!(count_rows(&pool, "article_tags").await, 0);

        let stored = repo.get_by_id(article.id).await.unwrap().unwrap();
        assert_eq!(stored.title, "Renamed");
    }

    #[tokio::test]
    async fn test_increment_counters() {
        let (pool, repo, user) = setup().await;
        let id = seed_article(&pool, user, None).await;

        assert_eq!(repo.increment(id, Counter::Likes).await.unwrap(), Some(1));
        assert_eq!(repo.increment(id, Counter::Likes).await.unwrap(), Some(2));
        assert_eq!(repo.increment(id, Counter::Views).await.unwrap(), Some(1));
        assert_eq!(repo.increment(id + 100, Counter::Views).await.unwrap(), None);

        repo.soft_delete(id).await.unwrap();
        assert_eq!(repo.increment(id, Counter::Likes).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_soft_delete_many() {
        let (pool, repo, user) = setup().await;
        let a = seed_article(&pool, user, None).await;
        let b = seed_article(&pool, user, None).await;
        let c = seed_article(&pool, user, None).await;

        assert_eq!(repo.soft_delete_many(&[a, b]).await.unwrap(), 2);
        assert_eq!(repo.soft_delete_many(&[]).await.unwrap(), 0);
        assert!(repo.get_by_id(c).await.unwrap().is_some());
        assert!(repo.get_by_id(a).await.unwrap().is_none());
    }
}
