//! Cascading delete for categories and tags
//!
//! Removing a category or tag also removes every article that references it,
//! together with those articles' comments and all of their tag links. The
//! schema declares plain foreign keys, so rows are deleted child-first:
//!
//! 1. resolve the affected article ids (soft-deleted articles included)
//! 2. delete every `article_tags` row of those articles
//! 3. delete their comments
//! 4. hard-delete the articles
//! 5. delete the category or tag row
//!
//! All steps run in one transaction. Any failure rolls the whole operation
//! back.

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;

use super::{placeholders, DynDatabasePool};

/// Entity whose removal triggers the cascade
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeTarget {
    Category(i64),
    Tag(i64),
}

impl CascadeTarget {
    fn table(&self) -> &'static str {
        match self {
            Self::Category(_) => "categories",
            Self::Tag(_) => "tags",
        }
    }

    fn id(&self) -> i64 {
        match self {
            Self::Category(id) | Self::Tag(id) => *id,
        }
    }

    fn affected_articles_sql(&self) -> &'static str {
        match self {
            Self::Category(_) => "SELECT id FROM articles WHERE category_id = ?",
            Self::Tag(_) => "SELECT DISTINCT article_id FROM article_tags WHERE tag_id = ?",
        }
    }
}

impl std::fmt::Display for CascadeTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Category(id) => write!(f, "category {}", id),
            Self::Tag(id) => write!(f, "tag {}", id),
        }
    }
}

/// Rows removed by a successful cascade, besides the target itself
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CascadeReport {
    pub articles: u64,
    pub comments: u64,
    pub article_tags: u64,
}

#[derive(Debug, Error)]
pub enum CascadeError {
    #[error("{0} not found")]
    NotFound(CascadeTarget),
    #[error("cascade delete of {target} failed: {source}")]
    Storage {
        target: CascadeTarget,
        #[source]
        source: sqlx::Error,
    },
}

/// Delete `target` and everything that depends on it, atomically.
pub async fn cascade_delete(
    pool: &DynDatabasePool,
    target: CascadeTarget,
) -> Result<CascadeReport, CascadeError> {
    let storage = |source: sqlx::Error| CascadeError::Storage { target, source };
    let started = Utc::now();

    let report = with_pool!(pool, db => {
        // Dropping `tx` on any early return rolls back.
        let mut tx = db.begin().await.map_err(storage)?;

        let exists: Option<i64> =
            sqlx::query_scalar(&format!("SELECT id FROM {} WHERE id = ?", target.table()))
                .bind(target.id())
                .fetch_optional(&mut *tx)
                .await
                .map_err(storage)?;
        if exists.is_none() {
            return Err(CascadeError::NotFound(target));
        }

        let article_ids: Vec<i64> = sqlx::query_scalar(target.affected_articles_sql())
            .bind(target.id())
            .fetch_all(&mut *tx)
            .await
            .map_err(storage)?;

        let mut report = CascadeReport::default();
        if !article_ids.is_empty() {
            let in_list = placeholders(article_ids.len());

            let sql = format!("DELETE FROM article_tags WHERE article_id IN ({})", in_list);
            let mut query = sqlx::query(&sql);
            for id in &article_ids {
                query = query.bind(*id);
            }
            report.article_tags = query.execute(&mut *tx).await.map_err(storage)?.rows_affected();

            let sql = format!("DELETE FROM comments WHERE article_id IN ({})", in_list);
            let mut query = sqlx::query(&sql);
            for id in &article_ids {
                query = query.bind(*id);
            }
            report.comments = query.execute(&mut *tx).await.map_err(storage)?.rows_affected();

            let sql = format!("DELETE FROM articles WHERE id IN ({})", in_list);
            let mut query = sqlx::query(&sql);
            for id in &article_ids {
                query = query.bind(*id);
            }
            report.articles = query.execute(&mut *tx).await.map_err(storage)?.rows_affected();
        }

        sqlx::query(&format!("DELETE FROM {} WHERE id = ?", target.table()))
            .bind(target.id())
            .execute(&mut *tx)
            .await
            .map_err(storage)?;

        tx.commit().await.map_err(storage)?;
        report
    });

    tracing::info!(
        target_entity = %target,
        articles = report.articles,
        comments = report.comments,
        article_tags = report.article_tags,
        elapsed_ms = (Utc::now() - started).num_milliseconds(),
        "Cascade delete completed"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::*;

    #[tokio::test]
    async fn test_category_cascade_removes_exactly_its_articles() {
        let pool = migrated_pool().await;
        let user = seed_user(&pool, "solo").await;
        let doomed = seed_category(&pool, "Doomed").await;
        let kept = seed_category(&pool, "Kept").await;
        let rust = seed_tag(&pool, "Rust").await;
        let go = seed_tag(&pool, "Go").await;

        let mut doomed_articles = Vec::new();
        for _ in 0..3 {
            let article = seed_article(&pool, user, Some(doomed)).await;
            link_tag(&pool, article, rust).await;
            link_tag(&pool, article, go).await;
            seed_comment(&pool, article, user).await;
            seed_comment(&pool, article, user).await;
            doomed_articles.push(article);
        }
        let survivor = seed_article(&pool, user, Some(kept)).await;
        link_tag(&pool, survivor, rust).await;
        seed_comment(&pool, survivor, user).await;

        let report = cascade_delete(&pool, CascadeTarget::Category(doomed))
            .await
            .unwrap();

        assert_eq!(
            report,
            CascadeReport {
                articles: 3,
                comments: 6,
                article_tags: 6,
            }
        );
        assert_eq!(count_rows(&pool, "articles").await, 1);
        assert_eq!(count_rows(&pool, "comments").await, 1);
        assert_eq!(count_rows(&pool, "article_tags").await, 1);
        assert_eq!(count_rows(&pool, "categories").await, 1);
        // Tags themselves survive a category cascade.
        assert_eq!(count_rows(&pool, "tags").await, 2);

        let orphans: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM article_tags WHERE article_id NOT IN (SELECT id FROM articles)",
        )
        .fetch_one(sqlite(&pool))
        .await
        .unwrap();
        assert_eq!(orphans, 0);
    }

    #[tokio::test]
    async fn test_tag_cascade_removes_all_links_of_affected_articles() {
        let pool = migrated_pool().await;
        let user = seed_user(&pool, "solo").await;
        let doomed = seed_tag(&pool, "Doomed").await;
        let other = seed_tag(&pool, "Other").await;

        let affected = seed_article(&pool, user, None).await;
        link_tag(&pool, affected, doomed).await;
        link_tag(&pool, affected, other).await;
        seed_comment(&pool, affected, user).await;

        let unaffected = seed_article(&pool, user, None).await;
        link_tag(&pool, unaffected, other).await;

        let report = cascade_delete(&pool, CascadeTarget::Tag(doomed)).await.unwrap();

        assert_eq!(report.articles, 1);
        assert_eq!(report.comments, 1);
        assert_eq!(report.article_tags, 2);
        assert_eq!(count_rows(&pool, "tags").await, 1);
        assert_eq!(count_rows(&pool, "articles").await, 1);
        assert_eq!(count_rows(&pool, "article_tags").await, 1);
    }

    #[tokio::test]
    async fn test_tag_without_articles_removes_only_the_tag() {
        let pool = migrated_pool().await;
        let user = seed_user(&pool, "solo").await;
        let lonely = seed_tag(&pool, "Lonely").await;
        let used = seed_tag(&pool, "Used").await;
        let article = seed_article(&pool, user, None).await;
        link_tag(&pool, article, used).await;
        seed_comment(&pool, article, user).await;

        let report = cascade_delete(&pool, CascadeTarget::Tag(lonely)).await.unwrap();

        assert_eq!(report, CascadeReport::default());
        assert_eq!(count_rows(&pool, "tags").await, 1);
        assert_eq!(count_rows(&pool, "articles").await, 1);
        assert_eq!(count_rows(&pool, "comments").await, 1);
        assert_eq!(count_rows(&pool, "article_tags").await, 1);
    }

    #[tokio::test]
    async fn test_cascade_includes_soft_deleted_articles() {
        let pool = migrated_pool().await;
        let user = seed_user(&pool, "solo").await;
        let category = seed_category(&pool, "Old").await;
        let article = seed_article(&pool, user, Some(category)).await;
        seed_comment(&pool, article, user).await;
        soft_delete_article(&pool, article).await;

        let report = cascade_delete(&pool, CascadeTarget::Category(category))
            .await
            .unwrap();

        assert_eq!(report.articles, 1);
        assert_eq!(count_rows(&pool, "articles").await, 0);
        assert_eq!(count_rows(&pool, "comments").await, 0);
        assert_eq!(count_rows(&pool, "categories").await, 0);
    }

    #[tokio::test]
    async fn test_missing_target_is_not_found() {
        let pool = migrated_pool().await;

        let result = cascade_delete(&pool, CascadeTarget::Category(42)).await;
        assert!(matches!(
            result,
            Err(CascadeError::NotFound(CascadeTarget::Category(42)))
        ));

        let result = cascade_delete(&pool, CascadeTarget::Tag(7)).await;
        assert!(matches!(result, Err(CascadeError::NotFound(CascadeTarget::Tag(7)))));
    }

    #[tokio::test]
    async fn test_failure_in_last_step_rolls_everything_back() {
        let pool = migrated_pool().await;
        let user = seed_user(&pool, "solo").await;
        let category = seed_category(&pool, "Guarded").await;
        let tag = seed_tag(&pool, "T").await;
        let article = seed_article(&pool, user, Some(category)).await;
        link_tag(&pool, article, tag).await;
        seed_comment(&pool, article, user).await;

        // Make step 5 fail after steps 2-4 have already run.
        sqlx::query(
            "CREATE TRIGGER refuse_category_delete BEFORE DELETE ON categories \
             BEGIN SELECT RAISE(ABORT, 'refused'); END",
        )
        .execute(sqlite(&pool))
        .await
        .unwrap();

        let result = cascade_delete(&pool, CascadeTarget::Category(category)).await;
        assert!(matches!(result, Err(CascadeError::Storage { .. })));

        assert_eq!(count_rows(&pool, "categories").await, 1);
        assert_eq!(count_rows(&pool, "articles").await, 1);
        assert_eq!(count_rows(&pool, "comments").await, 1);
        assert_eq!(count_rows(&pool, "article_tags").await, 1);
    }
}
