//! Article service
//!
//! Articles are owned by their author; update and delete go through
//! [`ensure_owner`]. Reads return [`ArticleDetail`] with the author, category
//! and tags resolved.

use anyhow::Context;
use chrono::Utc;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::db::repositories::{ArticleRepository, CategoryRepository, Counter, UserRepository};
use crate::models::{
    Article, ArticleDetail, ArticleFilter, Category, CreateArticleInput, ListParams, PagedResult,
    Tag, UpdateArticleInput, UserSummary,
};
use crate::services::access::{ensure_owner, NotOwner};
use crate::services::tag::{tag_drafts, TagService, TagServiceError};

#[derive(Debug, thiserror::Error)]
pub enum ArticleServiceError {
    #[error("Article not found: {0}")]
    NotFound(i64),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Forbidden: {0}")]
    Forbidden(#[from] NotOwner),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl From<TagServiceError> for ArticleServiceError {
    fn from(err: TagServiceError) -> Self {
        match err {
            TagServiceError::ValidationError(msg) => Self::ValidationError(msg),
            TagServiceError::InternalError(e) => Self::InternalError(e),
            other => Self::InternalError(anyhow::anyhow!(other.to_string())),
        }
    }
}

pub struct ArticleService {
    articles: Arc<dyn ArticleRepository>,
    categories: Arc<dyn CategoryRepository>,
    users: Arc<dyn UserRepository>,
    tags: Arc<TagService>,
}

impl ArticleService {
    pub fn new(
        articles: Arc<dyn ArticleRepository>,
        categories: Arc<dyn CategoryRepository>,
        users: Arc<dyn UserRepository>,
        tags: Arc<TagService>,
    ) -> Self {
        Self {
            articles,
            categories,
            users,
            tags,
        }
    }

    pub async fn create(
        &self,
        author_id: i64,
        input: CreateArticleInput,
    ) -> Result<ArticleDetail, ArticleServiceError> {
        let title = required("Title", &input.title)?.to_string();
        required("Content", &input.content)?;
        let content = input.content;
        if let Some(category_id) = input.category_id {
            self.ensure_category(category_id).await?;
        }

        let tags = tag_drafts(&input.tags)?;

        let article = Article::new(title, content, author_id, input.category_id);
        let created = self
            .articles
            .create(&article, &tags)
            .await
            .context("Failed to create article")?;

        tracing::info!(article_id = created.id, author_id, "Article created");
        self.detail(created).await
    }

    /// Newest first, filtered and paginated
    pub async fn list(
        &self,
        filter: &ArticleFilter,
        params: &ListParams,
    ) -> Result<PagedResult<ArticleDetail>, ArticleServiceError> {
        let (articles, total) = self
            .articles
            .list(filter, params)
            .await
            .context("Failed to list articles")?;

        let details = self.details(articles).await?;
        Ok(PagedResult::new(details, total, params))
    }

    pub async fn get(&self, id: i64) -> Result<ArticleDetail, ArticleServiceError> {
        let article = self.find(id).await?;
        self.detail(article).await
    }

    pub async fn update(
        &self,
        subject_id: i64,
        id: i64,
        input: UpdateArticleInput,
    ) -> Result<ArticleDetail, ArticleServiceError> {
        let mut article = self.find(id).await?;
        ensure_owner(subject_id, article.author_id)?;

        if let Some(title) = input.title.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            article.title = title.to_string();
        }
        if let Some(content) = input.content.filter(|c| !c.trim().is_empty()) {
            article.content = content;
        }
        if let Some(category_id) = input.category_id {
            self.ensure_category(category_id).await?;
            article.category_id = Some(category_id);
        }

        let tags = input.tags.as_deref().map(tag_drafts).transpose()?;

        article.updated_at = Utc::now();
        let updated = self
            .articles
            .update(&article, tags.as_deref())
            .await
            .context("Failed to update article")?;

        self.detail(updated).await
    }

    /// Soft delete
    pub async fn delete(&self, subject_id: i64, id: i64) -> Result<(), ArticleServiceError> {
        let article = self.find(id).await?;
        ensure_owner(subject_id, article.author_id)?;

        self.articles
            .soft_delete(id)
            .await
            .context("Failed to delete article")?;
        tracing::info!(article_id = id, "Article deleted");
        Ok(())
    }

    /// Soft-delete several articles at once. Every id must exist and belong
    /// to the subject, otherwise nothing is deleted.
    pub async fn batch_delete(&self, subject_id: i64, ids: &[i64]) -> Result<u64, ArticleServiceError> {
        let ids: Vec<i64> = ids.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
        if ids.is_empty() {
            return Err(ArticleServiceError::ValidationError(
                "No article ids given".to_string(),
            ));
        }

        for &id in &ids {
            let article = self.find(id).await?;
            ensure_owner(subject_id, article.author_id)?;
        }

        let deleted = self
            .articles
            .soft_delete_many(&ids)
            .await
            .context("Failed to delete articles")?;
        tracing::info!(count = deleted, "Articles batch deleted");
        Ok(deleted)
    }

    /// Returns the new like count
    pub async fn like(&self, id: i64) -> Result<i64, ArticleServiceError> {
        self.bump(id, Counter::Likes).await
    }

    /// Returns the new view count
    pub async fn view(&self, id: i64) -> Result<i64, ArticleServiceError> {
        self.bump(id, Counter::Views).await
    }

    async fn bump(&self, id: i64, counter: Counter) -> Result<i64, ArticleServiceError> {
        self.articles
            .increment(id, counter)
            .await
            .context("Failed to update counter")?
            .ok_or(ArticleServiceError::NotFound(id))
    }

    async fn find(&self, id: i64) -> Result<Article, ArticleServiceError> {
        self.articles
            .get_by_id(id)
            .await
            .context("Failed to get article")?
            .ok_or(ArticleServiceError::NotFound(id))
    }

    async fn ensure_category(&self, category_id: i64) -> Result<Category, ArticleServiceError> {
        self.categories
            .get_by_id(category_id)
            .await
            .context("Failed to get category")?
            .ok_or_else(|| {
                ArticleServiceError::ValidationError(format!("Category {} does not exist", category_id))
            })
    }

    async fn detail(&self, article: Article) -> Result<ArticleDetail, ArticleServiceError> {
        let mut details = self.details(vec![article]).await?;
        details
            .pop()
            .ok_or_else(|| anyhow::anyhow!("article detail missing").into())
    }

    async fn details(&self, articles: Vec<Article>) -> Result<Vec<ArticleDetail>, ArticleServiceError> {
        if articles.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = articles.iter().map(|a| a.id).collect();
        let mut tags: HashMap<i64, Vec<Tag>> = HashMap::new();
        for (article_id, tag) in self.tags.tags_of_articles(&ids).await? {
            tags.entry(article_id).or_default().push(tag);
        }

        let mut categories: HashMap<i64, Category> = HashMap::new();
        for id in articles.iter().filter_map(|a| a.category_id).collect::<BTreeSet<_>>() {
            if let Some(category) = self
                .categories
                .get_by_id(id)
                .await
                .context("Failed to get category")?
            {
                categories.insert(id, category);
            }
        }

        let mut authors: HashMap<i64, UserSummary> = HashMap::new();
        for id in articles.iter().map(|a| a.author_id).collect::<BTreeSet<_>>() {
            if let Some(user) = self.users.get_by_id(id).await.context("Failed to get author")? {
                authors.insert(id, user.summary());
            }
        }

        Ok(articles
            .into_iter()
            .map(|article| ArticleDetail {
                author: authors.get(&article.author_id).cloned(),
                category: article.category_id.and_then(|id| categories.get(&id).cloned()),
                tags: tags.remove(&article.id).unwrap_or_default(),
                article,
            })
            .collect())
    }
}

/// Returns the trimmed value, failing if nothing is left
fn required<'a>(field: &str, value: &'a str) -> Result<&'a str, ArticleServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ArticleServiceError::ValidationError(format!(
            "{} cannot be empty",
            field
        )));
    }
    Ok(trimmed)
}
