//! User repository
//!
//! Database operations for the blog's user account.

use crate::db::{Backend, DynDatabasePool, InsertedId};
use crate::models::User;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;

const USER_COLUMNS: &str = "id, username, email, password_hash, avatar_url, bio, \
    social_links, sponsor_links, friend_links, created_at, updated_at";

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert `user` only if the users table is empty.
    ///
    /// Returns `None` when a user already exists. The check and the insert are
    /// a single statement, so two concurrent registrations cannot both win.
    async fn create_if_none(&self, user: &User) -> Result<Option<User>>;

    async fn get_by_id(&self, id: i64) -> Result<Option<User>>;

    async fn get_by_username(&self, username: &str) -> Result<Option<User>>;

    /// The account with the lowest id, i.e. the blog's author
    async fn get_first(&self) -> Result<Option<User>>;

    async fn count(&self) -> Result<i64>;

    /// Persist the profile fields of `user`
    async fn update_profile(&self, user: &User) -> Result<User>;
}

/// SQLx-based user repository, for SQLite and MySQL
pub struct SqlxUserRepository {
    pool: DynDatabasePool,
}

impl SqlxUserRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn UserRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create_if_none(&self, user: &User) -> Result<Option<User>> {
        // MySQL needs a FROM clause before WHERE in a bare SELECT.
        let sql = match self.pool.backend() {
            Backend::Sqlite(_) => {
                "INSERT INTO users (username, email, password_hash, avatar_url, bio, \
                 social_links, sponsor_links, friend_links, created_at, updated_at) \
                 SELECT ?, ?, ?, ?, ?, ?, ?, ?, ?, ? \
                 WHERE NOT EXISTS (SELECT 1 FROM users)"
            }
            Backend::Mysql(_) => {
                "INSERT INTO users (username, email, password_hash, avatar_url, bio, \
                 social_links, sponsor_links, friend_links, created_at, updated_at) \
                 SELECT ?, ?, ?, ?, ?, ?, ?, ?, ?, ? FROM DUAL \
                 WHERE NOT EXISTS (SELECT 1 FROM users)"
            }
        };

        let inserted = with_pool!(self.pool, db => {
            let result = sqlx::query(sql)
                .bind(&user.username)
                .bind(&user.email)
                .bind(&user.password_hash)
                .bind(&user.avatar_url)
                .bind(&user.bio)
                .bind(&user.social_links)
                .bind(&user.sponsor_links)
                .bind(&user.friend_links)
                .bind(user.created_at)
                .bind(user.updated_at)
                .execute(db)
                .await
                .context("Failed to create user")?;
            (result.rows_affected() > 0).then(|| result.inserted_id())
        });

        Ok(inserted.map(|id| User {
            id,
            ..user.clone()
        }))
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);
        with_pool!(self.pool, db => {
            sqlx::query_as::<_, User>(&sql)
                .bind(id)
                .fetch_optional(db)
                .await
                .context("Failed to get user by ID")
        })
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE username = ?", USER_COLUMNS);
        with_pool!(self.pool, db => {
            sqlx::query_as::<_, User>(&sql)
                .bind(username)
                .fetch_optional(db)
                .await
                .context("Failed to get user by username")
        })
    }

    async fn get_first(&self) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users ORDER BY id LIMIT 1", USER_COLUMNS);
        with_pool!(self.pool, db => {
            sqlx::query_as::<_, User>(&sql)
                .fetch_optional(db)
                .await
                .context("Failed to get first user")
        })
    }

    async fn count(&self) -> Result<i64> {
        with_pool!(self.pool, db => {
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
                .fetch_one(db)
                .await
                .context("Failed to count users")
        })
    }

    async fn update_profile(&self, user: &User) -> Result<User> {
        with_pool!(self.pool, db => {
            sqlx::query(
                "UPDATE users SET avatar_url = ?, bio = ?, social_links = ?, \
                 sponsor_links = ?, friend_links = ?, updated_at = ? WHERE id = ?",
            )
            .bind(&user.avatar_url)
            .bind(&user.bio)
            .bind(&user.social_links)
            .bind(&user.sponsor_links)
            .bind(&user.friend_links)
            .bind(user.updated_at)
            .bind(user.id)
            .execute(db)
            .await
            .context("Failed to update user profile")?;
        });

        Ok(user.clone())
    }
}
