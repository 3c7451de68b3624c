//! Raw-SQL fixtures shared by the database and service tests.

use chrono::Utc;
use sqlx::SqlitePool;

use super::{create_test_pool, migrations::run_migrations, DynDatabasePool};

pub async fn migrated_pool() -> DynDatabasePool {
    let pool = create_test_pool().await.expect("Failed to create test pool");
    run_migrations(&pool).await.expect("Failed to run migrations");
    pool
}

pub fn sqlite(pool: &DynDatabasePool) -> &SqlitePool {
    pool.as_sqlite().expect("test pool is SQLite")
}

pub async fn seed_user(pool: &DynDatabasePool, username: &str) -> i64 {
    sqlx::query(
        "INSERT INTO users (username, email, password_hash, created_at, updated_at) \
         VALUES (?, ?, 'hash', ?, ?)",
    )
    .bind(username)
    .bind(format!("{}@example.com", username))
    .bind(Utc::now())
    .bind(Utc::now())
    .execute(sqlite(pool))
    .await
    .expect("seed user")
    .last_insert_rowid()
}

pub async fn seed_category(pool: &DynDatabasePool, name: &str) -> i64 {
    sqlx::query("INSERT INTO categories (name, slug, created_at, updated_at) VALUES (?, ?, ?, ?)")
        .bind(name)
        .bind(name.to_lowercase())
        .bind(Utc::now())
        .bind(Utc::now())
        .execute(sqlite(pool))
        .await
        .expect("seed category")
        .last_insert_rowid()
}

pub async fn seed_tag(pool: &DynDatabasePool, name: &str) -> i64 {
    sqlx::query("INSERT INTO tags (name, slug, created_at, updated_at) VALUES (?, ?, ?, ?)")
        .bind(name)
        .bind(name.to_lowercase())
        .bind(Utc::now())
        .bind(Utc::now())
        .execute(sqlite(pool))
        .await
        .expect("seed tag")
        .last_insert_rowid()
}

pub async fn seed_article(pool: &DynDatabasePool, author_id: i64, category_id: Option<i64>) -> i64 {
    sqlx::query(
        "INSERT INTO articles (title, content, author_id, category_id, created_at, updated_at) \
         VALUES ('title', 'content', ?, ?, ?, ?)",
    )
    .bind(author_id)
    .bind(category_id)
    .bind(Utc::now())
    .bind(Utc::now())
    .execute(sqlite(pool))
    .await
    .expect("seed article")
    .last_insert_rowid()
}

pub async fn link_tag(pool: &DynDatabasePool, article_id: i64, tag_id: i64) {
    sqlx::query("INSERT INTO article_tags (article_id, tag_id) VALUES (?, ?)")
        .bind(article_id)
        .bind(tag_id)
        .execute(sqlite(pool))
        .await
        .expect("link tag");
}

pub async fn seed_comment(pool: &DynDatabasePool, article_id: i64, user_id: i64) -> i64 {
    sqlx::query(
        "INSERT INTO comments (content, article_id, user_id, created_at, updated_at) \
         VALUES ('nice post', ?, ?, ?, ?)",
    )
    .bind(article_id)
    .bind(user_id)
    .bind(Utc::now())
    .bind(Utc::now())
    .execute(sqlite(pool))
    .await
    .expect("seed comment")
    .last_insert_rowid()
}

pub async fn soft_delete_article(pool: &DynDatabasePool, article_id: i64) {
    sqlx::query("UPDATE articles SET deleted_at = ? WHERE id = ?")
        .bind(Utc::now())
        .bind(article_id)
        .execute(sqlite(pool))
        .await
        .expect("soft delete article");
}

pub async fn count_rows(pool: &DynDatabasePool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(sqlite(pool))
        .await
        .expect("count rows")
}
