//! Database layer
//!
//! Supports SQLite (default, single-file deployment) and MySQL. The driver is
//! selected from configuration and hidden behind the [`DatabasePool`] trait.
//!
//! # Usage
//!
//! ```ignore
//! use quill::config::DatabaseConfig;
//! use quill::db::{create_pool, migrations};
//!
//! let pool = create_pool(&DatabaseConfig::default()).await?;
//! migrations::run_migrations(&pool).await?;
//! pool.ping().await?;
//! ```

/// Run `$body` once per backend with `$pool` bound to the concrete pool.
///
/// Queries in this crate use `?` placeholders and column types that decode
/// identically on SQLite and MySQL, so the same body serves both drivers.
macro_rules! with_pool {
    ($db:expr, $pool:ident => $body:expr) => {
        match $db.backend() {
            $crate::db::Backend::Sqlite($pool) => $body,
            $crate::db::Backend::Mysql($pool) => $body,
        }
    };
}

pub mod cascade;
pub mod migrations;
pub mod pool;
pub mod repositories;

#[cfg(test)]
pub(crate) mod test_support;

pub use cascade::{cascade_delete, CascadeError, CascadeReport, CascadeTarget};
pub use pool::{
    create_pool, create_test_pool, Backend, DatabasePool, DynDatabasePool, InsertedId,
    MysqlDatabase, SqliteDatabase,
};

/// `?, ?, ?` for an `IN (...)` list of `n` bound values
pub(crate) fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}
