//! Quill - a single-author blogging backend
//!
//! Articles, comments, categories and tags behind a JSON API, stored in
//! SQLite or MySQL.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
