//! End-to-end tests through the full router

use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use serde_json::{json, Value};
use tempfile::TempDir;

use super::{build_router, AppState};
use crate::config::Config;
use crate::db::test_support::*;
use crate::db::DynDatabasePool;
use crate::services::TokenService;

const SECRET: &str = "integration-secret";

struct TestApp {
    server: TestServer,
    pool: DynDatabasePool,
    config: Config,
    _upload_dir: TempDir,
}

impl TestApp {
    async fn spawn() -> Self {
        let pool = migrated_pool().await;
        let upload_dir = tempfile::tempdir().unwrap();

        let mut config = Config::default();
        config.auth.secret = SECRET.to_string();
        config.upload.path = upload_dir.path().join("uploads");
        config.upload.max_file_size = 1024;

        let state = AppState::new(pool.clone(), &config);
        let router = build_router(state, &config.server.cors_origin).unwrap();

        Self {
            server: TestServer::new(router).unwrap(),
            pool,
            config,
            _upload_dir: upload_dir,
        }
    }

    /// Register the author and log in, returning `(user_id, token)`
    async fn author(&self) -> (i64, String) {
        self.server
            .post("/api/v1/auth/register")
            .json(&json!({
                "username": "solo",
                "email": "solo@example.com",
                "password": "password123"
            }))
            .await
            .assert_status(StatusCode::CREATED);

        let body: Value = self
            .server
            .post("/api/v1/auth/login")
            .json(&json!({ "username": "solo", "password": "password123" }))
            .await
            .json();

        (
            body["user"]["id"].as_i64().unwrap(),
            body["token"].as_str().unwrap().to_string(),
        )
    }

    /// A second user, inserted directly since registration is closed
    async fn stranger(&self) -> (i64, String) {
        let id = seed_user(&self.pool, "stranger").await;
        let token = TokenService::new(SECRET, chrono::Duration::hours(1))
            .issue(id)
            .unwrap()
            .token;
        (id, token)
    }

    async fn create_article(&self, token: &str, body: Value) -> Value {
        let response = self
            .server
            .post("/api/v1/articles")
            .authorization_bearer(token)
            .json(&body)
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json()
    }
}

fn error_code(body: &Value) -> &str {
    body["error"]["code"].as_str().unwrap_or_default()
}

#[tokio::test]
async fn test_ping() {
    let app = TestApp::spawn().await;
    let body: Value = app.server.get("/ping").await.json();
    assert_eq!(body, json!({ "message": "pong" }));
}

#[tokio::test]
async fn test_registration_closes_after_first_user() {
    let app = TestApp::spawn().await;

    let status: Value = app.server.get("/api/v1/registration-status").await.json();
    assert_eq!(status["registration_allowed"], true);

    app.author().await;

    let response = app
        .server
        .post("/api/v1/auth/register")
        .json(&json!({
            "username": "intruder",
            "email": "intruder@example.com",
            "password": "password123"
        }))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);
    assert_eq!(error_code(&response.json()), "FORBIDDEN");

    let status: Value = app.server.get("/api/v1/registration-status").await.json();
    assert_eq!(status["registration_allowed"], false);
    assert_eq!(status["user_count"], 1);

    let author: Value = app.server.get("/api/v1/author-profile").await.json();
    assert_eq!(author["username"], "solo");
    assert!(author.get("password_hash").is_none());
}

#[tokio::test]
async fn test_bad_credentials_are_unauthorized() {
    let app = TestApp::spawn().await;
    app.author().await;

    let response = app
        .server
        .post("/api/v1/auth/login")
        .json(&json!({ "username": "solo", "password": "wrong" }))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&response.json()), "UNAUTHORIZED");
}

#[tokio::test]
async fn test_protected_routes_require_valid_token() {
    let app = TestApp::spawn().await;
    let (user_id, _) = app.author().await;
    let body = json!({ "title": "t", "content": "c" });

    let missing = app.server.post("/api/v1/articles").json(&body).await;
    missing.assert_status(StatusCode::UNAUTHORIZED);

    let expired = TokenService::new(SECRET, chrono::Duration::hours(-1))
        .issue(user_id)
        .unwrap();
    let response = app
        .server
        .post("/api/v1/articles")
        .authorization_bearer(&expired.token)
        .json(&body)
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    let error: Value = response.json();
    assert_eq!(error["error"]["message"], "Token expired");

    let forged = TokenService::new("someone-else", chrono::Duration::hours(1))
        .issue(user_id)
        .unwrap();
    app.server
        .get("/api/v1/user/profile")
        .authorization_bearer(&forged.token)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    app.server
        .get("/api/v1/user/profile")
        .authorization_bearer("garbage")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    assert_eq!(count_rows(&app.pool, "articles").await, 0);
}

#[tokio::test]
async fn test_profile_roundtrip() {
    let app = TestApp::spawn().await;
    let (_, token) = app.author().await;

    let updated: Value = app
        .server
        .put("/api/v1/user/profile")
        .authorization_bearer(&token)
        .json(&json!({ "avatar_url": "/uploads/me.png", "bio": "hello" }))
        .await
        .json();
    assert_eq!(updated["bio"], "hello");

    let profile: Value = app
        .server
        .get("/api/v1/user/profile")
        .authorization_bearer(&token)
        .await
        .json();
    assert_eq!(profile["avatar_url"], "/uploads/me.png");
    assert_eq!(profile["social_links"], "");
}

#[tokio::test]
async fn test_article_lifecycle() {
    let app = TestApp::spawn().await;
    let (_, token) = app.author().await;

    let created = app
        .create_article(
            &token,
            json!({ "title": "Hello", "content": "First post", "tags": ["intro", "meta"] }),
        )
        .await;
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["author"]["username"], "solo");
    assert_eq!(created["tags"].as_array().unwrap().len(), 2);

    app.create_article(&token, json!({ "title": "Other", "content": "Unrelated" }))
        .await;

    let list: Value = app
        .server
        .get("/api/v1/articles")
        .add_query_param("search", "First")
        .add_query_param("category_id", "")
        .await
        .json();
    assert_eq!(list["total"], 1);
    assert_eq!(list["articles"][0]["id"], id);
    assert_eq!(list["total_pages"], 1);

    let likes: Value = app
        .server
        .post(&format!("/api/v1/articles/{}/like", id))
        .authorization_bearer(&token)
        .await
        .json();
    assert_eq!(likes["likes"], 1);

    let views: Value = app
        .server
        .post(&format!("/api/v1/articles/{}/view", id))
        .await
        .json();
    assert_eq!(views["views"], 1);

    let updated: Value = app
        .server
        .put(&format!("/api/v1/articles/{}", id))
        .authorization_bearer(&token)
        .json(&json!({ "title": "Hello again", "tags": [] }))
        .await
        .json();
    assert_eq!(updated["title"], "Hello again");
    assert!(updated["tags"].as_array().unwrap().is_empty());

    app.server
        .delete(&format!("/api/v1/articles/{}", id))
        .authorization_bearer(&token)
        .await
        .assert_status_ok();

    let response = app.server.get(&format!("/api/v1/articles/{}", id)).await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(error_code(&response.json()), "NOT_FOUND");
}

#[tokio::test]
async fn test_comments_flow() {
    let app = TestApp::spawn().await;
    let (_, token) = app.author().await;
    let article = app
        .create_article(&token, json!({ "title": "Talk", "content": "Discuss" }))
        .await;
    let id = article["id"].as_i64().unwrap();

    let comment: Value = app
        .server
        .post(&format!("/api/v1/articles/{}/comments", id))
        .authorization_bearer(&token)
        .json(&json!({ "content": "Nice" }))
        .await
        .json();
    let comment_id = comment["id"].as_i64().unwrap();

    let edited: Value = app
        .server
        .put(&format!("/api/v1/comments/{}", comment_id))
        .authorization_bearer(&token)
        .json(&json!({ "content": "Very nice" }))
        .await
        .json();
    assert_eq!(edited["content"], "Very nice");

    let comments: Value = app
        .server
        .get(&format!("/api/v1/articles/{}/comments", id))
        .await
        .json();
    assert_eq!(comments[0]["content"], "Very nice");
    assert_eq!(comments[0]["user"]["username"], "solo");

    app.server
        .get("/api/v1/articles/999/comments")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_only_owner_can_modify() {
    let app = TestApp::spawn().await;
    let (_, token) = app.author().await;
    let (_, stranger_token) = app.stranger().await;

    let article = app
        .create_article(&token, json!({ "title": "Mine", "content": "Hands off" }))
        .await;
    let id = article["id"].as_i64().unwrap();

    let comment: Value = app
        .server
        .post(&format!("/api/v1/articles/{}/comments", id))
        .authorization_bearer(&token)
        .json(&json!({ "content": "my comment" }))
        .await
        .json();
    let comment_id = comment["id"].as_i64().unwrap();

    let response = app
        .server
        .put(&format!("/api/v1/articles/{}", id))
        .authorization_bearer(&stranger_token)
        .json(&json!({ "title": "Stolen" }))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);
    assert_eq!(error_code(&response.json()), "FORBIDDEN");

    app.server
        .delete(&format!("/api/v1/articles/{}", id))
        .authorization_bearer(&stranger_token)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    app.server
        .delete(&format!("/api/v1/comments/{}", comment_id))
        .authorization_bearer(&stranger_token)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    app.server
        .post("/api/v1/articles/batch-delete")
        .authorization_bearer(&stranger_token)
        .json(&json!({ "ids": [id] }))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let still_there: Value = app.server.get(&format!("/api/v1/articles/{}", id)).await.json();
    assert_eq!(still_there["title"], "Mine");
}

#[tokio::test]
async fn test_batch_delete() {
    let app = TestApp::spawn().await;
    let (_, token) = app.author().await;
    let a = app.create_article(&token, json!({ "title": "a", "content": "a" })).await;
    let b = app.create_article(&token, json!({ "title": "b", "content": "b" })).await;

    let response = app
        .server
        .post("/api/v1/articles/batch-delete")
        .authorization_bearer(&token)
        .json(&json!({ "ids": [a["id"], b["id"], 4242] }))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);

    let body: Value = app
        .server
        .post("/api/v1/articles/batch-delete")
        .authorization_bearer(&token)
        .json(&json!({ "ids": [a["id"], b["id"]] }))
        .await
        .json();
    assert_eq!(body["deleted"], 2);

    let list: Value = app.server.get("/api/v1/articles").await.json();
    assert_eq!(list["total"], 0);
}

#[tokio::test]
async fn test_category_delete_cascades_over_http() {
    let app = TestApp::spawn().await;
    let (_, token) = app.author().await;

    let category: Value = app
        .server
        .post("/api/v1/categories")
        .authorization_bearer(&token)
        .json(&json!({ "name": "Drafts" }))
        .await
        .json();
    let category_id = category["id"].as_i64().unwrap();
    assert_eq!(category["slug"], "drafts");

    let doomed = app
        .create_article(
            &token,
            json!({ "title": "x", "content": "x", "category_id": category_id, "tags": ["keep"] }),
        )
        .await;
    let survivor = app
        .create_article(&token, json!({ "title": "y", "content": "y", "tags": ["keep"] }))
        .await;
    app.server
        .post(&format!("/api/v1/articles/{}/comments", doomed["id"]))
        .authorization_bearer(&token)
        .json(&json!({ "content": "bye" }))
        .await
        .assert_status(StatusCode::CREATED);

    let categories: Value = app.server.get("/api/v1/categories").await.json();
    assert_eq!(categories[0]["article_count"], 1);

    let report: Value = app
        .server
        .delete(&format!("/api/v1/categories/{}", category_id))
        .authorization_bearer(&token)
        .await
        .json();
    assert_eq!(
        report["removed"],
        json!({ "articles": 1, "comments": 1, "article_tags": 1 })
    );

    app.server
        .get(&format!("/api/v1/articles/{}", doomed["id"]))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    app.server
        .get(&format!("/api/v1/articles/{}", survivor["id"]))
        .await
        .assert_status_ok();

    let tags: Value = app.server.get("/api/v1/tags").await.json();
    assert_eq!(tags[0]["name"], "keep");
    assert_eq!(tags[0]["article_count"], 1);

    app.server
        .delete(&format!("/api/v1/categories/{}", category_id))
        .authorization_bearer(&token)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_tag_crud_and_duplicates() {
    let app = TestApp::spawn().await;
    let (_, token) = app.author().await;

    let tag: Value = app
        .server
        .post("/api/v1/tags")
        .authorization_bearer(&token)
        .json(&json!({ "name": "Rust" }))
        .await
        .json();

    let duplicate = app
        .server
        .post("/api/v1/tags")
        .authorization_bearer(&token)
        .json(&json!({ "name": "Rust" }))
        .await;
    duplicate.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&duplicate.json()), "VALIDATION_ERROR");

    let renamed: Value = app
        .server
        .put(&format!("/api/v1/tags/{}", tag["id"]))
        .authorization_bearer(&token)
        .json(&json!({ "name": "Rust Lang" }))
        .await
        .json();
    assert_eq!(renamed["slug"], "rust-lang");

    let report: Value = app
        .server
        .delete(&format!("/api/v1/tags/{}", tag["id"]))
        .authorization_bearer(&token)
        .await
        .json();
    assert_eq!(report["removed"]["articles"], 0);
}

#[tokio::test]
async fn test_tag_delete_cascades_over_http() {
    let app = TestApp::spawn().await;
    let (_, token) = app.author().await;

    let tagged = app
        .create_article(&token, json!({ "title": "x", "content": "x", "tags": ["Zig", "C"] }))
        .await;
    let untagged = app
        .create_article(&token, json!({ "title": "y", "content": "y" }))
        .await;

    let tags: Value = app.server.get("/api/v1/tags").await.json();
    let zig = tags
        .as_array()
        .unwrap()
        .iter()
        .find(|t| t["name"] == "Zig")
        .unwrap()["id"]
        .clone();

    let report: Value = app
        .server
        .delete(&format!("/api/v1/tags/{}", zig))
        .authorization_bearer(&token)
        .await
        .json();
    assert_eq!(
        report["removed"],
        json!({ "articles": 1, "comments": 0, "article_tags": 2 })
    );

    app.server
        .get(&format!("/api/v1/articles/{}", tagged["id"]))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    app.server
        .get(&format!("/api/v1/articles/{}", untagged["id"]))
        .await
        .assert_status_ok();

    let tags: Value = app.server.get("/api/v1/tags").await.json();
    assert_eq!(tags.as_array().unwrap().len(), 1);
    assert_eq!(tags[0]["name"], "C");
    assert_eq!(tags[0]["article_count"], 0);
}

#[tokio::test]
async fn test_malformed_input_is_validation_error() {
    let app = TestApp::spawn().await;
    let (_, token) = app.author().await;

    let response = app
        .server
        .post("/api/v1/articles")
        .authorization_bearer(&token)
        .content_type("application/json")
        .bytes("{not json".into())
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&response.json()), "VALIDATION_ERROR");

    let response = app.server.get("/api/v1/articles/not-a-number").await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&response.json()), "VALIDATION_ERROR");

    let response = app
        .server
        .post("/api/v1/articles")
        .authorization_bearer(&token)
        .json(&json!({ "title": "  ", "content": "body" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_accepts_images() {
    let app = TestApp::spawn().await;
    let (_, token) = app.author().await;
    let png = vec![0x89, b'P', b'N', b'G', 1, 2, 3];

    let form = MultipartForm::new().add_part(
        "file",
        Part::bytes(png.clone()).file_name("Photo.PNG").mime_type("image/png"),
    );
    let response = app
        .server
        .post("/api/v1/upload")
        .authorization_bearer(&token)
        .multipart(form)
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    let filename = body["filename"].as_str().unwrap();
    assert!(filename.ends_with(".png"));
    assert_eq!(body["size"], png.len());
    assert_eq!(body["url"], format!("/uploads/{}", filename));

    let served = app.server.get(body["url"].as_str().unwrap()).await;
    served.assert_status_ok();
    assert_eq!(served.as_bytes().to_vec(), png);
}

#[tokio::test]
async fn test_upload_rejections_write_nothing() {
    let app = TestApp::spawn().await;
    let (_, token) = app.author().await;

    let wrong_type = MultipartForm::new().add_part(
        "file",
        Part::bytes(b"#!/bin/sh".to_vec()).file_name("evil.sh"),
    );
    let response = app
        .server
        .post("/api/v1/upload")
        .authorization_bearer(&token)
        .multipart(wrong_type)
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&response.json()), "VALIDATION_ERROR");

    let too_big = MultipartForm::new().add_part(
        "file",
        Part::bytes(vec![0u8; 2048]).file_name("big.jpg"),
    );
    app.server
        .post("/api/v1/upload")
        .authorization_bearer(&token)
        .multipart(too_big)
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let unauthenticated = MultipartForm::new().add_part(
        "file",
        Part::bytes(vec![1u8]).file_name("a.gif"),
    );
    app.server
        .post("/api/v1/upload")
        .multipart(unauthenticated)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    assert!(super::upload::stored_files(&app.config.upload).is_empty());
}
