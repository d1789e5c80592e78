//! Integration tests for the public read routes.

use axum::http::{Method, StatusCode};
use gazette_core::EntryKind;
use serde_json::json;

use crate::common::TestApp;

async fn seeded() -> TestApp {
    let app = TestApp::new();
    app.backend
        .insert_raw(
            EntryKind::Article,
            "older",
            "---\ntitle: \"Older\"\ndate: \"2024-01-01\"\n---\n\nOld",
        )
        .await;
    app.backend
        .insert_raw(
            EntryKind::Article,
            "newer",
            "---\ntitle: \"Newer\"\ndate: \"2025-01-01\"\ntags:\n  - \"news\"\n---\n\nNew",
        )
        .await;
    app.backend
        .insert_raw(
            EntryKind::Article,
            "hidden",
            "---\ntitle: \"Hidden\"\ndate: \"2026-01-01\"\npublished: false\n---\n\nDraft",
        )
        .await;
    app
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();
    let (status, body) = app.public("/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok", "backend": "memory"}));
}

#[tokio::test]
async fn test_public_list_is_published_newest_first() {
    let app = seeded().await;

    let (status, body) = app.public("/api/content/articles").await;

    assert_eq!(status, StatusCode::OK);
    let slugs: Vec<_> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["slug"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(slugs, vec!["newer", "older"]);
    assert_eq!(body[0]["tags"], json!(["news"]));
    assert_eq!(body[0]["type"], "article");
}

#[tokio::test]
async fn test_public_get_hides_drafts() {
    let app = seeded().await;

    let (status, body) = app.public("/api/content/articles/newer").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Newer");
    assert_eq!(body["body"], "New");

    let (status, body) = app.public("/api/content/articles/hidden").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Article not found"}));
}

#[tokio::test]
async fn test_admin_list_includes_drafts() {
    let app = seeded().await;
    let (_, body) = app.admin(Method::GET, "/api/admin/articles", None).await;
    assert_eq!(body.as_array().unwrap().len(), 3);
    assert_eq!(body[0]["slug"], "hidden");
    assert_eq!(body[0]["published"], false);
}

#[tokio::test]
async fn test_public_unknown_collection() {
    let app = TestApp::new();
    let (status, body) = app.public("/api/content/recipes").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Unknown content type"}));
}

#[tokio::test]
async fn test_public_routes_need_no_token() {
    let app = TestApp::new();
    let (status, body) = app.public("/api/content/events").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}
