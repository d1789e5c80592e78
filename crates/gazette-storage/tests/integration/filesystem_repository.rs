//! Integration tests for the repository over the local filesystem backend.

use std::sync::Arc;

use gazette_content::EntryPayload;
use gazette_core::{EntryKind, Error};
use gazette_storage::{ContentRepository, LocalFilesystemBackend};
use serde_json::{Value, json};
use tempfile::TempDir;

fn setup() -> (TempDir, ContentRepository) {
    let dir = TempDir::new().unwrap();
    let backend = LocalFilesystemBackend::new(dir.path());
    (dir, ContentRepository::new(Arc::new(backend)))
}

fn payload(value: Value) -> EntryPayload {
    serde_json::from_value(value).unwrap()
}

#[tokio::test]
async fn test_create_writes_markdown_file() {
    let (dir, repo) = setup();

    let entry = repo
        .create_entry(
            EntryKind::Article,
            payload(json!({
                "title": "Hi There",
                "slug": "",
                "body": "Hello **world**",
                "tags": "news, local, news",
            })),
        )
        .await
        .expect("create should succeed");

    assert_eq!(entry.slug, "hi-there");
    let text = std::fs::read_to_string(dir.path().join("articles/hi-there.md")).unwrap();
    assert!(text.starts_with("---\ntitle: \"Hi There\"\n"));
    assert!(text.contains("tags:\n  - \"news\"\n  - \"local\"\n"));
    assert!(text.ends_with("---\n\nHello **world**"));
}

#[tokio::test]
async fn test_rename_leaves_exactly_one_file() {
    let (dir, repo) = setup();
    repo.create_entry(
        EntryKind::Event,
        payload(json!({"title": "Spring Fair", "body": "x", "startsAt": "2025-04-01"})),
    )
    .await
    .unwrap();

    repo.update_entry(
        EntryKind::Event,
        "spring-fair",
        payload(json!({"slug": "spring-fair-2025"})),
    )
    .await
    .unwrap();

    let events = dir.path().join("events");
    assert!(!events.join("spring-fair.md").exists());
    assert!(events.join("spring-fair-2025.md").exists());
    assert!(matches!(
        repo.require_entry(EntryKind::Event, "spring-fair").await,
        Err(Error::NotFound { .. })
    ));
    let moved = repo
        .require_entry(EntryKind::Event, "spring-fair-2025")
        .await
        .unwrap();
    assert_eq!(moved.meta.starts_at.as_deref(), Some("2025-04-01"));
}

#[tokio::test]
async fn test_hand_edited_file_is_listed_and_preserved() {
    let (dir, repo) = setup();
    let articles = dir.path().join("articles");
    std::fs::create_dir_all(&articles).unwrap();
    std::fs::write(
        articles.join("legacy.md"),
        "---\r\ntitle: Legacy\r\nstatus: draft\r\nseo:\r\n  noindex: true\r\n---\r\n\r\nOld body\r\n",
    )
    .unwrap();

    let all = repo.list_entries(EntryKind::Article).await.unwrap();
    assert_eq!(all.len(), 1);
    assert!(!all[0].meta.published);
    assert!(repo.list_published(EntryKind::Article).await.unwrap().is_empty());

    repo.set_published(EntryKind::Article, "legacy", Some(true))
        .await
        .unwrap();

    let text = std::fs::read_to_string(articles.join("legacy.md")).unwrap();
    assert!(text.contains("published: true"));
    assert!(text.contains("noindex: true"));
    assert_eq!(repo.list_published(EntryKind::Article).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_check_flags_broken_files() {
    let (dir, repo) = setup();
    repo.create_entry(EntryKind::Article, payload(json!({"title": "Fine", "body": "x"})))
        .await
        .unwrap();
    std::fs::write(dir.path().join("articles/broken.md"), "---\ntitle: [unclosed\n---\n").unwrap();

    let issues = repo.check(EntryKind::Article).await.unwrap();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].slug, "broken");
    assert_eq!(repo.list_entries(EntryKind::Article).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_delete_missing_is_not_found() {
    let (_dir, repo) = setup();
    let err = repo.remove_entry(EntryKind::Event, "ghost").await.unwrap_err();
    assert_eq!(err.to_string(), "Event not found: ghost");
}

#[tokio::test]
async fn test_non_utf8_file_does_not_break_reads() {
    let (dir, repo) = setup();
    repo.create_entry(EntryKind::Article, payload(json!({"title": "Good", "body": "x"})))
        .await
        .unwrap();
    std::fs::write(dir.path().join("articles/bad.md"), b"\xff\xfe").unwrap();

    let entries = repo.list_entries(EntryKind::Article).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].slug, "good");

    let err = repo.get_entry(EntryKind::Article, "bad").await.unwrap_err();
    assert!(matches!(err, Error::MalformedContent { .. }));
    assert!(!err.is_backend_failure());

    let issues = repo.check(EntryKind::Article).await.unwrap();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].slug, "bad");
    assert!(issues[0].error.contains("not valid UTF-8"));

    let err = repo
        .create_entry(EntryKind::Article, payload(json!({"title": "Bad", "body": "x"})))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict { .. }));
}
