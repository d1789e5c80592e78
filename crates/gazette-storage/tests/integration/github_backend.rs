//! Integration tests for the GitHub backend against the fake contents API.

use std::sync::Arc;
use std::time::Duration;

use gazette_content::EntryPayload;
use gazette_core::{EntryKind, Error};
use gazette_storage::{
    ContentRepository, FallbackBackend, GitHubBackend, GitHubConfig, MemoryBackend,
    StorageBackend,
};
use serde_json::json;

use crate::common::{FakeGitHub, document};

const HELLO: &str = "content/articles/hello.md";

#[tokio::test]
async fn test_create_commits_new_file() {
    let github = FakeGitHub::start().await;
    let backend = github.backend();

    let slug = backend
        .write(EntryKind::Article, "hello", None, &document("Hello"))
        .await
        .expect("create should succeed");

    assert_eq!(slug, "hello");
    assert_eq!(github.file(HELLO), Some(document("Hello")));
    assert_eq!(github.commits(), vec!["Create Article: hello"]);
}

#[tokio::test]
async fn test_read_decodes_wrapped_base64() {
    let github = FakeGitHub::start().await;
    let long = document(&"Long title ".repeat(20));
    github.seed(HELLO, &long);

    let content = github.backend().read(EntryKind::Article, "hello").await.unwrap();
    assert_eq!(content, Some(long));
}

#[tokio::test]
async fn test_read_missing_is_none() {
    let github = FakeGitHub::start().await;
    let backend = github.backend();
    assert!(backend.read(EntryKind::Event, "nope").await.unwrap().is_none());
    assert!(backend.get(EntryKind::Event, "nope").await.unwrap().is_none());
}

#[tokio::test]
async fn test_update_sends_current_sha() {
    let github = FakeGitHub::start().await;
    github.seed(HELLO, &document("Hello"));

    github
        .backend()
        .write(EntryKind::Article, "hello", None, &document("Hello again"))
        .await
        .expect("update with the current sha should succeed");

    assert_eq!(github.file(HELLO), Some(document("Hello again")));
    assert_eq!(github.commits(), vec!["Update Article: hello"]);
}

#[tokio::test]
async fn test_rename_moves_file() {
    let github = FakeGitHub::start().await;
    github.seed(HELLO, &document("Hello"));

    github
        .backend()
        .write(EntryKind::Article, "greetings", Some("hello"), &document("Hello"))
        .await
        .unwrap();

    assert_eq!(github.paths(), vec!["content/articles/greetings.md"]);
    assert_eq!(
        github.commits(),
        vec![
            "Rename Article: hello -> greetings",
            "Remove Article: hello (renamed to greetings)",
        ]
    );
}

#[tokio::test]
async fn test_failed_rename_rolls_back() {
    let github = FakeGitHub::start().await;
    github.seed(HELLO, &document("Hello"));
    github.fail_delete_of(HELLO);

    let err = github
        .backend()
        .write(EntryKind::Article, "greetings", Some("hello"), &document("Hello"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Storage { .. }), "got {err:?}");
    assert_eq!(github.paths(), vec![HELLO]);
    assert_eq!(
        github.commits().last().map(String::as_str),
        Some("Roll back Article: greetings")
    );
}

#[tokio::test]
async fn test_remove() {
    let github = FakeGitHub::start().await;
    github.seed("content/events/fair.md", &document("Fair"));
    let backend = github.backend();

    backend.remove(EntryKind::Event, "fair").await.unwrap();

    assert!(github.paths().is_empty());
    assert!(matches!(
        backend.remove(EntryKind::Event, "fair").await,
        Err(Error::NotFound { kind: EntryKind::Event, .. })
    ));
}

#[tokio::test]
async fn test_list_reads_directory() {
    let github = FakeGitHub::start().await;
    github.seed("content/articles/older.md", &document("Older").replace("2024", "2023"));
    github.seed("content/articles/newer.md", &document("Newer"));
    github.seed("content/articles/README.txt", "not an entry");
    github.seed("content/articles/broken.md", "no front matter");

    let entries = github.backend().list(EntryKind::Article).await.unwrap();
    let slugs: Vec<_> = entries.iter().map(|e| e.slug.as_str()).collect();
    assert_eq!(slugs, vec!["newer", "older"]);
}

#[tokio::test]
async fn test_list_missing_collection_is_empty() {
    let github = FakeGitHub::start().await;
    assert!(github.backend().list(EntryKind::Event).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_rejected_token_is_unavailable() {
    let github = FakeGitHub::start().await;
    let backend = GitHubBackend::new(&GitHubConfig {
        token: Some("wrong".to_string()),
        ..github.config()
    })
    .unwrap();

    let err = backend.read(EntryKind::Article, "hello").await.unwrap_err();
    assert!(matches!(err, Error::BackendUnavailable { .. }));
    assert!(!err.to_string().contains("wrong"));
}

#[tokio::test]
async fn test_unreachable_host_is_unavailable() {
    let backend = GitHubBackend::new(&GitHubConfig {
        owner: "acme".to_string(),
        repo: "site".to_string(),
        api_url: "http://127.0.0.1:1".to_string(),
        token: Some("t".to_string()),
        timeout_secs: 2,
        ..Default::default()
    })
    .unwrap();

    let err = backend.scan(EntryKind::Article).await.unwrap_err();
    assert!(err.is_backend_failure());
}

#[tokio::test]
async fn test_repository_over_github() {
    let github = FakeGitHub::start().await;
    let repo = ContentRepository::new(Arc::new(github.backend()));

    let payload: EntryPayload =
        serde_json::from_value(json!({"title": "Spring Fair", "body": "Come!", "location": "Hall"}))
            .unwrap();
    repo.create_entry(EntryKind::Event, payload).await.unwrap();
    let published = repo
        .set_published(EntryKind::Event, "spring-fair", Some(false))
        .await
        .unwrap();

    assert!(!published);
    let stored = github.file("content/events/spring-fair.md").unwrap();
    assert!(stored.contains("published: false"));
    assert!(stored.contains("location: \"Hall\""));
    assert_eq!(github.commits().len(), 2);
}

#[tokio::test]
async fn test_fallback_to_memory_when_github_rejects() {
    let github = FakeGitHub::start().await;
    let primary = GitHubBackend::new(&GitHubConfig {
        token: Some("expired".to_string()),
        ..github.config()
    })
    .unwrap();
    let alternate = Arc::new(MemoryBackend::named("local"));
    let backend = FallbackBackend::new(Arc::new(primary), alternate.clone());

    backend
        .write(EntryKind::Article, "hello", None, &document("Hello"))
        .await
        .expect("alternate should take the write");

    assert_eq!(alternate.keys(EntryKind::Article).await, vec!["hello"]);
    assert!(github.paths().is_empty());
}

#[tokio::test]
async fn test_undecodable_files_are_skipped_and_reported() {
    let github = FakeGitHub::start().await;
    github.seed(HELLO, &document("Hello"));
    github.seed_bytes("content/articles/latin1.md", b"---\ntitle: \"Caf\xe9\"\n---\n\nx");
    github.seed("content/articles/garbled.md", &document("Garbled"));
    github.garble("content/articles/garbled.md");
    let backend = github.backend();

    let entries = backend.list(EntryKind::Article).await.unwrap();
    let slugs: Vec<_> = entries.iter().map(|e| e.slug.as_str()).collect();
    assert_eq!(slugs, vec!["hello"]);

    let err = backend.get(EntryKind::Article, "latin1").await.unwrap_err();
    assert!(matches!(err, Error::MalformedContent { .. }));
    assert!(!err.is_backend_failure());

    let repo = ContentRepository::new(Arc::new(backend));
    let issues = repo.check(EntryKind::Article).await.unwrap();
    let flagged: Vec<_> = issues.iter().map(|i| i.slug.as_str()).collect();
    assert_eq!(flagged, vec!["garbled", "latin1"]);
}

#[tokio::test]
async fn test_overwrite_of_non_utf8_file() {
    let github = FakeGitHub::start().await;
    github.seed_bytes(HELLO, &[0xff, 0xfe]);
    let backend = github.backend();

    backend
        .write(EntryKind::Article, "hello", None, &document("Hello"))
        .await
        .unwrap();

    assert_eq!(github.file_bytes(HELLO), Some(document("Hello").into_bytes()));
    assert_eq!(github.commits(), vec!["Update Article: hello"]);
}

#[tokio::test]
async fn test_slow_api_times_out() {
    let github = FakeGitHub::start().await;
    github.seed(HELLO, &document("Hello"));
    github.stall_reads(Duration::from_secs(3));
    let backend = GitHubBackend::new(&GitHubConfig {
        timeout_secs: 1,
        ..github.config()
    })
    .unwrap();

    let err = backend.read(EntryKind::Article, "hello").await.unwrap_err();

    assert!(matches!(err, Error::Timeout { seconds: 1 }));
    assert!(err.is_retryable());
    assert!(err.is_backend_failure());
}

#[tokio::test]
async fn test_fallback_serves_reads_when_github_times_out() {
    let github = FakeGitHub::start().await;
    github.stall_reads(Duration::from_secs(3));
    let primary = GitHubBackend::new(&GitHubConfig {
        timeout_secs: 1,
        ..github.config()
    })
    .unwrap();
    let alternate = Arc::new(MemoryBackend::named("local"));
    alternate
        .insert_raw(EntryKind::Article, "hello", &document("Hello"))
        .await;
    let backend = FallbackBackend::new(Arc::new(primary), alternate);

    let entry = backend.get(EntryKind::Article, "hello").await.unwrap().unwrap();
    assert_eq!(entry.meta.title, "Hello");
}

#[tokio::test]
async fn test_branch_is_sent_as_encoded_ref() {
    let github = FakeGitHub::start().await;
    let backend = GitHubBackend::new(&GitHubConfig {
        branch: "release/1.0+hotfix#2".to_string(),
        ..github.config()
    })
    .unwrap();

    assert!(backend.read(EntryKind::Article, "hello").await.unwrap().is_none());
    assert_eq!(github.queries(), vec!["ref=release%2F1.0%2Bhotfix%232"]);
}
