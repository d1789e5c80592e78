//! Common test utilities: an in-process fake of the GitHub contents API.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::routing::get;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use gazette_storage::{GitHubBackend, GitHubConfig};
use serde_json::{Value, json};

pub const TOKEN: &str = "test-token";

/// Repository state behind the fake API.
#[derive(Debug, Default)]
pub struct FakeRepo {
    /// Path → (blob sha, content).
    pub files: BTreeMap<String, (String, Vec<u8>)>,
    /// Commit messages, oldest first.
    pub commits: Vec<String>,
    /// DELETE of this path answers 500.
    pub fail_delete: Option<String>,
    /// Files served with content that is not base64.
    pub garbled: BTreeSet<String>,
    /// Pause before answering any GET.
    pub delay: Option<Duration>,
    /// Raw query strings of GET requests, oldest first.
    pub queries: Vec<String>,
    next_sha: u64,
}

impl FakeRepo {
    fn store(&mut self, path: &str, content: Vec<u8>) -> String {
        self.next_sha += 1;
        let sha = format!("blob{}", self.next_sha);
        self.files.insert(path.to_string(), (sha.clone(), content));
        sha
    }

    fn commit(&mut self, message: &str) -> String {
        self.commits.push(message.to_string());
        format!("commit{}", self.commits.len())
    }
}

type Shared = Arc<Mutex<FakeRepo>>;
type Reply = (StatusCode, Json<Value>);

fn reply(status: StatusCode, body: Value) -> Reply {
    (status, Json(body))
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {TOKEN}"))
}

fn unauthorized() -> Reply {
    reply(StatusCode::UNAUTHORIZED, json!({"message": "Bad credentials"}))
}

/// GitHub wraps base64 content at 60 columns.
fn wrapped_base64(content: &[u8]) -> String {
    let encoded = STANDARD.encode(content);
    encoded
        .as_bytes()
        .chunks(60)
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .collect::<Vec<_>>()
        .join("\n")
}

async fn get_contents(
    State(state): State<Shared>,
    Path((_owner, _repo, path)): Path<(String, String, String)>,
    uri: Uri,
    headers: HeaderMap,
) -> Reply {
    if !authorized(&headers) {
        return unauthorized();
    }
    let delay = {
        let mut repo = state.lock().unwrap();
        repo.queries.push(uri.query().unwrap_or_default().to_string());
        repo.delay
    };
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    let repo = state.lock().unwrap();

    if let Some((sha, content)) = repo.files.get(&path) {
        let content = if repo.garbled.contains(&path) {
            "%%% not base64 %%%".to_string()
        } else {
            wrapped_base64(content)
        };
        return reply(
            StatusCode::OK,
            json!({
                "type": "file",
                "path": path,
                "sha": sha,
                "encoding": "base64",
                "content": content,
            }),
        );
    }

    let prefix = format!("{path}/");
    let children: Vec<Value> = repo
        .files
        .keys()
        .filter_map(|key| key.strip_prefix(&prefix))
        .filter(|rest| !rest.contains('/'))
        .map(|name| json!({"name": name, "path": format!("{prefix}{name}"), "type": "file"}))
        .collect();
    if children.is_empty() {
        reply(StatusCode::NOT_FOUND, json!({"message": "Not Found"}))
    } else {
        reply(StatusCode::OK, Value::Array(children))
    }
}

async fn put_contents(
    State(state): State<Shared>,
    Path((_owner, _repo, path)): Path<(String, String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut repo = state.lock().unwrap();

    let current_sha = repo.files.get(&path).map(|(sha, _)| sha.clone());
    let given_sha = body["sha"].as_str().map(str::to_string);
    if current_sha != given_sha {
        return reply(
            StatusCode::CONFLICT,
            json!({"message": format!("{path} does not match sha")}),
        );
    }

    let Some(content) = body["content"].as_str().and_then(|c| STANDARD.decode(c).ok()) else {
        return reply(StatusCode::UNPROCESSABLE_ENTITY, json!({"message": "bad content"}));
    };

    let sha = repo.store(&path, content);
    let commit = repo.commit(body["message"].as_str().unwrap_or_default());
    let status = if current_sha.is_some() {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    reply(status, json!({"content": {"sha": sha}, "commit": {"sha": commit}}))
}

async fn delete_contents(
    State(state): State<Shared>,
    Path((_owner, _repo, path)): Path<(String, String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut repo = state.lock().unwrap();

    if repo.fail_delete.as_deref() == Some(path.as_str()) {
        return reply(StatusCode::INTERNAL_SERVER_ERROR, json!({"message": "boom"}));
    }
    let Some((sha, _)) = repo.files.get(&path) else {
        return reply(StatusCode::NOT_FOUND, json!({"message": "Not Found"}));
    };
    if body["sha"].as_str() != Some(sha.as_str()) {
        return reply(StatusCode::CONFLICT, json!({"message": "sha mismatch"}));
    }

    repo.files.remove(&path);
    let commit = repo.commit(body["message"].as_str().unwrap_or_default());
    reply(StatusCode::OK, json!({"content": null, "commit": {"sha": commit}}))
}

/// A running fake GitHub API.
pub struct FakeGitHub {
    pub state: Shared,
    pub base_url: String,
}

impl FakeGitHub {
    /// Serve the fake on an ephemeral local port.
    pub async fn start() -> Self {
        let state: Shared = Arc::default();
        let app = Router::new()
            .route(
                "/repos/{owner}/{repo}/contents/{*path}",
                get(get_contents).put(put_contents).delete(delete_contents),
            )
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            state,
            base_url: format!("http://{addr}"),
        }
    }

    pub fn config(&self) -> GitHubConfig {
        GitHubConfig {
            owner: "acme".to_string(),
            repo: "site".to_string(),
            api_url: self.base_url.clone(),
            token: Some(TOKEN.to_string()),
            timeout_secs: 5,
            ..Default::default()
        }
    }

    pub fn backend(&self) -> GitHubBackend {
        GitHubBackend::new(&self.config()).unwrap()
    }

    pub fn seed(&self, path: &str, content: &str) {
        self.seed_bytes(path, content.as_bytes());
    }

    pub fn seed_bytes(&self, path: &str, content: &[u8]) {
        self.state.lock().unwrap().store(path, content.to_vec());
    }

    /// Serve `path` with content that does not decode as base64.
    pub fn garble(&self, path: &str) {
        self.state.lock().unwrap().garbled.insert(path.to_string());
    }

    /// Delay every GET by `delay`.
    pub fn stall_reads(&self, delay: Duration) {
        self.state.lock().unwrap().delay = Some(delay);
    }

    pub fn queries(&self) -> Vec<String> {
        self.state.lock().unwrap().queries.clone()
    }

    pub fn file(&self, path: &str) -> Option<String> {
        self.file_bytes(path)
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    }

    pub fn file_bytes(&self, path: &str) -> Option<Vec<u8>> {
        self.state
            .lock()
            .unwrap()
            .files
            .get(path)
            .map(|(_, content)| content.clone())
    }

    pub fn paths(&self) -> Vec<String> {
        self.state.lock().unwrap().files.keys().cloned().collect()
    }

    pub fn commits(&self) -> Vec<String> {
        self.state.lock().unwrap().commits.clone()
    }

    pub fn fail_delete_of(&self, path: &str) {
        self.state.lock().unwrap().fail_delete = Some(path.to_string());
    }
}

/// A minimal valid document.
pub fn document(title: &str) -> String {
    format!("---\ntitle: \"{title}\"\ndate: \"2024-01-01\"\n---\n\nBody of {title}")
}
