//! Common test utilities for API integration tests.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use gazette_api::{AdminAuthLayer, AppState, AuthConfig, StaticToken, router};
use gazette_storage::{ContentRepository, MemoryBackend, StorageBackend};
use serde_json::Value;
use tower::ServiceExt;

pub const TOKEN: &str = "admin-secret";

/// Router plus direct access to its storage.
pub struct TestApp {
    pub router: Router,
    pub backend: Arc<MemoryBackend>,
}

impl TestApp {
    pub fn new() -> Self {
        let backend = Arc::new(MemoryBackend::new());
        Self::build(backend.clone(), backend)
    }

    /// Serve from an arbitrary backend while keeping a memory handle for
    /// assertions.
    pub fn build(storage: Arc<dyn StorageBackend>, backend: Arc<MemoryBackend>) -> Self {
        let state = AppState::new(ContentRepository::new(storage));
        let auth = AdminAuthLayer::new(
            Arc::new(StaticToken::new(TOKEN)),
            AuthConfig { enabled: true },
        );
        Self {
            router: router(state, auth),
            backend,
        }
    }

    /// Send a request; `body` is sent verbatim when present.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        if body.is_some() {
            builder = builder.header("Content-Type", "application/json");
        }
        let request = builder
            .body(body.map(|b| Body::from(b.to_string())).unwrap_or_default())
            .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    /// Authorized admin request with a JSON body.
    pub async fn admin(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let body = body.map(|b| b.to_string());
        self.send(method, uri, Some(TOKEN), body.as_deref()).await
    }

    pub async fn public(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None, None).await
    }
}
