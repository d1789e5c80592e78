//! Route table and handlers.
//!
//! - `GET  /api/health`
//! - `GET  /api/content/{collection}` and `/{slug}`: published entries only
//! - `GET|POST /api/admin/{collection}`
//! - `GET|PATCH|PUT|DELETE /api/admin/{collection}/{slug}`
//! - `PATCH /api/admin/{collection}/{slug}/publish`
//!
//! Request bodies are taken as raw bytes and parsed here so a malformed body
//! gets the same `{"error": ...}` shape as every other failure.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, patch};
use axum::{Json, Router};
use gazette_content::EntryPayload;
use gazette_core::util::flags::{flag_from_number, parse_flag};
use gazette_core::{Entry, EntryKind, ValidationIssue};
use gazette_storage::ContentRepository;
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

use crate::auth::AdminAuthLayer;
use crate::error::{Action, ApiError};

type ApiResult<T> = Result<T, ApiError>;

/// Shared handler state.
#[derive(Clone, Debug)]
pub struct AppState {
    repository: Arc<ContentRepository>,
}

impl AppState {
    /// Wrap a repository.
    pub fn new(repository: ContentRepository) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    /// The content repository.
    pub fn repository(&self) -> &ContentRepository {
        &self.repository
    }
}

/// Build the full application router.
pub fn router(state: AppState, auth: AdminAuthLayer) -> Router {
    let public = Router::new()
        .route("/{collection}", get(public_list))
        .route("/{collection}/{slug}", get(public_get));

    let admin = Router::new()
        .route("/{collection}", get(admin_list).post(admin_create))
        .route(
            "/{collection}/{slug}",
            get(admin_get)
                .patch(admin_update)
                .put(admin_update)
                .delete(admin_delete),
        )
        .route("/{collection}/{slug}/publish", patch(admin_publish))
        .layer(auth);

    Router::new()
        .route("/api/health", get(health))
        .nest("/api/content", public)
        .nest("/api/admin", admin)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn kind_of(collection: &str) -> ApiResult<EntryKind> {
    EntryKind::from_collection(collection).ok_or(ApiError::UnknownType)
}

/// Parse a JSON object body.
fn parse_body<T: serde::de::DeserializeOwned>(body: &Bytes) -> ApiResult<T> {
    let reject = |e: serde_json::Error| {
        tracing::debug!(error = %e, "rejecting request body");
        ApiError::InvalidJson
    };
    let value: Value = serde_json::from_slice(body).map_err(reject)?;
    if !value.is_object() {
        tracing::debug!("rejecting request body: not a JSON object");
        return Err(ApiError::InvalidJson);
    }
    serde_json::from_value(value).map_err(reject)
}

// ============================================================================
// Public
// ============================================================================

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "backend": state.repository.backend_name(),
    }))
}

async fn public_list(
    State(state): State<AppState>,
    Path(collection): Path<String>,
) -> ApiResult<Json<Vec<Entry>>> {
    let kind = kind_of(&collection)?;
    state
        .repository
        .list_published(kind)
        .await
        .map(Json)
        .map_err(|e| ApiError::from_content(e, Action::List, kind))
}

async fn public_get(
    State(state): State<AppState>,
    Path((collection, slug)): Path<(String, String)>,
) -> ApiResult<Json<Entry>> {
    let kind = kind_of(&collection)?;
    let entry = state
        .repository
        .get_entry(kind, &slug)
        .await
        .map_err(|e| ApiError::from_content(e, Action::Fetch, kind))?;

    // Drafts are indistinguishable from missing entries on the public side.
    match entry {
        Some(entry) if entry.meta.published => Ok(Json(entry)),
        _ => Err(ApiError::NotFound(kind)),
    }
}

// ============================================================================
// Admin
// ============================================================================

async fn admin_list(
    State(state): State<AppState>,
    Path(collection): Path<String>,
) -> ApiResult<Json<Vec<Entry>>> {
    let kind = kind_of(&collection)?;
    state
        .repository
        .list_entries(kind)
        .await
        .map(Json)
        .map_err(|e| ApiError::from_content(e, Action::List, kind))
}

async fn admin_get(
    State(state): State<AppState>,
    Path((collection, slug)): Path<(String, String)>,
) -> ApiResult<Json<Entry>> {
    let kind = kind_of(&collection)?;
    state
        .repository
        .require_entry(kind, &slug)
        .await
        .map(Json)
        .map_err(|e| ApiError::from_content(e, Action::Fetch, kind))
}

async fn admin_create(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let kind = kind_of(&collection)?;
    let payload: EntryPayload = parse_body(&body)?;
    let entry = state
        .repository
        .create_entry(kind, payload)
        .await
        .map_err(|e| ApiError::from_content(e, Action::Create, kind))?;

    tracing::info!(%kind, slug = %entry.slug, "entry created");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "slug": entry.slug })),
    ))
}

async fn admin_update(
    State(state): State<AppState>,
    Path((collection, slug)): Path<(String, String)>,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let kind = kind_of(&collection)?;
    let payload: EntryPayload = parse_body(&body)?;
    let entry = state
        .repository
        .update_entry(kind, &slug, payload)
        .await
        .map_err(|e| ApiError::from_content(e, Action::Update, kind))?;

    tracing::info!(%kind, %slug, new_slug = %entry.slug, "entry updated");
    Ok(Json(json!({ "success": true, "slug": entry.slug })))
}

async fn admin_delete(
    State(state): State<AppState>,
    Path((collection, slug)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    let kind = kind_of(&collection)?;
    state
        .repository
        .remove_entry(kind, &slug)
        .await
        .map_err(|e| ApiError::from_content(e, Action::Delete, kind))?;

    tracing::info!(%kind, %slug, "entry deleted");
    Ok(Json(json!({ "success": true })))
}

#[derive(Debug, Default, Deserialize)]
struct PublishRequest {
    #[serde(default)]
    published: Option<Value>,
}

/// `None` means "flip". Accepts the same flag forms as entry payloads.
fn requested_flag(request: PublishRequest) -> ApiResult<Option<bool>> {
    match request.published {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(b)),
        Some(Value::String(s)) if parse_flag(&s).is_some() => Ok(parse_flag(&s)),
        Some(Value::Number(n)) if n.as_f64().is_some() => Ok(n.as_f64().map(flag_from_number)),
        Some(_) => Err(ApiError::Validation(vec![ValidationIssue::new(
            "published",
            "Published must be a boolean",
        )])),
    }
}

async fn admin_publish(
    State(state): State<AppState>,
    Path((collection, slug)): Path<(String, String)>,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let kind = kind_of(&collection)?;
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        PublishRequest::default()
    } else {
        parse_body(&body)?
    };
    let flag = requested_flag(request)?;

    let published = state
        .repository
        .set_published(kind, &slug, flag)
        .await
        .map_err(|e| ApiError::from_content(e, Action::Update, kind))?;

    tracing::info!(%kind, %slug, published, "publish state set");
    Ok(Json(json!({ "success": true, "published": published })))
}
