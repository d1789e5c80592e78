//! GitHub repository backend.
//!
//! Stores the same `<collection>/<slug>.md` layout as the filesystem backend,
//! under a configurable directory of a GitHub repository, through the REST
//! contents API. Every write or removal is one commit on the configured
//! branch, so edits made in the admin deploy like any other push.
//!
//! The API needs the blob sha of a file to update or delete it. Shas are
//! looked up right before each mutation rather than cached.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use futures::{StreamExt, TryStreamExt, stream};
use gazette_core::entry::ENTRY_EXTENSION;
use gazette_core::{EntryKind, Error, Result, is_valid_slug};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{Client, Response, StatusCode, Url};
use serde::{Deserialize, Serialize};

use crate::config::GitHubConfig;
use crate::traits::{StorageBackend, StoredDocument, document_text, ensure_slug};

const BACKEND_NAME: &str = "github";
const API_VERSION: &str = "2022-11-28";
const MEDIA_TYPE: &str = "application/vnd.github+json";
/// Concurrent file fetches during a scan.
const SCAN_CONCURRENCY: usize = 8;

/// A file as returned by `GET /repos/{owner}/{repo}/contents/{path}`.
#[derive(Debug, Deserialize)]
struct ContentsFile {
    sha: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    encoding: String,
}

/// One item of a directory listing.
#[derive(Debug, Deserialize)]
struct ContentsItem {
    name: String,
    #[serde(rename = "type")]
    item_type: String,
}

#[derive(Debug, Serialize)]
struct Committer<'a> {
    name: &'a str,
    email: &'a str,
}

#[derive(Debug, Serialize)]
struct PutRequest<'a> {
    message: String,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    committer: Option<Committer<'a>>,
}

#[derive(Debug, Serialize)]
struct DeleteRequest<'a> {
    message: String,
    sha: &'a str,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    committer: Option<Committer<'a>>,
}

#[derive(Debug, Default, Deserialize)]
struct CommitResponse {
    #[serde(default)]
    commit: Option<CommitInfo>,
}

#[derive(Debug, Deserialize)]
struct CommitInfo {
    sha: String,
}

/// GitHub error bodies carry a `message`; nothing else is surfaced.
#[derive(Debug, Default, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    message: String,
}

/// A stored file with the sha needed to mutate it.
#[derive(Debug, Clone)]
struct RemoteFile {
    sha: String,
    bytes: Vec<u8>,
}

/// Storage in a GitHub repository via the contents API.
pub struct GitHubBackend {
    client: Client,
    config: GitHubConfig,
    token: String,
}

impl std::fmt::Debug for GitHubBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubBackend")
            .field("owner", &self.config.owner)
            .field("repo", &self.config.repo)
            .field("branch", &self.config.branch)
            .finish_non_exhaustive()
    }
}

impl GitHubBackend {
    /// Create a backend from configuration.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] when owner or repository is missing
    /// - [`Error::BackendUnavailable`] when no token is configured
    pub fn new(config: &GitHubConfig) -> Result<Self> {
        if config.owner.trim().is_empty() || config.repo.trim().is_empty() {
            return Err(Error::config(
                "GitHub storage requires both owner and repo",
            ));
        }
        let token = config
            .token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| Error::unavailable(BACKEND_NAME, "no access token configured"))?
            .to_string();

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(MEDIA_TYPE));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static(API_VERSION),
        );

        let client = Client::builder()
            .user_agent(concat!("gazette/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::storage_with_source("failed to build HTTP client", e))?;

        log::debug!(
            "GitHub backend: {}/{}@{} under '{}'",
            config.owner,
            config.repo,
            config.branch,
            config.content_path
        );

        Ok(Self {
            client,
            config: config.clone(),
            token,
        })
    }

    fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{path}",
            self.config.api_url.trim_end_matches('/'),
            self.config.owner,
            self.config.repo
        )
    }

    fn repo_path(&self, relative: &str) -> String {
        let base = self.config.content_path.trim_matches('/');
        if base.is_empty() {
            relative.to_string()
        } else {
            format!("{base}/{relative}")
        }
    }

    fn file_path(&self, kind: EntryKind, slug: &str) -> Result<String> {
        ensure_slug(slug)?;
        Ok(self.repo_path(&kind.relative_path(slug)))
    }

    fn committer(&self) -> Option<Committer<'_>> {
        match (&self.config.committer_name, &self.config.committer_email) {
            (Some(name), Some(email)) => Some(Committer {
                name: name.as_str(),
                email: email.as_str(),
            }),
            _ => None,
        }
    }

    fn send_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                seconds: self.config.timeout_secs,
            }
        } else if err.is_connect() {
            Error::unavailable(
                BACKEND_NAME,
                format!("cannot reach {}", self.config.api_url),
            )
        } else {
            Error::storage_with_source("GitHub request failed", err)
        }
    }

    /// Turn a non-success response into an error. Auth rejections mean the
    /// backend is unusable as configured; anything else is a storage error
    /// carrying GitHub's message.
    async fn status_error(&self, op: &str, path: &str, response: Response) -> Error {
        let status = response.status();
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Error::unavailable(
                BACKEND_NAME,
                format!("credential rejected ({status})"),
            );
        }
        let message = response
            .json::<ApiMessage>()
            .await
            .map(|body| body.message)
            .unwrap_or_default();
        Error::storage(format!("GitHub {op} {path} returned {status}: {message}"))
    }

    /// Contents URL pinned to the configured branch.
    fn ref_url(&self, path: &str) -> Result<Url> {
        let mut url = Url::parse(&self.contents_url(path)).map_err(|e| {
            Error::config(format!("invalid GitHub api_url '{}': {e}", self.config.api_url))
        })?;
        url.query_pairs_mut().append_pair("ref", &self.config.branch);
        Ok(url)
    }

    async fn get(&self, path: &str) -> Result<Option<Response>> {
        let response = self
            .client
            .get(self.ref_url(path)?)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| self.send_error(e))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(self.status_error("GET", path, response).await);
        }
        Ok(Some(response))
    }

    async fn fetch(&self, path: &str) -> Result<Option<RemoteFile>> {
        let Some(response) = self.get(path).await? else {
            return Ok(None);
        };
        let file: ContentsFile = response
            .json()
            .await
            .map_err(|e| Error::storage_with_source(format!("unexpected response for {path}"), e))?;

        if file.encoding != "base64" {
            return Err(Error::storage(format!(
                "{path} is not available inline (encoding '{}')",
                file.encoding
            )));
        }
        let packed: String = file
            .content
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        let bytes = STANDARD
            .decode(packed)
            .map_err(|e| Error::malformed(path, format!("invalid base64: {e}")))?;

        Ok(Some(RemoteFile {
            sha: file.sha,
            bytes,
        }))
    }

    async fn put(&self, path: &str, content: &[u8], sha: Option<&str>, message: String) -> Result<()> {
        let body = PutRequest {
            message,
            content: STANDARD.encode(content),
            branch: &self.config.branch,
            sha,
            committer: self.committer(),
        };
        let response = self
            .client
            .put(self.contents_url(path))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.send_error(e))?;

        if !response.status().is_success() {
            return Err(self.status_error("PUT", path, response).await);
        }
        log_commit(path, response).await;
        Ok(())
    }

    async fn delete(&self, path: &str, sha: &str, message: String) -> Result<()> {
        let body = DeleteRequest {
            message,
            sha,
            branch: &self.config.branch,
            committer: self.committer(),
        };
        let response = self
            .client
            .delete(self.contents_url(path))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.send_error(e))?;

        if !response.status().is_success() {
            return Err(self.status_error("DELETE", path, response).await);
        }
        log_commit(path, response).await;
        Ok(())
    }

    /// Delete a file, resolving its current sha first.
    async fn delete_current(
        &self,
        kind: EntryKind,
        slug: &str,
        path: &str,
        message: String,
    ) -> Result<()> {
        let file = self
            .fetch(path)
            .await?
            .ok_or_else(|| Error::not_found(kind, slug))?;
        self.delete(path, &file.sha, message).await
    }

    /// Put `path` back the way it was before a failed move.
    async fn restore(&self, kind: EntryKind, slug: &str, path: &str, displaced: Option<RemoteFile>) -> Result<()> {
        let current = self.fetch(path).await?;
        let message = format!("Roll back {}: {slug}", kind.label());
        match (displaced, current) {
            (Some(previous), current) => {
                let sha = current.as_ref().map(|file| file.sha.as_str());
                self.put(path, &previous.bytes, sha, message).await
            }
            (None, Some(current)) => self.delete(path, &current.sha, message).await,
            (None, None) => Ok(()),
        }
    }

    async fn list_slugs(&self, kind: EntryKind) -> Result<Vec<String>> {
        let dir = self.repo_path(kind.collection());
        let Some(response) = self.get(&dir).await? else {
            return Ok(Vec::new());
        };
        let items: Vec<ContentsItem> = response
            .json()
            .await
            .map_err(|e| Error::storage_with_source(format!("{dir} is not a directory"), e))?;

        let suffix = format!(".{ENTRY_EXTENSION}");
        let mut slugs: Vec<String> = items
            .into_iter()
            .filter(|item| item.item_type == "file")
            .filter_map(|item| item.name.strip_suffix(&suffix).map(str::to_string))
            .filter(|slug| is_valid_slug(slug))
            .collect();
        slugs.sort();
        Ok(slugs)
    }
}

async fn log_commit(path: &str, response: Response) {
    let commit = response
        .json::<CommitResponse>()
        .await
        .unwrap_or_default()
        .commit;
    match commit {
        Some(commit) => log::info!("Committed {path} as {}", commit.sha),
        None => log::info!("Committed {path}"),
    }
}

#[async_trait]
impl StorageBackend for GitHubBackend {
    fn name(&self) -> &str {
        BACKEND_NAME
    }

    async fn read(&self, kind: EntryKind, slug: &str) -> Result<Option<String>> {
        let path = self.file_path(kind, slug)?;
        self.fetch(&path)
            .await?
            .map(|file| document_text(kind, slug, file.bytes))
            .transpose()
    }

    async fn scan(&self, kind: EntryKind) -> Result<Vec<StoredDocument>> {
        let slugs = self.list_slugs(kind).await?;
        let fetches = slugs.into_iter().map(|slug| async move {
            let path = self.file_path(kind, &slug)?;
            match self.fetch(&path).await {
                Ok(Some(file)) => Ok(Some(StoredDocument::from_bytes(kind, slug, file.bytes))),
                // Removed between the listing and the fetch.
                Ok(None) => Ok(None),
                Err(err @ Error::MalformedContent { .. }) => {
                    Ok(Some(StoredDocument::unreadable(slug, err)))
                }
                Err(err) => Err(err),
            }
        });
        let documents: Vec<Option<StoredDocument>> = stream::iter(fetches)
            .buffered(SCAN_CONCURRENCY)
            .try_collect()
            .await?;
        Ok(documents.into_iter().flatten().collect())
    }

    async fn write(
        &self,
        kind: EntryKind,
        slug: &str,
        previous_slug: Option<&str>,
        content: &str,
    ) -> Result<String> {
        let path = self.file_path(kind, slug)?;
        let label = kind.label();
        let displaced = self.fetch(&path).await?;
        let sha = displaced.as_ref().map(|file| file.sha.as_str());

        let Some(prev) = previous_slug.filter(|prev| *prev != slug) else {
            let verb = if displaced.is_some() { "Update" } else { "Create" };
            self.put(&path, content.as_bytes(), sha, format!("{verb} {label}: {slug}"))
                .await?;
            return Ok(slug.to_string());
        };

        let prev_path = self.file_path(kind, prev)?;
        self.put(&path, content.as_bytes(), sha, format!("Rename {label}: {prev} -> {slug}"))
            .await?;

        let removal = self
            .delete_current(kind, prev, &prev_path, format!("Remove {label}: {prev} (renamed to {slug})"))
            .await;
        if let Err(err) = removal {
            log::warn!("Moving {kind} '{prev}' to '{slug}' failed removing the old file: {err}; rolling back");
            if let Err(rollback) = self.restore(kind, slug, &path, displaced).await {
                log::error!("Rollback of {path} failed: {rollback}");
            }
            return Err(err);
        }

        Ok(slug.to_string())
    }

    async fn remove(&self, kind: EntryKind, slug: &str) -> Result<()> {
        let path = self.file_path(kind, slug)?;
        self.delete_current(kind, slug, &path, format!("Remove {}: {slug}", kind.label()))
            .await
    }
}
