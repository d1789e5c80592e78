//! Storage configuration and backend selection.
//!
//! The backend is chosen once at startup from [`StorageConfig`]; request
//! handlers only ever see the resulting `Arc<dyn StorageBackend>`.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use gazette_core::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::fallback::FallbackBackend;
use crate::filesystem::LocalFilesystemBackend;
use crate::github::GitHubBackend;
use crate::memory::MemoryBackend;
use crate::traits::StorageBackend;

/// Which backend stores entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Markdown files under a local content directory.
    #[default]
    Local,
    /// Markdown files in a GitHub repository.
    Github,
    /// In-process map; contents vanish on exit.
    Memory,
}

impl BackendKind {
    /// Config/CLI spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            BackendKind::Local => "local",
            BackendKind::Github => "github",
            BackendKind::Memory => "memory",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" | "fs" | "filesystem" => Ok(BackendKind::Local),
            "github" => Ok(BackendKind::Github),
            "memory" => Ok(BackendKind::Memory),
            other => Err(Error::config(format!(
                "Unknown storage backend '{other}' (expected local, github, or memory)"
            ))),
        }
    }
}

/// Local filesystem settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalConfig {
    /// Root content directory; collections are subdirectories.
    #[serde(default = "default_content_dir")]
    pub content_dir: String,
}

fn default_content_dir() -> String {
    "content".to_string()
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            content_dir: default_content_dir(),
        }
    }
}

/// GitHub repository settings.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// Repository owner (user or organization).
    #[serde(default)]
    pub owner: String,

    /// Repository name.
    #[serde(default)]
    pub repo: String,

    /// Branch commits land on.
    #[serde(default = "default_branch")]
    pub branch: String,

    /// Directory inside the repository holding the collections.
    #[serde(default = "default_content_dir")]
    pub content_path: String,

    /// API base URL; override for GitHub Enterprise or tests.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Access token. Usually supplied through `GITHUB_TOKEN`.
    #[serde(default, skip_serializing)]
    pub token: Option<String>,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Commit author name; GitHub uses the token owner when unset.
    #[serde(default)]
    pub committer_name: Option<String>,

    /// Commit author email.
    #[serde(default)]
    pub committer_email: Option<String>,
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            owner: String::new(),
            repo: String::new(),
            branch: default_branch(),
            content_path: default_content_dir(),
            api_url: default_api_url(),
            token: None,
            timeout_secs: default_timeout_secs(),
            committer_name: None,
            committer_email: None,
        }
    }
}

impl fmt::Debug for GitHubConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubConfig")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("branch", &self.branch)
            .field("content_path", &self.content_path)
            .field("api_url", &self.api_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .field("committer_name", &self.committer_name)
            .field("committer_email", &self.committer_email)
            .finish()
    }
}

/// Storage section of the service configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Primary backend.
    #[serde(default)]
    pub backend: BackendKind,

    /// Alternate backend tried once when the primary fails.
    #[serde(default)]
    pub fallback: Option<BackendKind>,

    /// Filesystem settings.
    #[serde(default)]
    pub local: LocalConfig,

    /// GitHub settings.
    #[serde(default)]
    pub github: GitHubConfig,
}

fn build_single(kind: BackendKind, config: &StorageConfig) -> Result<Arc<dyn StorageBackend>> {
    Ok(match kind {
        BackendKind::Local => Arc::new(LocalFilesystemBackend::new(&config.local.content_dir)),
        BackendKind::Github => Arc::new(GitHubBackend::new(&config.github)?),
        BackendKind::Memory => Arc::new(MemoryBackend::new()),
    })
}

/// Build the configured backend.
///
/// With a `fallback` that differs from `backend`, both are built and wrapped
/// in a [`FallbackBackend`]. When the primary cannot be built because it is
/// unavailable (e.g. GitHub without a token), the alternate serves alone.
///
/// # Errors
///
/// Fails when a selected backend cannot be constructed and no fallback
/// covers it, or when either backend is misconfigured.
pub fn build_backend(config: &StorageConfig) -> Result<Arc<dyn StorageBackend>> {
    let fallback = config.fallback.filter(|alternate| *alternate != config.backend);
    let backend = match (build_single(config.backend, config), fallback) {
        (Ok(primary), Some(alternate)) => {
            let alternate = build_single(alternate, config)?;
            Arc::new(FallbackBackend::new(primary, alternate)) as Arc<dyn StorageBackend>
        }
        (Ok(primary), None) => primary,
        (Err(err), Some(alternate)) if err.is_backend_failure() => {
            log::warn!(
                "{} storage unavailable ({err}); serving from {alternate}",
                config.backend
            );
            build_single(alternate, config)?
        }
        (Err(err), _) => return Err(err),
    };
    log::info!("Storage backend: {}", backend.name());
    Ok(backend)
}
