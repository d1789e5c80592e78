//! Service configuration.
//!
//! Loaded from `gazette.toml` (explicit `--config` path, else
//! `./gazette.toml` when present, else built-in defaults), then overlaid with
//! environment overrides:
//!
//! | Variable                  | Field                  |
//! |---------------------------|------------------------|
//! | `GAZETTE_ADMIN_TOKEN`     | `server.admin_token`   |
//! | `GAZETTE_BIND`            | `server.bind`          |
//! | `GAZETTE_STORAGE_BACKEND` | `storage.backend`      |
//! | `GITHUB_TOKEN`            | `storage.github.token` |

use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use gazette_core::{Error, Result};
use gazette_storage::StorageConfig;
use serde::{Deserialize, Serialize};

/// File name looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "gazette.toml";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GazetteConfig {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Storage backend selection.
    pub storage: StorageConfig,
    /// Log output.
    pub logging: LoggingConfig,
}

/// `[server]` section.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address.
    pub bind: String,
    /// Require a bearer token on admin routes.
    pub auth_enabled: bool,
    /// Token the admin routes accept.
    #[serde(skip_serializing)]
    pub admin_token: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:4321".to_string(),
            auth_enabled: true,
            admin_token: None,
        }
    }
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("bind", &self.bind)
            .field("auth_enabled", &self.auth_enabled)
            .field("admin_token", &self.admin_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl ServerConfig {
    /// Parsed listen address.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.bind
            .parse()
            .map_err(|e| Error::config(format!("Invalid server.bind '{}': {e}", self.bind)))
    }

    /// Check the settings `serve` depends on.
    pub fn validate(&self) -> Result<()> {
        self.socket_addr()?;
        let has_token = self
            .admin_token
            .as_deref()
            .is_some_and(|token| !token.trim().is_empty());
        if self.auth_enabled && !has_token {
            return Err(Error::config(
                "server.admin_token (or GAZETTE_ADMIN_TOKEN) is required when auth is enabled",
            ));
        }
        Ok(())
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default `tracing` filter; `RUST_LOG` takes precedence.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl GazetteConfig {
    /// Load configuration and apply process environment overrides.
    ///
    /// An explicit path must exist; the implicit `./gazette.toml` is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match Self::resolve_path(path)? {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Which file `load` reads, if any.
    pub fn resolve_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        match explicit {
            Some(path) if path.is_file() => Ok(Some(path.to_path_buf())),
            Some(path) => Err(Error::config(format!(
                "Config file not found: {}",
                path.display()
            ))),
            None => {
                let local = PathBuf::from(DEFAULT_CONFIG_FILE);
                Ok(local.is_file().then_some(local))
            }
        }
    }

    /// Read and parse a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::io_with_path(e, path))?;
        log::debug!("Loaded configuration from {}", path.display());
        toml::from_str(&text).map_err(|e| Error::config(format!("{}: {e}", path.display())))
    }

    /// Parse TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::config(e.to_string()))
    }

    /// Overlay values from `lookup` (normally the process environment).
    /// Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(token) = get("GAZETTE_ADMIN_TOKEN") {
            self.server.admin_token = Some(token);
        }
        if let Some(bind) = get("GAZETTE_BIND") {
            self.server.bind = bind;
        }
        if let Some(backend) = get("GAZETTE_STORAGE_BACKEND") {
            self.storage.backend = backend.parse()?;
        }
        if let Some(token) = get("GITHUB_TOKEN") {
            self.storage.github.token = Some(token);
        }
        Ok(())
    }
}
