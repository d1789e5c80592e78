//! # gazette-cli
//!
//! Library half of the `gazette` binary.
//!
//! - [`config`]: `gazette.toml` loading, environment overrides, validation
//! - [`commands`]: `serve` plus the content maintenance subcommands
//!   (`list`, `show`, `publish`, `remove`, `check`)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod commands;
pub mod config;

pub use config::{GazetteConfig, LoggingConfig, ServerConfig};
