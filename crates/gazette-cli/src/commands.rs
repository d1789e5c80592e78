//! Subcommand implementations.
//!
//! Each command takes a [`ContentRepository`] and writes its report to the
//! given output so it can be driven from tests.

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use gazette_api::{AdminAuthLayer, AppState, AuthConfig, StaticToken, router};
use gazette_core::{Entry, EntryKind};
use gazette_storage::ContentRepository;
use tokio::net::TcpListener;

use crate::config::ServerConfig;

/// Run the HTTP API until Ctrl-C.
pub async fn serve(server: &ServerConfig, repository: ContentRepository) -> Result<()> {
    server.validate()?;
    let addr = server.socket_addr()?;

    if !server.auth_enabled {
        tracing::warn!("Admin authentication is disabled; admin routes are open");
    }
    let token = server.admin_token.clone().unwrap_or_default();
    let auth = AdminAuthLayer::new(
        Arc::new(StaticToken::new(token)),
        AuthConfig {
            enabled: server.auth_enabled,
        },
    );

    let backend = repository.backend_name().to_string();
    let app = router(AppState::new(repository), auth);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!(%addr, %backend, "Gazette listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server failed")?;

    tracing::info!("Gazette stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        return;
    }
    tracing::info!("Shutdown requested");
}

/// Print entries of a kind, newest first.
pub async fn list(
    repository: &ContentRepository,
    kind: EntryKind,
    published_only: bool,
    json: bool,
    out: &mut impl Write,
) -> Result<()> {
    let entries = if published_only {
        repository.list_published(kind).await?
    } else {
        repository.list_entries(kind).await?
    };

    if json {
        serde_json::to_writer_pretty(&mut *out, &entries)?;
        writeln!(out)?;
        return Ok(());
    }

    for entry in &entries {
        writeln!(out, "{}", summary_line(entry))?;
    }
    if entries.is_empty() {
        writeln!(out, "No {} found", kind.collection())?;
    }
    Ok(())
}

fn summary_line(entry: &Entry) -> String {
    let state = if entry.meta.published {
        "published"
    } else {
        "draft"
    };
    let date = if entry.meta.date.is_empty() {
        "-"
    } else {
        entry.meta.date.as_str()
    };
    format!("{:<40} {:<12} {:<10} {}", entry.slug, date, state, entry.meta.title)
}

/// Print one entry as JSON.
pub async fn show(
    repository: &ContentRepository,
    kind: EntryKind,
    slug: &str,
    out: &mut impl Write,
) -> Result<()> {
    let entry = repository.require_entry(kind, slug).await?;
    serde_json::to_writer_pretty(&mut *out, &entry)?;
    writeln!(out)?;
    Ok(())
}

/// Set, or flip when `state` is `None`, the published flag.
pub async fn publish(
    repository: &ContentRepository,
    kind: EntryKind,
    slug: &str,
    state: Option<bool>,
    out: &mut impl Write,
) -> Result<()> {
    let published = repository.set_published(kind, slug, state).await?;
    let word = if published { "published" } else { "unpublished" };
    writeln!(out, "{} '{slug}' is {word}", kind.label())?;
    Ok(())
}

/// Delete one entry.
pub async fn remove(
    repository: &ContentRepository,
    kind: EntryKind,
    slug: &str,
    out: &mut impl Write,
) -> Result<()> {
    repository.remove_entry(kind, slug).await?;
    writeln!(out, "Removed {} '{slug}'", kind.label())?;
    Ok(())
}

/// Decode every stored file of the given kinds and report the ones that
/// fail. Errors when any file is malformed.
pub async fn check(
    repository: &ContentRepository,
    kinds: &[EntryKind],
    out: &mut impl Write,
) -> Result<()> {
    let mut malformed = 0;
    for &kind in kinds {
        let issues = repository.check(kind).await?;
        for issue in &issues {
            writeln!(out, "{}/{}: {}", kind.collection(), issue.slug, issue.error)?;
        }
        malformed += issues.len();
    }

    if malformed > 0 {
        bail!("{malformed} malformed file(s)");
    }
    writeln!(out, "All entries decode cleanly")?;
    Ok(())
}
