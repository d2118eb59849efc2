//! Development Autosave Harness
//!
//! Drives an `AutosaveCoordinator` from stdin against a `FileContentStore`, so
//! debounce, removal and retry behaviour can be watched without the web app.
//!
//! # Protocol
//!
//! One JSON object per line on stdin:
//!
//! ```text
//! {"op":"edit","document":{"type":"doc","content":[...]}}
//! {"op":"flush"}
//! {"op":"retry"}
//! {"op":"status"}
//! ```
//!
//! Status transitions and command results are written to stdout as JSON lines.
//! EOF settles any pending edit and exits.
//!
//! # Usage
//!
//! ```bash
//! APPSDIR_AUTOSAVE_DEBOUNCE_MS=500 cargo run --bin dev-autosave -- app-1 my-app
//! ```
//!
//! Content is stored under `APPSDIR_CONTENT_DIR`, defaulting to
//! `~/.appsdir/content`.

use appsdir_core::db::{ContentStore, FileContentStore};
use appsdir_core::models::{
    AutosaveConfig, CanonicalDocuments, ContentKey, DocumentNode, EditableContent,
};
use appsdir_core::services::{AutosaveCoordinator, AutosaveHandle};
use serde::Deserialize;
use serde_json::json;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
enum HarnessCommand {
    Edit { document: DocumentNode },
    Flush,
    Retry,
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries the JSON protocol
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("dev_autosave=debug,appsdir_core=debug")
            }),
        )
        .init();

    let mut args = env::args().skip(1);
    let owner_id = args.next().unwrap_or_else(|| "dev-owner".to_string());
    let slug = args.next().unwrap_or_else(|| "dev-slug".to_string());

    let content_dir = match env::var("APPSDIR_CONTENT_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Failed to get home directory"))?
            .join(".appsdir")
            .join("content"),
    };

    let config = AutosaveConfig::from_env();
    tracing::info!("📁 Content dir: {}", content_dir.display());
    tracing::info!(
        "⏱️  Debounce: {}ms, max attempts: {}",
        config.debounce_ms,
        config.max_retry_attempts
    );

    let store = Arc::new(FileContentStore::new(content_dir).await?);
    let canon = CanonicalDocuments::default();
    let key = ContentKey::new(owner_id, slug);

    let stored = store
        .get_content(&key.owner_id, &key.slug)
        .await?
        .map(|record| record.body);
    let content = EditableContent::open(key, stored, &canon);
    tracing::info!("📝 Opened {} ({} chars)", content.key, content.char_count());

    let coordinator = AutosaveCoordinator::spawn(store, content, config, canon)?;
    let handle = coordinator.handle();

    let status_printer = spawn_status_printer(&handle, |line| println!("{}", line));
    let error_printer = spawn_error_printer(&handle, |line| println!("{}", line));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let command: HarnessCommand = match serde_json::from_str(&line) {
            Ok(command) => command,
            Err(e) => {
                tracing::warn!("❌ Failed to parse command: {}", e);
                respond(json!({ "error": format!("Invalid command: {}", e) })).await?;
                continue;
            }
        };
        handle_command(&handle, command).await?;
    }

    tracing::info!("🛑 stdin closed, shutting down");
    coordinator.shutdown().await?;

    // Last handle gone: both channels close once the final transitions are printed
    drop(handle);
    status_printer.await?;
    error_printer.await?;
    Ok(())
}

async fn handle_command(handle: &AutosaveHandle, command: HarnessCommand) -> anyhow::Result<()> {
    match command {
        HarnessCommand::Edit { document } => {
            handle.edit(document)?;
        }
        HarnessCommand::Flush => {
            let response = match handle.flush().await {
                Ok(outcome) => json!({ "flush": outcome.map(|o| format!("{:?}", o)) }),
                Err(e) => json!({ "flush": null, "error": e.to_string() }),
            };
            respond(response).await?;
        }
        HarnessCommand::Retry => {
            let response = match handle.retry().await {
                Ok(()) => json!({ "retry": "ok" }),
                Err(e) => json!({ "retry": "failed", "error": e.to_string() }),
            };
            respond(response).await?;
        }
        HarnessCommand::Status => {
            respond(json!({ "snapshot": handle.snapshot() })).await?;
        }
    }
    Ok(())
}

/// Emit one JSON line per status transition until the channel closes
fn spawn_status_printer(
    handle: &AutosaveHandle,
    mut emit: impl FnMut(serde_json::Value) + Send + 'static,
) -> JoinHandle<()> {
    let mut statuses = handle.status_stream();
    tokio::spawn(async move {
        while let Some(status) = statuses.next().await {
            match status {
                Ok(status) => emit(json!({ "event": "status", "status": status })),
                Err(e) => tracing::warn!("Status stream lagged: {}", e),
            }
        }
    })
}

/// Emit one JSON line per reported error until the channel closes
fn spawn_error_printer(
    handle: &AutosaveHandle,
    mut emit: impl FnMut(serde_json::Value) + Send + 'static,
) -> JoinHandle<()> {
    let mut errors = handle.subscribe_errors();
    tokio::spawn(async move {
        loop {
            match errors.recv().await {
                Ok(error) => emit(json!({ "event": "error", "message": error.to_string() })),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Error stream lagged, {} skipped", skipped)
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

async fn respond(value: serde_json::Value) -> anyhow::Result<()> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(value.to_string().as_bytes()).await?;
    stdout.write_all(b"\n").await?;
    stdout.flush().await?;
    Ok(())
}
