//! # figma-icon-export
//!
//! Exports icon sets from a Figma document into a local directory and writes a
//! grouped `icons.json` manifest.
//!
//! One run:
//! 1. fetches the document tree,
//! 2. selects the icon nodes of the configured pages (optionally narrowed to a frame),
//! 3. renames colliding names,
//! 4. resolves all icons to rendered image URLs in a single request,
//! 5. clears stale output (keeping `README.md`),
//! 6. downloads every icon concurrently, stopping on the first failure,
//! 7. writes the manifest.
//!
//! ## Quick Start
//!
//! ```no_run
//! use figma_icon_export::{Config, ExportMode, IconExporter};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config {
//!         figma_personal_token: Some("figd_...".to_string()),
//!         file_id: "AbCdEf123".to_string(),
//!         page: Some("Icons".to_string()),
//!         icons_path: "assets/icons".into(),
//!         meta_path: "assets".into(),
//!         ..Default::default()
//!     };
//!
//!     let exporter = IconExporter::new(config)?;
//!     let report = exporter.export(ExportMode::Icons).await?;
//!     println!("exported {} icons", report.results.len());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Figma REST API client
pub mod client;
/// Configuration types
pub mod config;
/// Concurrent download engine
pub mod download;
/// Error types
pub mod error;
/// Icon selection from the document tree
pub mod extract;
/// Export run orchestration
pub mod exporter;
/// `.gitignore` maintenance for the config file
pub mod gitignore;
/// Image URL resolution
pub mod images;
/// Grouped manifest
pub mod manifest;
/// Output directory management
pub mod output;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use client::{DesignApi, FigmaClient};
pub use config::{Config, ExportSelector, FrameSelector, PageSelector};
pub use download::{DownloadEngine, DownloadRequest};
pub use error::{Error, Result};
pub use exporter::{ExportMode, ExportReport, IconExporter};
pub use manifest::Manifest;
pub use types::{DocumentNode, DownloadResult, Event, IconRef, ImageFormat};

/// Run an export, cancelling it when a termination signal arrives
///
/// SIGTERM and SIGINT on Unix, Ctrl+C elsewhere.
///
/// In-flight downloads are stopped and their partial files removed before this
/// returns `Error::Cancelled`.
pub async fn export_with_shutdown(exporter: &IconExporter, mode: ExportMode) -> Result<ExportReport> {
    let cancel = exporter.cancel_token();
    let watcher = tokio::spawn(async move {
        wait_for_signal().await;
        cancel.cancel();
    });

    let result = exporter.export(mode).await;
    watcher.abort();
    result
}

/// Resolve once SIGTERM or SIGINT arrives
///
/// Signals that cannot be registered (restricted containers) are skipped; with
/// none left, Ctrl+C is the only trigger.
#[cfg(unix)]
async fn wait_for_signal() {
    use futures::future::select_all;
    use tokio::signal::unix::{SignalKind, signal};

    let listeners: Vec<_> = [
        (SignalKind::terminate(), "SIGTERM"),
        (SignalKind::interrupt(), "SIGINT"),
    ]
    .into_iter()
    .filter_map(|(kind, label)| match signal(kind) {
        Ok(stream) => Some((stream, label)),
        Err(e) => {
            tracing::warn!(signal = label, error = %e, "could not register signal handler");
            None
        }
    })
    .collect();

    if listeners.is_empty() {
        ctrl_c_or_never().await;
        tracing::info!(signal = "Ctrl+C", "cancelling export");
        return;
    }

    let waits = listeners.into_iter().map(|(mut stream, label)| {
        Box::pin(async move {
            stream.recv().await;
            label
        })
    });
    let (label, _, _) = select_all(waits).await;
    tracing::info!(signal = label, "cancelling export");
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    ctrl_c_or_never().await;
    tracing::info!(signal = "Ctrl+C", "cancelling export");
}

/// Wait for Ctrl+C; without a working handler the export is never cancelled
async fn ctrl_c_or_never() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "could not listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}
