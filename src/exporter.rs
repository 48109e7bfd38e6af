//! Export run orchestration
//!
//! [`IconExporter`] drives one run end to end: fetch the document, pick the icons,
//! resolve their image URLs, prepare the output directory, download everything and
//! write the manifest. Progress is published as [`Event`]s on a broadcast channel.

use crate::client::{DesignApi, FigmaClient};
use crate::config::Config;
use crate::download::{DownloadEngine, DownloadRequest};
use crate::error::{Error, Result};
use crate::extract::extract_icons;
use crate::images::resolve_images;
use crate::manifest::Manifest;
use crate::output::{clear_directory, ensure_directory};
use crate::types::{DownloadResult, Event, IconRef, ImageFormat};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// What kind of export to run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExportMode {
    /// Icon set: configured format, output cleared first, manifest written
    #[default]
    Icons,
    /// Raster images: PNG, output kept, names containing `_` skipped, no manifest
    Images,
}

impl ExportMode {
    fn format(self, config: &Config) -> ImageFormat {
        match self {
            ExportMode::Icons => config.format,
            ExportMode::Images => ImageFormat::Png,
        }
    }

    /// Whether an icon should be downloaded in this mode
    ///
    /// Design files keep text layers next to the icons for grouping; in icon mode
    /// only `Group/Style/Name`-like names (at least one `/`) are real icons, in
    /// image mode helper layers are marked with `_`.
    #[must_use]
    pub fn includes(self, name: &str) -> bool {
        match self {
            ExportMode::Icons => name.contains('/'),
            ExportMode::Images => !name.contains('_'),
        }
    }
}

/// Outcome of a successful run
#[derive(Clone, Debug, Default)]
pub struct ExportReport {
    /// Files written, in icon order
    pub results: Vec<DownloadResult>,
    /// Names that were renamed because they collided
    pub duplicates: Vec<String>,
    /// Manifest, in icon mode
    pub manifest: Option<Manifest>,
}

/// Runs icon exports for one configuration (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct IconExporter {
    config: Arc<Config>,
    api: Arc<dyn DesignApi>,
    event_tx: broadcast::Sender<Event>,
    cancel: CancellationToken,
}

impl IconExporter {
    /// Create an exporter talking to the Figma API
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the configuration is incomplete.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let token = config.figma_personal_token.clone().unwrap_or_default();
        let client = FigmaClient::new(&config.api_base_url, token)?;
        Self::with_api(config, Arc::new(client))
    }

    /// Create an exporter backed by any [`DesignApi`] implementation
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the configuration is incomplete.
    pub fn with_api(config: Config, api: Arc<dyn DesignApi>) -> Result<Self> {
        config.validate()?;
        let (event_tx, _rx) = broadcast::channel(1000);
        Ok(Self {
            config: Arc::new(config),
            api,
            event_tx,
            cancel: CancellationToken::new(),
        })
    }

    /// Subscribe to progress events
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// The configuration this exporter was built with
    #[must_use]
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    /// Token that stops the run when cancelled
    #[must_use]
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run one export
    ///
    /// # Errors
    ///
    /// - `Error::PageNotFound` / `Error::FrameNotFound` before anything is written
    /// - `Error::Api` / `Error::Network` if the document or image URLs cannot be fetched
    /// - `Error::Download` / `Error::Io` if any icon fails; the run stops there
    /// - `Error::Cancelled` if the cancel token fired
    ///
    /// A manifest that cannot be written is reported as an event and a warning only.
    pub async fn export(&self, mode: ExportMode) -> Result<ExportReport> {
        let config = &self.config;
        let selector = config.selector()?;
        let format = mode.format(config);

        let started = Instant::now();
        let file = self.api.get_file(&config.file_id).await?;
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        info!(file_id = %config.file_id, elapsed_ms, "fetched document");
        self.emit(Event::DocumentFetched { elapsed_ms });

        let extracted = extract_icons(&file.document, &selector)?;
        for name in &extracted.duplicates {
            self.emit(Event::DuplicateName { name: name.clone() });
        }
        self.emit(Event::IconsExtracted {
            count: extracted.icons.len(),
        });

        let icons = resolve_images(self.api.as_ref(), &config.file_id, extracted.icons, format).await?;
        info!(count = icons.len(), "resolved icon URLs");
        self.emit(Event::UrlsResolved { count: icons.len() });

        self.check_cancelled()?;
        ensure_directory(&config.icons_path).await?;
        if mode == ExportMode::Icons {
            clear_directory(&config.icons_path).await?;
            self.emit(Event::OutputCleared {
                path: config.icons_path.clone(),
            });
        }
        self.check_cancelled()?;

        let requests = self.download_requests(&icons, mode);
        debug!(
            selected = requests.len(),
            skipped = icons.len() - requests.len(),
            "starting downloads"
        );
        let engine = DownloadEngine::new(
            config.icons_path.clone(),
            format,
            config.max_concurrent_downloads,
            self.event_tx.clone(),
        );
        let results = engine.download_all(requests, &self.cancel).await?;
        info!(count = results.len(), "downloads finished");
        self.emit(Event::Finished {
            count: results.len(),
        });

        let manifest = match mode {
            ExportMode::Icons => Some(self.write_manifest(&results, format).await),
            ExportMode::Images => None,
        };

        Ok(ExportReport {
            results,
            duplicates: extracted.duplicates,
            manifest,
        })
    }

    fn download_requests(&self, icons: &[IconRef], mode: ExportMode) -> Vec<DownloadRequest> {
        icons
            .iter()
            .filter(|icon| mode.includes(&icon.name))
            .map(|icon| DownloadRequest {
                name: remove_from_name(&icon.name, &self.config.remove_from_name),
                url: icon.image.clone(),
            })
            .collect()
    }

    async fn write_manifest(&self, results: &[DownloadResult], format: ImageFormat) -> Manifest {
        let manifest = Manifest::build(results, format);
        let path = self.config.manifest_path();
        match manifest.write(&path).await {
            Ok(()) => {
                info!(?path, "wrote manifest");
                self.emit(Event::ManifestWritten { path });
            }
            Err(e) => {
                warn!(?path, error = %e, "failed to write manifest");
                self.emit(Event::ManifestFailed {
                    error: e.to_string(),
                });
            }
        }
        manifest
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        Ok(())
    }

    /// Emit an event to all subscribers; dropped if nobody listens
    fn emit(&self, event: Event) {
        self.event_tx.send(event).ok();
    }
}

/// Remove the first occurrence of `pattern` from `name`
#[must_use]
pub fn remove_from_name(name: &str, pattern: &str) -> String {
    if pattern.is_empty() {
        return name.to_string();
    }
    name.replacen(pattern, "", 1)
}
