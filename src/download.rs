//! Concurrent icon download engine
//!
//! Every icon is fetched as a byte stream and written chunk by chunk to
//! `<output>/<stem>.<format>`. Downloads share one [`CancellationToken`]: the first
//! failure cancels it, downloads that have not started yet never start, and
//! in-flight ones stop and delete their partial file. Once every download has
//! settled the first failure is returned.

use crate::error::{Error, Result};
use crate::types::{DownloadResult, Event, ImageFormat};
use futures::{StreamExt, stream};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::io::AsyncWriteExt;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

/// One file to download
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownloadRequest {
    /// Export name (after `removeFromName`), e.g. `Nav/Line/home`
    pub name: String,
    /// Rendered image URL, `None` if the API did not return one
    pub url: Option<String>,
}

/// File stem for an export name
///
/// For names containing `/`, only the part after the last `/` is kept, trimmed,
/// with spaces and separators turned into `-`, and lowercased. The group and style
/// prefix is dropped, so every file lands directly in the output directory. Names
/// without `/` are used unchanged.
#[must_use]
pub fn sanitize_stem(name: &str) -> String {
    match name.rfind('/') {
        Some(idx) => name[idx + 1..]
            .trim()
            .replace([' ', '\\'], "-")
            .to_lowercase(),
        None => name.to_string(),
    }
}

/// Downloads rendered icons into a flat output directory
#[derive(Clone, Debug)]
pub struct DownloadEngine {
    http: reqwest::Client,
    output_dir: PathBuf,
    format: ImageFormat,
    max_concurrent: Option<usize>,
    event_tx: broadcast::Sender<Event>,
}

impl DownloadEngine {
    /// Create an engine writing `format` files into `output_dir`
    ///
    /// `max_concurrent` caps simultaneous downloads; `None` starts all of them at once.
    pub fn new(
        output_dir: impl Into<PathBuf>,
        format: ImageFormat,
        max_concurrent: Option<usize>,
        event_tx: broadcast::Sender<Event>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            output_dir: output_dir.into(),
            format,
            max_concurrent,
            event_tx,
        }
    }

    /// Destination path for an export name
    #[must_use]
    pub fn file_path(&self, name: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}.{}", sanitize_stem(name), self.format))
    }

    /// Download every request, failing the whole batch on the first error
    ///
    /// Results are returned in request order. Cancelling `cancel` from outside stops
    /// the batch with `Error::Cancelled`.
    ///
    /// # Errors
    ///
    /// Returns the error of the download that failed first.
    pub async fn download_all(
        &self,
        requests: Vec<DownloadRequest>,
        cancel: &CancellationToken,
    ) -> Result<Vec<DownloadResult>> {
        let batch = cancel.child_token();
        let first_failure = AtomicUsize::new(usize::MAX);
        let limit = self.max_concurrent.unwrap_or(requests.len()).max(1);

        let outcomes: Vec<Result<DownloadResult>> = stream::iter(requests.into_iter().enumerate())
            .map(|(index, request)| {
                let batch = &batch;
                let first_failure = &first_failure;
                async move {
                    let result = self
                        .download(request.url.as_deref(), &request.name, batch)
                        .await;
                    if let Err(e) = &result
                        && !e.is_cancellation()
                    {
                        self.emit(Event::DownloadFailed {
                            name: request.name.clone(),
                            error: e.to_string(),
                        });
                        first_failure
                            .compare_exchange(usize::MAX, index, Ordering::SeqCst, Ordering::SeqCst)
                            .ok();
                        batch.cancel();
                    }
                    result
                }
            })
            .buffered(limit)
            .collect()
            .await;

        let failed_at = first_failure.load(Ordering::SeqCst);
        let mut results = Vec::with_capacity(outcomes.len());
        let mut cancelled = false;
        for (index, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                Ok(result) => results.push(result),
                Err(e) if index == failed_at => return Err(e),
                Err(_) => cancelled = true,
            }
        }
        if cancelled {
            return Err(Error::Cancelled);
        }

        Ok(results)
    }

    /// Download one icon
    ///
    /// # Errors
    ///
    /// - `Error::Download` if the URL is missing or the fetch fails
    /// - `Error::Io` if the file cannot be written
    /// - `Error::Cancelled` if `cancel` fires first
    pub async fn download(
        &self,
        url: Option<&str>,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<DownloadResult> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let Some(url) = url else {
            error!(icon = name, "no image URL resolved for icon");
            return Err(Error::Download {
                name: name.to_string(),
                url: String::new(),
                reason: "no image URL was returned for this icon".to_string(),
            });
        };

        tokio::fs::create_dir_all(&self.output_dir).await?;
        let path = self.file_path(name);

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::Cancelled),
            written = self.fetch_to_file(url, name, &path) => written,
        };

        let size = match outcome {
            Ok(size) => size,
            Err(e) => {
                // partial files never survive a failed run
                tokio::fs::remove_file(&path).await.ok();
                return Err(e);
            }
        };

        let result = DownloadResult {
            name: format!("{}.{}", name, self.format),
            size,
        };
        debug!(icon = %result.name, size, ?path, "saved icon");
        self.emit(Event::IconDownloaded {
            name: result.name.clone(),
            size,
        });
        Ok(result)
    }

    /// Stream `url` into `path`, returning the size on disk
    async fn fetch_to_file(&self, url: &str, name: &str, path: &Path) -> Result<u64> {
        let fetch_error = |reason: String| {
            error!(icon = name, url, error = %reason, "failed to fetch icon image");
            Error::Download {
                name: name.to_string(),
                url: url.to_string(),
                reason,
            }
        };

        let mut response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| fetch_error(e.to_string()))?;

        if !response.status().is_success() {
            return Err(fetch_error(format!("HTTP {}", response.status())));
        }

        let mut file = tokio::fs::File::create(path).await?;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| fetch_error(e.to_string()))?
        {
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        drop(file);

        Ok(tokio::fs::metadata(path).await?.len())
    }

    fn emit(&self, event: Event) {
        self.event_tx.send(event).ok();
    }
}
