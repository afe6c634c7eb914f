//! Media file downloading.

use std::path::{Path, PathBuf};

use futures::stream::{self, StreamExt};
use indicatif::ProgressBar;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;

use crate::api::WeiboApi;
use crate::config::OptionsConfig;
use crate::error::{Error, Result};
use crate::ledger::record_asset_failure;
use crate::media::{MediaKind, MediaRef};

/// Outcome of one asset. Fan-out workers return these instead of errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetOutcome {
    Downloaded { kind: MediaKind, path: PathBuf },
    AlreadyPresent { path: PathBuf },
    Failed { url: String, path: PathBuf, reason: String },
}

impl AssetOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, AssetOutcome::Failed { .. })
    }
}

/// Validated, retrying asset downloader for one user.
pub struct MediaDownloader<'a> {
    api: &'a WeiboApi,
    uid: &'a str,
    failure_ledger: &'a Path,
    attempts: u32,
    max_concurrent: usize,
}

impl<'a> MediaDownloader<'a> {
    pub fn new(
        api: &'a WeiboApi,
        uid: &'a str,
        failure_ledger: &'a Path,
        options: &OptionsConfig,
    ) -> Self {
        Self {
            api,
            uid,
            failure_ledger,
            attempts: options.download_attempts.max(1),
            max_concurrent: options.max_concurrent_downloads.max(1),
        }
    }

    /// Fetch one asset to `destination`. Never returns an error: failures
    /// are logged to the failure ledger and reported as [`AssetOutcome::Failed`].
    pub async fn fetch(&self, item: &MediaRef, destination: &Path) -> AssetOutcome {
        if destination.exists() {
            tracing::debug!("Skipping existing file: {}", destination.display());
            return AssetOutcome::AlreadyPresent {
                path: destination.to_path_buf(),
            };
        }

        match self.fetch_with_attempts(item, destination).await {
            Ok(()) => {
                tracing::debug!("Downloaded: {}", destination.display());
                AssetOutcome::Downloaded {
                    kind: item.kind,
                    path: destination.to_path_buf(),
                }
            }
            Err(e) => {
                tracing::warn!("Failed to download {} {}: {}", item.kind, item.media_id, e);
                if let Err(ledger_err) =
                    record_asset_failure(self.failure_ledger, self.uid, destination, &item.url)
                {
                    tracing::error!("Could not write failure ledger: {}", ledger_err);
                }
                AssetOutcome::Failed {
                    url: item.url.clone(),
                    path: destination.to_path_buf(),
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn fetch_with_attempts(&self, item: &MediaRef, destination: &Path) -> Result<()> {
        let expected = item.expected_format();
        let mut last_error = None;

        for attempt in 1..=self.attempts {
            match self.api.download_bytes(&item.url).await {
                Ok(bytes) => {
                    if let Some(format) = expected {
                        if !format.is_complete(&bytes) {
                            tracing::debug!(
                                "Attempt {}/{}: {} is truncated ({} bytes)",
                                attempt,
                                self.attempts,
                                item.url,
                                bytes.len()
                            );
                            last_error = Some(Error::AssetCorrupt {
                                url: item.url.clone(),
                                attempts: attempt,
                            });
                            continue;
                        }
                    }

                    write_file(destination, &bytes).await?;
                    return Ok(());
                }
                Err(e) => {
                    tracing::debug!(
                        "Attempt {}/{} for {} failed: {}",
                        attempt,
                        self.attempts,
                        item.url,
                        e
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| Error::Download(format!("No attempt made for {}", item.url))))
    }

    /// Download all assets of one post into `dir`, at most
    /// `max_concurrent_downloads` at a time. Waits for every asset.
    pub async fn fetch_all(
        &self,
        items: &[MediaRef],
        dir: &Path,
        progress: Option<&ProgressBar>,
    ) -> Vec<AssetOutcome> {
        stream::iter(items)
            .map(|item| async move {
                let destination = dir.join(item.file_name());
                let outcome = self.fetch(item, &destination).await;
                if let Some(pb) = progress {
                    pb.inc(1);
                }
                outcome
            })
            .buffer_unordered(self.max_concurrent)
            .collect()
            .await
    }
}

/// Write through a temporary sibling so a partial file never sits at `path`.
async fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::InvalidFilename(path.display().to_string()))?;
    let temp = path.with_file_name(format!(".{}.{}.part", file_name, uuid::Uuid::new_v4()));

    let mut file = File::create(&temp).await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    drop(file);

    if let Err(e) = fs::rename(&temp, path).await {
        let _ = fs::remove_file(&temp).await;
        return Err(e.into());
    }

    Ok(())
}
