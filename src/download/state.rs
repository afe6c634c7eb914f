//! Crawl state and download statistics.

use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::error::Result;
use crate::fs::UserPaths;
use crate::ledger::{append_line, load_urls, overwrite_urls};
use crate::media::MediaKind;

/// Durable partition of discovered post URLs into saved and unsaved.
///
/// Every membership change is written through to disk before the method
/// returns, so the logs reload into a valid state after an abrupt exit.
#[derive(Debug)]
pub struct CrawlState {
    saved: BTreeSet<String>,
    unsaved: BTreeSet<String>,
    paths: UserPaths,
}

impl CrawlState {
    /// Load both logs. A URL found in both is treated as saved.
    pub fn load(paths: UserPaths) -> Result<Self> {
        let saved = load_urls(&paths.saved_log)?;
        let mut unsaved = load_urls(&paths.unsaved_log)?;

        let before = unsaved.len();
        unsaved.retain(|url| !saved.contains(url));

        let state = Self {
            saved,
            unsaved,
            paths,
        };

        if state.unsaved.len() != before {
            tracing::debug!(
                "Dropped {} unsaved URL(s) already recorded as saved",
                before - state.unsaved.len()
            );
            state.flush()?;
        }

        Ok(state)
    }

    pub fn saved(&self) -> &BTreeSet<String> {
        &self.saved
    }

    pub fn unsaved(&self) -> &BTreeSet<String> {
        &self.unsaved
    }

    pub fn paths(&self) -> &UserPaths {
        &self.paths
    }

    /// Whether a URL has already been seen in either set.
    pub fn is_known(&self, url: &str) -> bool {
        self.saved.contains(url) || self.unsaved.contains(url)
    }

    /// Copy of the unsaved set, for the resume pass.
    pub fn unsaved_snapshot(&self) -> Vec<String> {
        self.unsaved.iter().cloned().collect()
    }

    /// Record a URL as fully processed.
    pub fn mark_saved(&mut self, url: &str) -> Result<()> {
        if self.saved.insert(url.to_string()) {
            append_line(&self.paths.saved_log, url)?;
        }

        if self.unsaved.remove(url) {
            self.flush()?;
        }

        Ok(())
    }

    /// Record a URL whose processing failed.
    pub fn mark_unsaved(&mut self, url: &str) -> Result<()> {
        if self.saved.contains(url) {
            return Ok(());
        }

        if self.unsaved.insert(url.to_string()) {
            self.flush()?;
        }

        Ok(())
    }

    /// Overwrite the unsaved snapshot with the in-memory set.
    pub fn flush(&self) -> Result<()> {
        overwrite_urls(&self.paths.unsaved_log, &self.unsaved)
    }
}

/// Per-user download statistics.
#[derive(Debug, Default)]
pub struct DownloadState {
    pub uid: String,
    pub username: Option<String>,
    pub base_path: Option<PathBuf>,

    // Posts
    pub posts_saved: u64,
    pub posts_failed: u64,
    pub posts_resumed: u64,
    /// Discovered posts already in either log.
    pub posts_skipped: u64,

    // Assets
    pub pic_count: u64,
    pub vid_count: u64,
    pub live_photo_count: u64,
    pub existing_count: u64,
    pub failed_assets: u64,

    /// Unsaved URLs left for the next run.
    pub unsaved_remaining: u64,
}

impl DownloadState {
    /// Create a new download state for a user.
    pub fn new(uid: String) -> Self {
        Self {
            uid,
            ..Default::default()
        }
    }

    /// Count one freshly downloaded asset.
    pub fn record_downloaded(&mut self, kind: MediaKind) {
        match kind {
            MediaKind::Image => self.pic_count += 1,
            MediaKind::Video => self.vid_count += 1,
            MediaKind::LivePhoto => self.live_photo_count += 1,
        }
    }

    pub fn increment_existing(&mut self) {
        self.existing_count += 1;
    }

    pub fn increment_failed_asset(&mut self) {
        self.failed_assets += 1;
    }

    /// Get total downloaded count.
    pub fn total_downloaded(&self) -> u64 {
        self.pic_count + self.vid_count + self.live_photo_count
    }
}

/// Global statistics across all users.
#[derive(Debug, Default)]
pub struct GlobalState {
    pub pic_count: u64,
    pub vid_count: u64,
    pub live_photo_count: u64,
    pub existing_count: u64,
    pub failed_assets: u64,
    pub posts_saved: u64,
    pub posts_failed: u64,
    pub posts_skipped: u64,
    pub users_processed: u64,
    pub users_failed: u64,
    pub users_with_unsaved: u64,
}

impl GlobalState {
    /// Add statistics from a user's download state.
    pub fn add_user_stats(&mut self, state: &DownloadState) {
        self.pic_count += state.pic_count;
        self.vid_count += state.vid_count;
        self.live_photo_count += state.live_photo_count;
        self.existing_count += state.existing_count;
        self.failed_assets += state.failed_assets;
        self.posts_saved += state.posts_saved;
        self.posts_failed += state.posts_failed;
        self.posts_skipped += state.posts_skipped;
        self.users_processed += 1;
        if state.unsaved_remaining > 0 {
            self.users_with_unsaved += 1;
        }
    }

    /// Mark a user as failed.
    pub fn mark_user_failed(&mut self) {
        self.users_failed += 1;
    }

    /// Get total downloaded count.
    pub fn total_downloaded(&self) -> u64 {
        self.pic_count + self.vid_count + self.live_photo_count
    }
}
