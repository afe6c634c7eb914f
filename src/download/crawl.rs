//! Per-user crawl: resume unsaved posts, page through the timeline, then
//! persist what is left for the next run.

use futures::StreamExt;

use crate::api::WeiboApi;
use crate::config::{Config, UserTarget};
use crate::download::post::{PostOutcome, PostProcessor};
use crate::download::state::{CrawlState, DownloadState};
use crate::download::timeline::{pace, Timeline};
use crate::error::Result;
use crate::fs::{ensure_dir, UserPaths};

/// Phase of a user crawl.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlPhase {
    Resuming,
    Paginating,
    Draining,
    Done,
}

/// Crawl one user to completion.
///
/// Per-post failures never end the crawl; only filesystem errors on the
/// user folder or its logs do.
pub async fn crawl_user(api: &WeiboApi, config: &Config, target: &UserTarget) -> Result<DownloadState> {
    let uid = target.uid();
    let mut stats = DownloadState::new(uid.to_string());
    let mut timeline = Timeline::new(api, uid, &config.options);

    ensure_dir(target.save_root())?;
    let root = timeline.user_folder(target.save_root()).await?;
    stats.username = Some(timeline.username(uid).await);
    stats.base_path = Some(root.clone());

    let paths = UserPaths::new(root);
    let mut state = CrawlState::load(paths.clone())?;
    let processor = PostProcessor::new(api, config, uid, &paths);
    let mut pacer = Pacer::new(config);

    tracing::info!(
        "Crawling {} ({} saved, {} unsaved)",
        uid,
        state.saved().len(),
        state.unsaved().len()
    );

    let mut phase = CrawlPhase::Resuming;
    log_phase(uid, phase);

    // Snapshot taken once: posts that fail again here wait for the next run.
    let snapshot = state.unsaved_snapshot();
    for url in &snapshot {
        pacer.wait().await;
        let outcome = processor.process(url, &mut stats).await;
        if outcome.is_saved() {
            stats.posts_resumed += 1;
        }
        record(&mut state, &mut stats, url, &outcome)?;
    }

    phase = CrawlPhase::Paginating;
    log_phase(uid, phase);

    let mut pages = timeline.all_pages();
    while let Some(page) = pages.next().await {
        for post in page {
            if state.is_known(&post.url) {
                tracing::debug!("Already seen {}", post.url);
                stats.posts_skipped += 1;
                continue;
            }

            pacer.wait().await;
            let outcome = processor.process(&post.url, &mut stats).await;
            record(&mut state, &mut stats, &post.url, &outcome)?;
        }
    }
    drop(pages);

    phase = CrawlPhase::Draining;
    log_phase(uid, phase);
    state.flush()?;
    stats.unsaved_remaining = state.unsaved().len() as u64;

    phase = CrawlPhase::Done;
    log_phase(uid, phase);
    let absolute = std::fs::canonicalize(&paths.root).unwrap_or_else(|_| paths.root.clone());
    tracing::info!("Files for {} saved in {}", uid, absolute.display());
    stats.base_path = Some(absolute);

    Ok(stats)
}

fn record(
    state: &mut CrawlState,
    stats: &mut DownloadState,
    url: &str,
    outcome: &PostOutcome,
) -> Result<()> {
    match outcome {
        PostOutcome::Saved { .. } => {
            stats.posts_saved += 1;
            state.mark_saved(url)
        }
        PostOutcome::Failed { .. } => {
            stats.posts_failed += 1;
            state.mark_unsaved(url)
        }
    }
}

fn log_phase(uid: &str, phase: CrawlPhase) {
    tracing::debug!("User {}: {:?}", uid, phase);
}

/// Fixed delay between consecutive posts; none before the first.
struct Pacer {
    delay: std::time::Duration,
    jitter_ms: u64,
    started: bool,
}

impl Pacer {
    fn new(config: &Config) -> Self {
        Self {
            delay: config.options.post_delay(),
            jitter_ms: config.options.jitter_ms,
            started: false,
        }
    }

    async fn wait(&mut self) {
        if self.started {
            pace(self.delay, self.jitter_ms).await;
        }
        self.started = true;
    }
}
