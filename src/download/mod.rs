//! Download module for crawling users.
//!
//! This module provides:
//! - Crawl state and download statistics
//! - Timeline pagination
//! - Per-post processing
//! - Media file downloading
//! - The per-user crawl loop

pub mod crawl;
pub mod media;
pub mod post;
pub mod state;
pub mod timeline;

pub use crawl::{crawl_user, CrawlPhase};
pub use media::{AssetOutcome, MediaDownloader};
pub use post::{PostOutcome, PostProcessor};
pub use state::{CrawlState, DownloadState, GlobalState};
pub use timeline::{FeedHandle, Timeline};
