//! Weibo Downloader - a resumable crawler for Weibo user timelines
//!
//! This library pages through a user's timeline, resolves every post into
//! its text and media, and stores each post in its own folder. Progress is
//! kept in plain-text logs next to the downloads so an interrupted run picks
//! up where it stopped.
//!
//! # Features
//!
//! - Timeline pagination with pacing
//! - Short-link resolution
//! - Pictures, videos, live photos and mixed-media posts
//! - Truncation checks on downloaded images
//! - Resume of failed posts on the next run
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use weibo_downloader::{crawl_user, Config, UserTarget, WeiboApi};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load(Path::new("config.toml"))?;
//!
//!     for uid in &config.target.uids {
//!         let target = UserTarget::new(uid.as_str(), config.target.cookie.as_str(), config.save_directory())?;
//!         let api = WeiboApi::for_target(&target, &config)?;
//!         let stats = crawl_user(&api, &config, &target).await?;
//!         println!("{}: {} posts saved", uid, stats.posts_saved);
//!     }
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod download;
pub mod error;
pub mod fs;
pub mod ledger;
pub mod media;
pub mod output;

// Re-exports for convenience
pub use api::WeiboApi;
pub use config::{Config, UserTarget};
pub use download::{crawl_user, CrawlState, DownloadState, GlobalState, Timeline};
pub use error::{Error, Result};
pub use media::{ContentResolver, MediaKind, MediaRef, PageType, PostContent, PostRef};
