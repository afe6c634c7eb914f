//! Weibo API module.
//!
//! This module provides:
//! - HTTP client for the mobile container API and the web post API
//! - Short-link resolution
//! - API response types

pub mod client;
pub mod types;

pub use client::WeiboApi;
pub use types::*;
