//! Configuration module for the weibo-downloader.
//!
//! This module handles:
//! - Loading configuration from TOML files
//! - Configuration validation
//! - Validated per-user crawl targets

pub mod loader;
pub mod target;
pub mod validation;

pub use loader::{Config, EndpointsConfig, OptionsConfig, TargetConfig};
pub use target::UserTarget;
pub use validation::{validate_config, validate_cookie, validate_uid, validate_uids};
