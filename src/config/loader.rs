//! Configuration structures and loading logic.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub target: TargetConfig,

    #[serde(default)]
    pub options: OptionsConfig,

    #[serde(default)]
    pub endpoints: EndpointsConfig,
}

/// Crawl target configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetConfig {
    /// User identifiers to crawl, in order.
    #[serde(default)]
    pub uids: Vec<String>,

    /// Session cookie header value sent with every request.
    #[serde(default)]
    pub cookie: String,

    /// Root directory that per-user folders are created under.
    #[serde(default)]
    pub save_directory: Option<PathBuf>,
}

/// Crawl and download options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionsConfig {
    /// Seconds to wait between timeline page requests.
    #[serde(default = "default_page_interval")]
    pub page_interval_seconds: u64,

    /// Seconds to wait between posts.
    #[serde(default = "default_post_delay")]
    pub post_delay_seconds: u64,

    /// Upper bound of random milliseconds added to every pacing delay.
    #[serde(default = "default_jitter")]
    pub jitter_ms: u64,

    /// Concurrent asset downloads within one post.
    #[serde(default = "default_workers")]
    pub max_concurrent_downloads: usize,

    /// Application-level attempts per asset.
    #[serde(default = "default_attempts")]
    pub download_attempts: u32,

    /// Retries on connect/timeout errors underneath each attempt.
    #[serde(default = "default_transport_retries")]
    pub transport_retries: u32,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,

    /// Read timeout for media transfers.
    #[serde(default = "default_read_timeout")]
    pub read_timeout_seconds: u64,

    /// Read timeout for JSON API calls.
    #[serde(default = "default_api_timeout")]
    pub api_timeout_seconds: u64,

    /// Characters of post text kept in folder names.
    #[serde(default = "default_excerpt_length")]
    pub excerpt_length: usize,

    /// Whether to show per-post progress.
    #[serde(default = "default_true")]
    pub show_downloads: bool,

    /// Browser user agent string.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for OptionsConfig {
    fn default() -> Self {
        Self {
            page_interval_seconds: default_page_interval(),
            post_delay_seconds: default_post_delay(),
            jitter_ms: default_jitter(),
            max_concurrent_downloads: default_workers(),
            download_attempts: default_attempts(),
            transport_retries: default_transport_retries(),
            connect_timeout_seconds: default_connect_timeout(),
            read_timeout_seconds: default_read_timeout(),
            api_timeout_seconds: default_api_timeout(),
            excerpt_length: default_excerpt_length(),
            show_downloads: true,
            user_agent: default_user_agent(),
        }
    }
}

impl OptionsConfig {
    pub fn page_interval(&self) -> Duration {
        Duration::from_secs(self.page_interval_seconds)
    }

    pub fn post_delay(&self) -> Duration {
        Duration::from_secs(self.post_delay_seconds)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_seconds)
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_seconds)
    }
}

/// Remote endpoints. Overridable so the crawler can be pointed at a mirror
/// or a local mock server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointsConfig {
    /// Base URL of the mobile API (profile and feed pages).
    #[serde(default = "default_mobile_api")]
    pub mobile_api: String,

    /// Base URL of the web API (post detail).
    #[serde(default = "default_web_api")]
    pub web_api: String,

    /// Host used when composing canonical post URLs.
    #[serde(default = "default_post_host")]
    pub post_host: String,

    /// Hosts whose URLs are short links that must be resolved by redirect.
    #[serde(default = "default_short_link_hosts")]
    pub short_link_hosts: Vec<String>,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            mobile_api: default_mobile_api(),
            web_api: default_web_api(),
            post_host: default_post_host(),
            short_link_hosts: default_short_link_hosts(),
        }
    }
}

fn default_page_interval() -> u64 {
    3
}

fn default_post_delay() -> u64 {
    1
}

fn default_jitter() -> u64 {
    500
}

fn default_workers() -> usize {
    10
}

fn default_attempts() -> u32 {
    3
}

fn default_transport_retries() -> u32 {
    5
}

fn default_connect_timeout() -> u64 {
    5
}

fn default_read_timeout() -> u64 {
    10
}

fn default_api_timeout() -> u64 {
    15
}

fn default_excerpt_length() -> usize {
    20
}

fn default_true() -> bool {
    true
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36".to_string()
}

fn default_mobile_api() -> String {
    "https://m.weibo.cn".to_string()
}

fn default_web_api() -> String {
    "https://weibo.com".to_string()
}

fn default_post_host() -> String {
    "weibo.com".to_string()
}

fn default_short_link_hosts() -> Vec<String> {
    vec!["t.cn".to_string()]
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::Config(format!(
                    "Configuration file not found: {}",
                    path.display()
                ))
            } else {
                Error::Io(e)
            }
        })?;

        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Get the effective save root.
    pub fn save_directory(&self) -> PathBuf {
        self.target
            .save_directory
            .clone()
            .unwrap_or_else(|| PathBuf::from("images"))
    }

    /// Configuration suited to tests: no pacing delays, endpoints on `base`.
    #[cfg(test)]
    pub fn for_mock_server(base: &str, cookie: &str) -> Self {
        let mut config = Config::default();
        config.target.cookie = cookie.to_string();
        config.options.page_interval_seconds = 0;
        config.options.post_delay_seconds = 0;
        config.options.jitter_ms = 0;
        config.options.transport_retries = 0;
        config.options.show_downloads = false;
        config.endpoints.mobile_api = base.to_string();
        config.endpoints.web_api = base.to_string();
        config
    }
}
