//! Error types for the weibo-downloader application.

use thiserror::Error;

/// Main error type for the application.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration value for '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    #[error("Missing required configuration: {0}")]
    MissingConfig(String),

    // API errors
    #[error("API error: {0}")]
    Api(String),

    #[error("User not found or feed unavailable: {0}")]
    UserNotFound(String),

    // Post resolution errors
    #[error("Unresolvable post {url}: {reason}")]
    Unresolvable { url: String, reason: String },

    // Download errors
    #[error("Download failed: {0}")]
    Download(String),

    #[error("Corrupt or incomplete asset after {attempts} attempt(s): {url}")]
    AssetCorrupt { url: String, attempts: u32 },

    // File system errors
    #[error("Invalid filename (path traversal attempt): {0}")]
    InvalidFilename(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // HTTP errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    // URL parsing errors
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl Error {
    /// Build an [`Error::Unresolvable`] for a post URL.
    pub fn unresolvable(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Unresolvable {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error comes from configuration and should stop the run
    /// before any network activity.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Error::Config(_)
                | Error::ConfigValidation { .. }
                | Error::MissingConfig(_)
                | Error::TomlParse(_)
        )
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Process exit codes.
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const API_ERROR: i32 = 2;
    pub const CONFIG_ERROR: i32 = 3;
    pub const DOWNLOAD_ERROR: i32 = 4;
    pub const UNEXPECTED_ERROR: i32 = 5;
    pub const SOME_POSTS_UNSAVED: i32 = 6;
}
