//! Configuration validation logic.

use crate::config::loader::Config;
use crate::error::{Error, Result};

/// Validate the entire configuration.
pub fn validate_config(config: &Config) -> Result<()> {
    validate_cookie(&config.target.cookie)?;
    validate_uids(&config.target.uids)?;

    let options = &config.options;
    if options.max_concurrent_downloads == 0 {
        return Err(Error::ConfigValidation {
            field: "max_concurrent_downloads".to_string(),
            message: "Must be at least 1".to_string(),
        });
    }
    if options.download_attempts == 0 {
        return Err(Error::ConfigValidation {
            field: "download_attempts".to_string(),
            message: "Must be at least 1".to_string(),
        });
    }

    let endpoints = &config.endpoints;
    for (field, value) in [
        ("mobile_api", &endpoints.mobile_api),
        ("web_api", &endpoints.web_api),
        ("post_host", &endpoints.post_host),
    ] {
        if value.trim().is_empty() {
            return Err(Error::MissingConfig(format!("endpoints.{}", field)));
        }
    }

    Ok(())
}

/// Validate the session cookie.
pub fn validate_cookie(cookie: &str) -> Result<()> {
    if cookie.trim().is_empty() {
        return Err(Error::MissingConfig(
            "cookie (pass --cookie or set WEIBO_COOKIE)".to_string(),
        ));
    }

    let lower = cookie.to_lowercase();
    if lower.contains("replaceme") || lower.contains("your_cookie") {
        return Err(Error::ConfigValidation {
            field: "cookie".to_string(),
            message: "Cookie appears to be a placeholder. Copy it from a logged-in browser session."
                .to_string(),
        });
    }

    Ok(())
}

/// Validate a single user identifier.
pub fn validate_uid(uid: &str) -> Result<()> {
    if uid.is_empty() || !uid.chars().all(|c| c.is_ascii_digit()) {
        return Err(Error::ConfigValidation {
            field: "uid".to_string(),
            message: format!("UID '{}' must consist of digits only", uid),
        });
    }

    Ok(())
}

/// Validate the list of user identifiers.
pub fn validate_uids<S: AsRef<str>, I: IntoIterator<Item = S>>(uids: I) -> Result<()> {
    let mut any = false;
    for uid in uids {
        validate_uid(uid.as_ref())?;
        any = true;
    }

    if !any {
        return Err(Error::MissingConfig(
            "uids (at least one user identifier required)".to_string(),
        ));
    }

    Ok(())
}
