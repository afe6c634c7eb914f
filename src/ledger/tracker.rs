//! Durable URL sets and append-only ledgers.
//!
//! The tracker only reads and writes files; keeping the saved and unsaved
//! sets disjoint is the caller's job.

use std::collections::BTreeSet;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use chrono::Local;

use crate::error::Result;

/// Load a newline-delimited URL set. A missing file is an empty set.
pub fn load_urls(path: &Path) -> Result<BTreeSet<String>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeSet::new()),
        Err(e) => return Err(e.into()),
    };

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Replace the file with exactly `urls`, one per line.
///
/// Writes a sibling temporary file and renames it over the target so a
/// crash leaves either the old or the new snapshot.
pub fn overwrite_urls(path: &Path, urls: &BTreeSet<String>) -> Result<()> {
    let mut content = String::new();
    for url in urls {
        content.push_str(url);
        content.push('\n');
    }

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("urls");
    let temp = path.with_file_name(format!(".{}.tmp", file_name));

    fs::write(&temp, content)?;
    fs::rename(&temp, path)?;
    Ok(())
}

/// Append one line to a log, creating it if needed.
pub fn append_line(path: &Path, line: &str) -> Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(format!("{}\n", line).as_bytes())?;
    Ok(())
}

/// Record a post failure: `[YYYY-mm-dd HH:MM:SS] URL: <url> - Error: <message>`.
pub fn record_error(path: &Path, url: &str, message: &str) -> Result<()> {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
    append_line(
        path,
        &format!("[{}] URL: {} - Error: {}", timestamp, url, message),
    )
}

/// Record an asset that could not be downloaded: `<uid>:<path>:<url>`.
pub fn record_asset_failure(ledger: &Path, uid: &str, destination: &Path, url: &str) -> Result<()> {
    append_line(
        ledger,
        &format!("{}:{}:{}", uid, destination.display(), url),
    )
}
