//! User id list resolution.

use std::path::{Path, PathBuf};

use crate::error::Result;

/// Name of the bundled user id list.
pub const UID_FILE: &str = "uids.txt";

/// Users crawled when nothing else is given.
pub const DEFAULT_UIDS: [&str; 2] = ["1923024604", "5491928243"];

/// Read a user id list: one id per line, blank lines and `#` comments ignored.
pub fn read_uid_file(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

/// Pick the user ids for this run.
///
/// Order: `--uid`, `--file`, `[target] uids` from the config file, then
/// `uids.txt` beside the executable or in the working directory, then
/// [`DEFAULT_UIDS`]. A list that is missing or empty falls through to the
/// next source.
pub fn resolve_uids(
    cli_uids: Option<&[String]>,
    file: Option<&Path>,
    configured: &[String],
) -> Vec<String> {
    if let Some(uids) = cli_uids.filter(|u| !u.is_empty()) {
        return uids.iter().map(|u| u.trim().to_string()).collect();
    }

    if let Some(path) = file {
        match read_uid_file(path) {
            Ok(uids) if !uids.is_empty() => return uids,
            Ok(_) => tracing::warn!("User id file {} is empty", path.display()),
            Err(e) => tracing::warn!("Could not read user id file {}: {}", path.display(), e),
        }
    }

    if !configured.is_empty() {
        return configured.to_vec();
    }

    for candidate in bundled_uid_files() {
        if let Ok(uids) = read_uid_file(&candidate) {
            if !uids.is_empty() {
                tracing::info!("Using user ids from {}", candidate.display());
                return uids;
            }
        }
    }

    tracing::info!("No user ids given, using the default list");
    DEFAULT_UIDS.iter().map(|u| u.to_string()).collect()
}

fn bundled_uid_files() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Some(dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        candidates.push(dir.join(UID_FILE));
    }
    candidates.push(PathBuf::from(UID_FILE));

    candidates
}
