//! Path and directory management.

use std::path::{Path, PathBuf};

use crate::error::Result;

/// Append-only log of fully processed post URLs.
pub const SAVED_LOG: &str = "saved_urls.log";

/// Snapshot of discovered but unfinished post URLs.
pub const UNSAVED_LOG: &str = "unsaved_urls.log";

/// Append-only `uid:path:url` ledger of assets that could not be fetched.
pub const FAILURE_LEDGER: &str = "not_downloaded.txt";

/// Append-only timestamped post failures.
pub const ERROR_LOG: &str = "error.log";

/// Per-post text file.
pub const CONTENT_FILE: &str = "content.txt";

/// Locations of everything persisted for one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserPaths {
    pub root: PathBuf,
    pub saved_log: PathBuf,
    pub unsaved_log: PathBuf,
    pub failure_ledger: PathBuf,
    pub error_log: PathBuf,
}

impl UserPaths {
    pub fn new(root: PathBuf) -> Self {
        Self {
            saved_log: root.join(SAVED_LOG),
            unsaved_log: root.join(UNSAVED_LOG),
            failure_ledger: root.join(FAILURE_LEDGER),
            error_log: root.join(ERROR_LOG),
            root,
        }
    }
}

/// Folder name for a user: `<name>_<uid>`.
pub fn user_folder_name(username: &str, uid: &str) -> String {
    format!("{}_{}", username, uid)
}

/// Look for an existing `<name>_<uid>` folder under `base`.
///
/// Returns the folder and the username encoded in its name.
pub fn find_user_folder(base: &Path, uid: &str) -> Result<Option<(PathBuf, String)>> {
    if !base.exists() {
        return Ok(None);
    }

    for entry in std::fs::read_dir(base)? {
        let entry = entry?;
        let path = entry.path();

        if !path.is_dir() {
            continue;
        }

        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        if let Some((username, folder_uid)) = name.rsplit_once('_') {
            if folder_uid == uid && !username.is_empty() {
                return Ok(Some((path.clone(), username.to_string())));
            }
        }
    }

    Ok(None)
}

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}
