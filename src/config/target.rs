//! A single validated crawl target.

use std::path::{Path, PathBuf};

use crate::config::validation::{validate_cookie, validate_uid};
use crate::error::Result;

/// One user to crawl. Immutable for the duration of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserTarget {
    uid: String,
    cookie: String,
    save_root: PathBuf,
}

impl UserTarget {
    /// Validate and build a target.
    pub fn new(uid: impl Into<String>, cookie: impl Into<String>, save_root: PathBuf) -> Result<Self> {
        let uid = uid.into();
        let cookie = cookie.into();
        validate_uid(&uid)?;
        validate_cookie(&cookie)?;

        Ok(Self {
            uid,
            cookie,
            save_root,
        })
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn cookie(&self) -> &str {
        &self.cookie
    }

    pub fn save_root(&self) -> &Path {
        &self.save_root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_target() {
        let target = UserTarget::new("1923024604", "SUB=abc", PathBuf::from("images")).unwrap();
        assert_eq!(target.uid(), "1923024604");
        assert_eq!(target.save_root(), Path::new("images"));
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(UserTarget::new("abc", "SUB=abc", PathBuf::from(".")).is_err());
        assert!(UserTarget::new("123", "", PathBuf::from(".")).is_err());
    }
}
