//! Filename generation and text cleanup for folder names.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Error, Result};

fn markup_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"<[^>]+>").unwrap())
}

fn whitespace_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\s+").unwrap())
}

fn excerpt_filter_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[^\p{Han}a-zA-Z0-9_\s-]").unwrap())
}

/// Strip markup and collapse whitespace.
pub fn clean_text(raw: &str) -> String {
    let stripped = markup_pattern().replace_all(raw, "");
    whitespace_pattern()
        .replace_all(&stripped, " ")
        .trim()
        .to_string()
}

/// Short excerpt of post text, safe to use inside a folder name.
///
/// Keeps CJK characters, ASCII alphanumerics, `_`, `-` and spaces, then
/// truncates to `max_chars` characters.
pub fn make_excerpt(raw: &str, max_chars: usize) -> String {
    let cleaned = clean_text(raw);
    let filtered = excerpt_filter_pattern().replace_all(&cleaned, "");
    let collapsed = whitespace_pattern().replace_all(&filtered, " ");

    let truncated: String = collapsed.trim().chars().take(max_chars).collect();
    sanitize_filename(truncated.trim_end())
}

/// Remove characters that are invalid or awkward in file names.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .filter(|c| {
            !matches!(
                c,
                '\\' | '/' | '*' | '?' | ':' | '"' | '<' | '>' | '|' | '【' | '】' | '！'
            ) && !c.is_control()
        })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Sanitize a path component (folder name derived from remote data).
///
/// Rejects traversal patterns; replaces separators and reserved characters.
pub fn sanitize_path_component(name: &str) -> Result<String> {
    if name.contains("..") {
        return Err(Error::InvalidFilename(format!(
            "Path traversal detected: '{}'",
            name
        )));
    }

    if name.contains('\0') {
        return Err(Error::InvalidFilename(format!(
            "Null bytes not allowed: '{}'",
            name
        )));
    }

    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.trim().is_empty() {
        return Err(Error::InvalidFilename(
            "Path component cannot be empty or whitespace-only".to_string(),
        ));
    }

    Ok(sanitized.trim().to_string())
}
