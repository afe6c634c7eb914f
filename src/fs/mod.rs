//! Filesystem module.
//!
//! Provides:
//! - Persisted layout of a user's save directory
//! - Folder-name cleanup for users and posts

pub mod naming;
pub mod paths;

pub use naming::{clean_text, make_excerpt, sanitize_filename, sanitize_path_component};
pub use paths::{ensure_dir, find_user_folder, user_folder_name, UserPaths};
