//! Command-line interface: arguments and user id list resolution.

pub mod args;
pub mod uids;

pub use args::Args;
pub use uids::{read_uid_file, resolve_uids, DEFAULT_UIDS, UID_FILE};
