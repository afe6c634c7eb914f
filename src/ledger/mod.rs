//! Ledger module.
//!
//! Provides:
//! - Loading and snapshotting the saved/unsaved URL sets
//! - Append-only saved, error and failed-asset logs

pub mod tracker;

pub use tracker::{
    append_line, load_urls, overwrite_urls, record_asset_failure, record_error,
};
