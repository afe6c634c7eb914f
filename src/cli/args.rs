//! Command-line argument definitions using clap.

use clap::Parser;
use std::path::PathBuf;

use crate::config::Config;

/// Weibo timeline downloader CLI.
#[derive(Parser, Debug, Default)]
#[command(
    name = "weibo-downloader",
    version,
    about = "Download posts, pictures and videos from Weibo user timelines",
    long_about = "A resumable crawler for Weibo user timelines.\n\n\
                  Every post gets its own folder with the post text and media. Posts that \
                  fail are remembered and retried on the next run."
)]
pub struct Args {
    /// Weibo user id(s) to download. Separate several with commas.
    #[arg(short, long, value_delimiter = ',', num_args = 1..)]
    pub uid: Option<Vec<String>>,

    /// File with one user id per line.
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Session cookie header copied from a logged-in browser.
    #[arg(short, long, env = "WEIBO_COOKIE", hide_env_values = true)]
    pub cookie: Option<String>,

    /// Root directory for per-user folders [default: images].
    #[arg(short, long)]
    pub save: Option<PathBuf>,

    /// Path to configuration file.
    #[arg(long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Concurrent media downloads per post.
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Seconds to wait between timeline pages.
    #[arg(long)]
    pub page_interval: Option<u64>,

    /// Seconds to wait between posts.
    #[arg(long)]
    pub post_delay: Option<u64>,

    /// Hide per-post progress bars.
    #[arg(long, short)]
    pub quiet: bool,

    /// Enable debug logging.
    #[arg(long)]
    pub debug: bool,
}

impl Args {
    /// Merge CLI arguments into an existing config, overriding where specified.
    ///
    /// User ids are not merged here; see [`crate::cli::resolve_uids`].
    pub fn merge_into_config(&self, config: &mut Config) {
        if let Some(cookie) = &self.cookie {
            config.target.cookie = cookie.clone();
        }

        if let Some(dir) = &self.save {
            config.target.save_directory = Some(dir.clone());
        }

        if let Some(workers) = self.workers {
            config.options.max_concurrent_downloads = workers;
        }

        if let Some(interval) = self.page_interval {
            config.options.page_interval_seconds = interval;
        }

        if let Some(delay) = self.post_delay {
            config.options.post_delay_seconds = delay;
        }

        if self.quiet {
            config.options.show_downloads = false;
        }
    }
}
