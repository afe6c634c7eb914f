//! Weibo Downloader - CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use weibo_downloader::{
    api::WeiboApi,
    cli::{resolve_uids, Args},
    config::{validate_config, Config, UserTarget},
    download::{crawl_user, GlobalState},
    error::{exit_codes, Error, Result},
    output::{
        print_banner, print_config_summary, print_error, print_global_stats, print_info,
        print_success, print_user_stats, print_warning,
    },
};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(global) if global.users_with_unsaved > 0 => {
            print_warning(&format!(
                "{} user(s) have posts left for the next run",
                global.users_with_unsaved
            ));
            ExitCode::from(exit_codes::SOME_POSTS_UNSAVED as u8)
        }
        Ok(_) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(e) => {
            print_error(&format!("{}", e));
            match e {
                e if e.is_config() => ExitCode::from(exit_codes::CONFIG_ERROR as u8),
                Error::Api(_) | Error::UserNotFound(_) | Error::Http(_) => {
                    ExitCode::from(exit_codes::API_ERROR as u8)
                }
                Error::Download(_) | Error::AssetCorrupt { .. } => {
                    ExitCode::from(exit_codes::DOWNLOAD_ERROR as u8)
                }
                _ => ExitCode::from(exit_codes::UNEXPECTED_ERROR as u8),
            }
        }
    }
}

async fn run() -> Result<GlobalState> {
    // Parse CLI arguments
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    fmt().with_env_filter(filter).with_target(false).init();

    print_banner();

    // Load configuration
    let mut config = if args.config.exists() {
        Config::load(&args.config)?
    } else {
        print_info(&format!(
            "No configuration file at {}, using defaults and CLI arguments",
            args.config.display()
        ));
        Config::default()
    };

    args.merge_into_config(&mut config);
    config.target.uids = resolve_uids(
        args.uid.as_deref(),
        args.file.as_deref(),
        &config.target.uids,
    );

    // Everything is validated before the first request.
    validate_config(&config)?;
    let save_root = config.save_directory();
    let targets = config
        .target
        .uids
        .iter()
        .map(|uid| UserTarget::new(uid.as_str(), config.target.cookie.as_str(), save_root.clone()))
        .collect::<Result<Vec<_>>>()?;

    print_config_summary(
        &config.target.uids,
        &save_root,
        config.options.max_concurrent_downloads,
    );

    let mut global_state = GlobalState::default();

    for target in &targets {
        print_info(&format!("Processing user: {}", target.uid()));
        let api = WeiboApi::for_target(target, &config)?;

        match crawl_user(&api, &config, target).await {
            Ok(state) => {
                print_user_stats(&state);
                if let Some(path) = &state.base_path {
                    print_success(&format!("Saved to {}", path.display()));
                }
                global_state.add_user_stats(&state);
            }
            Err(e) => {
                print_error(&format!("Failed to process {}: {}", target.uid(), e));
                global_state.mark_user_failed();
            }
        }
    }

    print_global_stats(&global_state);

    if global_state.users_failed > 0 && global_state.users_processed == 0 {
        return Err(Error::Download(format!(
            "{} user(s) failed",
            global_state.users_failed
        )));
    }

    Ok(global_state)
}
