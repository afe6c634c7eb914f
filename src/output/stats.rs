//! Statistics reporting.

use console::style;

use crate::download::{DownloadState, GlobalState};

/// Print statistics for a single user.
pub fn print_user_stats(state: &DownloadState) {
    let username = state.username.as_deref().unwrap_or(&state.uid);

    println!();
    println!("{}", style(format!("Statistics for {}:", username)).bold());
    println!("  Posts saved:   {}", state.posts_saved);
    if state.posts_resumed > 0 {
        println!("    (resumed:    {})", state.posts_resumed);
    }
    if state.posts_failed > 0 {
        println!("  Posts failed:  {}", style(state.posts_failed).red());
    }
    println!("  Posts skipped: {}", state.posts_skipped);
    println!("  Pictures:      {}", state.pic_count);
    println!("  Videos:        {}", state.vid_count);
    println!("  Live photos:   {}", state.live_photo_count);
    println!("  Already there: {}", state.existing_count);
    if state.failed_assets > 0 {
        println!("  Failed assets: {}", style(state.failed_assets).red());
    }
    if state.unsaved_remaining > 0 {
        println!(
            "  {} post(s) left for the next run",
            style(state.unsaved_remaining).yellow()
        );
    }
    println!("  Total:         {} downloaded", state.total_downloaded());
}

/// Print global statistics across all users.
pub fn print_global_stats(state: &GlobalState) {
    println!();
    println!("{}", style("═".repeat(50)).dim());
    println!("{}", style("Global Statistics:").bold());
    println!("  Users processed: {}", state.users_processed);
    if state.users_failed > 0 {
        println!("  Users failed:    {}", style(state.users_failed).red());
    }
    println!("  Posts saved:     {}", state.posts_saved);
    if state.posts_failed > 0 {
        println!("  Posts failed:    {}", style(state.posts_failed).red());
    }
    print_summary(
        state.pic_count,
        state.vid_count,
        state.live_photo_count,
        state.existing_count,
    );
    println!("{}", style("═".repeat(50)).dim());
}

/// Print a summary line for quick viewing.
pub fn print_summary(pics: u64, vids: u64, live_photos: u64, existing: u64) {
    println!(
        "Downloaded: {} pics, {} vids, {} live photos ({} already present)",
        style(pics).green(),
        style(vids).green(),
        style(live_photos).green(),
        style(existing).yellow()
    );
}
