//! Single post processing: resolve, write text, fetch media.

use std::path::{Path, PathBuf};

use crate::api::WeiboApi;
use crate::config::Config;
use crate::download::media::{AssetOutcome, MediaDownloader};
use crate::download::state::DownloadState;
use crate::error::{Error, Result};
use crate::fs::paths::CONTENT_FILE;
use crate::fs::{ensure_dir, sanitize_path_component, UserPaths};
use crate::ledger::record_error;
use crate::media::{ContentResolver, PostContent};
use crate::output::create_asset_bar;

/// Result of processing one post URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostOutcome {
    Saved { folder: PathBuf },
    Failed { reason: String },
}

impl PostOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, PostOutcome::Saved { .. })
    }
}

/// Processes post URLs for one user. Nothing below [`PostProcessor::process`]
/// escapes as an error.
pub struct PostProcessor<'a> {
    resolver: ContentResolver<'a>,
    downloader: MediaDownloader<'a>,
    paths: &'a UserPaths,
    show_progress: bool,
}

impl<'a> PostProcessor<'a> {
    pub fn new(api: &'a WeiboApi, config: &Config, uid: &'a str, paths: &'a UserPaths) -> Self {
        Self {
            resolver: ContentResolver::new(api, config.options.excerpt_length),
            downloader: MediaDownloader::new(api, uid, &paths.failure_ledger, &config.options),
            paths,
            show_progress: config.options.show_downloads,
        }
    }

    /// Process one post. Failures are written to `error.log`.
    pub async fn process(&self, url: &str, stats: &mut DownloadState) -> PostOutcome {
        match self.download(url, stats).await {
            Ok(folder) => {
                tracing::info!("Saved {}", url);
                PostOutcome::Saved { folder }
            }
            Err(e) => {
                let reason = e.to_string();
                tracing::warn!("Post {} failed: {}", url, reason);
                if let Err(log_err) = record_error(&self.paths.error_log, url, &reason) {
                    tracing::error!("Could not write error log: {}", log_err);
                }
                PostOutcome::Failed { reason }
            }
        }
    }

    async fn download(&self, url: &str, stats: &mut DownloadState) -> Result<PathBuf> {
        let content = self.resolver.resolve(url).await?;

        let folder_name = sanitize_path_component(&content.folder_name())?;
        let folder = self.paths.root.join(&folder_name);
        ensure_dir(&folder)?;
        write_content(&folder, &content)?;

        if content.media.is_empty() {
            tracing::debug!("{} post without media: {}", content.page_type, url);
            return Ok(folder);
        }

        let progress = self
            .show_progress
            .then(|| create_asset_bar(content.media.len() as u64, &folder_name));

        let outcomes = self
            .downloader
            .fetch_all(&content.media, &folder, progress.as_ref())
            .await;

        if let Some(bar) = progress {
            bar.finish_and_clear();
        }

        let mut failed = 0;
        for outcome in &outcomes {
            match outcome {
                AssetOutcome::Downloaded { kind, .. } => stats.record_downloaded(*kind),
                AssetOutcome::AlreadyPresent { .. } => stats.increment_existing(),
                AssetOutcome::Failed { .. } => {
                    stats.increment_failed_asset();
                    failed += 1;
                }
            }
        }

        if failed > 0 {
            return Err(Error::Download(format!(
                "{} of {} asset(s) could not be downloaded",
                failed,
                outcomes.len()
            )));
        }

        Ok(folder)
    }
}

/// Write `content.txt` for a post.
fn write_content(folder: &Path, content: &PostContent) -> Result<()> {
    std::fs::write(
        folder.join(CONTENT_FILE),
        format!("URL: {}\nContent: {}\n", content.url, content.text),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const JPEG_OK: &[u8] = &[0xFF, 0xD8, 0x00, 0xFF, 0xD9];

    async fn mount_post(server: &MockServer, id: &str, pics: &[&str]) {
        let pic_infos: serde_json::Map<String, serde_json::Value> = pics
            .iter()
            .map(|pic| {
                (
                    pic.to_string(),
                    json!({"type": "pic", "largest": {"url": format!("{}/large/{}.jpg", server.uri(), pic)}}),
                )
            })
            .collect();

        Mock::given(method("GET"))
            .and(path("/ajax/statuses/show"))
            .and(query_param("id", id))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "created_at": "Tue Mar 05 21:14:07 +0800 2024",
                "text_raw": "Hello world",
                "pic_ids": pics,
                "pic_num": pics.len(),
                "pic_infos": pic_infos
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_process_saves_post() {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        mount_post(&server, "P1", &["a1"]).await;

        Mock::given(method("GET"))
            .and(path("/large/a1.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(JPEG_OK))
            .mount(&server)
            .await;

        let config = Config::for_mock_server(&server.uri(), "SUB=test");
        let api = WeiboApi::from_config(&config).unwrap();
        let paths = UserPaths::new(dir.path().to_path_buf());
        let processor = PostProcessor::new(&api, &config, "123", &paths);
        let mut stats = DownloadState::new("123".into());

        let url = "https://weibo.com/123/P1";
        let outcome = processor.process(url, &mut stats).await;

        let folder = dir.path().join("2024-03-05_21-14-07_Hello world");
        assert_eq!(outcome, PostOutcome::Saved { folder: folder.clone() });
        assert_eq!(
            std::fs::read_to_string(folder.join("content.txt")).unwrap(),
            "URL: https://weibo.com/123/P1\nContent: Hello world\n"
        );
        assert_eq!(std::fs::read(folder.join("a1.jpg")).unwrap(), JPEG_OK);
        assert_eq!(stats.pic_count, 1);
        assert!(!paths.error_log.exists());
    }

    #[tokio::test]
    async fn test_asset_failure_fails_post() {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        mount_post(&server, "P2", &["ok", "gone"]).await;

        Mock::given(method("GET"))
            .and(path("/large/ok.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(JPEG_OK))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/large/gone.jpg"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let config = Config::for_mock_server(&server.uri(), "SUB=test");
        let api = WeiboApi::from_config(&config).unwrap();
        let paths = UserPaths::new(dir.path().to_path_buf());
        let processor = PostProcessor::new(&api, &config, "123", &paths);
        let mut stats = DownloadState::new("123".into());

        let outcome = processor.process("https://weibo.com/123/P2", &mut stats).await;

        assert!(!outcome.is_saved());
        assert_eq!(stats.pic_count, 1);
        assert_eq!(stats.failed_assets, 1);
        assert!(std::fs::read_to_string(&paths.error_log)
            .unwrap()
            .contains("URL: https://weibo.com/123/P2 - Error:"));
        assert_eq!(
            std::fs::read_to_string(&paths.failure_ledger)
                .unwrap()
                .lines()
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn test_unresolvable_post_is_logged() {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/ajax/statuses/show"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let config = Config::for_mock_server(&server.uri(), "SUB=test");
        let api = WeiboApi::from_config(&config).unwrap();
        let paths = UserPaths::new(dir.path().to_path_buf());
        let processor = PostProcessor::new(&api, &config, "123", &paths);
        let mut stats = DownloadState::new("123".into());

        let outcome = processor.process("https://weibo.com/123/Bad", &mut stats).await;

        assert!(matches!(outcome, PostOutcome::Failed { .. }));
        assert_eq!(
            std::fs::read_to_string(&paths.error_log).unwrap().lines().count(),
            1
        );
    }

    #[tokio::test]
    async fn test_login_page_is_unresolvable() {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/ajax/statuses/show"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(format!("{}请先登录微博", "a".repeat(199))),
            )
            .mount(&server)
            .await;

        let config = Config::for_mock_server(&server.uri(), "SUB=test");
        let api = WeiboApi::from_config(&config).unwrap();
        let paths = UserPaths::new(dir.path().to_path_buf());
        let processor = PostProcessor::new(&api, &config, "123", &paths);
        let mut stats = DownloadState::new("123".into());

        let outcome = processor.process("https://weibo.com/123/X1", &mut stats).await;

        assert!(matches!(outcome, PostOutcome::Failed { .. }));
        assert!(std::fs::read_to_string(&paths.error_log)
            .unwrap()
            .contains("URL: https://weibo.com/123/X1 - Error:"));
    }
}
