//! Timeline pagination and user folder resolution.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::stream::{self, LocalBoxStream, StreamExt};
use rand::Rng;
use tokio::time::sleep;

use crate::api::{FeedPage, WeiboApi, POST_CARD_TYPE};
use crate::config::OptionsConfig;
use crate::error::{Error, Result};
use crate::fs::{ensure_dir, find_user_folder, sanitize_filename, user_folder_name};
use crate::media::PostRef;

/// Sleep for `base` plus up to `jitter_ms` random milliseconds.
pub(crate) async fn pace(base: Duration, jitter_ms: u64) {
    let jitter = if jitter_ms > 0 {
        rand::thread_rng().gen_range(0..=jitter_ms)
    } else {
        0
    };
    let delay = base + Duration::from_millis(jitter);
    if !delay.is_zero() {
        sleep(delay).await;
    }
}

/// Opaque reference to a user's timeline container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedHandle {
    pub containerid: String,
}

/// Pages through one user's timeline.
///
/// Owns the username cache for the run; a `<name>_<uid>` folder already on
/// disk stands in for a lookup. The profile fetched for the owner's name also
/// supplies the feed handle.
pub struct Timeline<'a> {
    api: &'a WeiboApi,
    uid: String,
    interval: Duration,
    jitter_ms: u64,
    usernames: HashMap<String, String>,
    feed_handle: Option<FeedHandle>,
}

impl<'a> Timeline<'a> {
    pub fn new(api: &'a WeiboApi, uid: impl Into<String>, options: &OptionsConfig) -> Self {
        Self {
            api,
            uid: uid.into(),
            interval: options.page_interval(),
            jitter_ms: options.jitter_ms,
            usernames: HashMap::new(),
            feed_handle: None,
        }
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    /// Find the container id of the user's timeline tab.
    pub async fn resolve_feed_handle(&self) -> Result<FeedHandle> {
        if let Some(handle) = &self.feed_handle {
            return Ok(handle.clone());
        }

        let profile = self.api.get_profile(&self.uid).await?;

        let containerid = profile
            .timeline_container()
            .ok_or_else(|| Error::UserNotFound(self.uid.clone()))?;

        Ok(FeedHandle {
            containerid: containerid.to_string(),
        })
    }

    /// Lazily page through a timeline, starting at page 1.
    ///
    /// Ends at the first page without posts or the first failed request.
    pub fn pages(&self, handle: FeedHandle) -> LocalBoxStream<'_, Vec<PostRef>> {
        stream::unfold(Some(1u32), move |next| {
            let handle = handle.clone();
            async move {
                let Some(page) = next else {
                    return None;
                };
                if page > 1 {
                    pace(self.interval, self.jitter_ms).await;
                }

                match self.api.get_feed_page(&handle.containerid, page).await {
                    Ok(feed) => {
                        let posts = self.post_refs(&feed);
                        if posts.is_empty() {
                            tracing::info!("Page {} has no posts, timeline finished", page);
                            return None;
                        }
                        tracing::info!("Page {}: found {} post(s)", page, posts.len());
                        Some((posts, page.checked_add(1)))
                    }
                    Err(e) => {
                        tracing::warn!("Failed to fetch page {}: {}", page, e);
                        None
                    }
                }
            }
        })
        .boxed_local()
    }

    /// Resolve the feed handle and page through it. A handle failure yields
    /// an empty stream.
    pub fn all_pages(&self) -> LocalBoxStream<'_, Vec<PostRef>> {
        stream::once(self.resolve_feed_handle())
            .flat_map(move |result| match result {
                Ok(handle) => self.pages(handle),
                Err(e) => {
                    tracing::warn!("No timeline for user {}: {}", self.uid, e);
                    stream::empty().boxed_local()
                }
            })
            .boxed_local()
    }

    fn post_refs(&self, feed: &FeedPage) -> Vec<PostRef> {
        let host = &self.api.endpoints().post_host;

        feed.cards
            .iter()
            .filter(|card| card.card_type == Some(POST_CARD_TYPE))
            .filter_map(|card| {
                let mblog = card.mblog.as_ref()?;
                let user_id = mblog.user.as_ref()?.id.as_deref()?;
                let bid = mblog.bid.as_deref()?;
                PostRef::from_parts(host, user_id, bid)
            })
            .collect()
    }

    /// Screen name of a user, looked up once per run.
    pub async fn username(&mut self, uid: &str) -> String {
        if let Some(name) = self.usernames.get(uid) {
            return name.clone();
        }

        let name = match self.api.get_profile(uid).await {
            Ok(profile) => {
                if uid == self.uid {
                    self.feed_handle = profile.timeline_container().map(|id| FeedHandle {
                        containerid: id.to_string(),
                    });
                }
                profile
                    .user_info
                    .and_then(|info| info.screen_name)
                    .map(|name| sanitize_filename(&name))
                    .filter(|name| !name.is_empty())
            }
            Err(e) => {
                tracing::warn!("Could not look up username for {}: {}", uid, e);
                None
            }
        }
        .unwrap_or_else(|| format!("user_{}", uid));

        self.usernames.insert(uid.to_string(), name.clone());
        name
    }

    /// Save directory of this user under `base`, created if needed.
    pub async fn user_folder(&mut self, base: &Path) -> Result<PathBuf> {
        if let Some((path, name)) = find_user_folder(base, &self.uid)? {
            tracing::debug!("Reusing folder {}", path.display());
            self.usernames.insert(self.uid.clone(), name);
            return Ok(path);
        }

        let uid = self.uid.clone();
        let name = self.username(&uid).await;
        let path = base.join(user_folder_name(&name, &uid));
        ensure_dir(&path)?;
        Ok(path)
    }
}
