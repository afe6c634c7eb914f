//! Post payload parsing: page-type classification and media extraction.

use chrono::{DateTime, Local};

use crate::api::types::{MediaInfo, StatusDetail};
use crate::error::{Error, Result};
use crate::media::item::{MediaKind, MediaRef, PageType};

/// Format of `created_at` in post payloads, e.g. `Tue Mar 05 21:14:07 +0800 2024`.
const CREATED_AT_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

/// Format of the publish time in folder names.
pub const FOLDER_TIME_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Picture type marking a live photo in `pic_infos`.
const LIVE_PHOTO_TYPE: &str = "livephoto";

/// Parse the publish time, falling back to the current time.
pub fn parse_publish_time(created_at: Option<&str>) -> String {
    match created_at.map(|s| DateTime::parse_from_str(s.trim(), CREATED_AT_FORMAT)) {
        Some(Ok(dt)) => dt.format(FOLDER_TIME_FORMAT).to_string(),
        Some(Err(e)) => {
            tracing::warn!("Unparsable publish time ({}), using current time", e);
            Local::now().format(FOLDER_TIME_FORMAT).to_string()
        }
        None => {
            tracing::warn!("Post has no publish time, using current time");
            Local::now().format(FOLDER_TIME_FORMAT).to_string()
        }
    }
}

/// Decide which extraction rule applies to a payload.
///
/// Priority: mixed-media container, then picture list with a count, then
/// video media info. A picture list that is present but empty does not
/// claim the post, so plain video posts still classify as video.
pub fn classify(detail: &StatusDetail) -> PageType {
    if detail.mix_media_info.is_some() {
        return PageType::Multimedia;
    }

    if let (Some(pic_ids), Some(_)) = (&detail.pic_ids, detail.pic_num) {
        if !pic_ids.is_empty() {
            return PageType::Images;
        }
    }

    if detail
        .page_info
        .as_ref()
        .is_some_and(|page| page.media_info.is_some())
    {
        return PageType::Video;
    }

    PageType::Unknown
}

/// Extract the media list for a classified payload.
///
/// A media item that should exist but carries no usable URL makes the whole
/// post unresolvable, so it is retried on a later run instead of being
/// saved incomplete.
pub fn extract_media(detail: &StatusDetail, page_type: PageType, post_url: &str) -> Result<Vec<MediaRef>> {
    let missing = |what: String| Error::unresolvable(post_url, what);
    let mut media = Vec::new();

    match page_type {
        PageType::Multimedia => {
            let items = detail
                .mix_media_info
                .as_ref()
                .map(|m| m.items.as_slice())
                .unwrap_or_default();

            for (index, item) in items.iter().enumerate() {
                match item.kind.as_str() {
                    "pic" => {
                        let pic_id = item
                            .data
                            .pic_id
                            .clone()
                            .ok_or_else(|| missing(format!("mixed item {} has no pic_id", index)))?;
                        let url = item
                            .data
                            .largest
                            .as_ref()
                            .and_then(|l| non_empty(l.url.as_deref()))
                            .ok_or_else(|| missing(format!("picture {} has no URL", pic_id)))?;
                        media.push(MediaRef::new(url, pic_id, MediaKind::Image));
                    }
                    "video" => {
                        let info = item
                            .data
                            .media_info
                            .as_ref()
                            .ok_or_else(|| missing(format!("mixed item {} has no media_info", index)))?;
                        let url = first_non_empty(&[
                            info.mp4_720p_mp4.as_deref(),
                            info.stream_url_hd.as_deref(),
                        ]);
                        media.push(video_ref(info, url, post_url)?);
                    }
                    other => {
                        tracing::debug!("Skipping mixed media item of type '{}'", other);
                    }
                }
            }
        }
        PageType::Images => {
            for pic_id in detail.pic_ids.iter().flatten() {
                let info = detail
                    .pic_infos
                    .get(pic_id)
                    .ok_or_else(|| missing(format!("picture {} has no pic_infos entry", pic_id)))?;

                if info.kind.as_deref() == Some(LIVE_PHOTO_TYPE) {
                    let url = non_empty(info.video.as_deref())
                        .ok_or_else(|| missing(format!("live photo {} has no video", pic_id)))?;
                    media.push(MediaRef::new(url, pic_id.clone(), MediaKind::LivePhoto));
                } else {
                    let url = info
                        .largest
                        .as_ref()
                        .and_then(|l| non_empty(l.url.as_deref()))
                        .ok_or_else(|| missing(format!("picture {} has no URL", pic_id)))?;
                    media.push(MediaRef::new(url, pic_id.clone(), MediaKind::Image));
                }
            }
        }
        PageType::Video => {
            if let Some(info) = detail.page_info.as_ref().and_then(|p| p.media_info.as_ref()) {
                let url = first_non_empty(&[
                    info.playback_list
                        .first()
                        .and_then(|p| p.play_info.url.as_deref()),
                    info.mp4_720p_mp4.as_deref(),
                    info.stream_url_hd.as_deref(),
                ]);
                media.push(video_ref(info, url, post_url)?);
            }
        }
        PageType::Unknown => {}
    }

    Ok(media)
}

fn video_ref(info: &MediaInfo, url: Option<&str>, post_url: &str) -> Result<MediaRef> {
    let media_id = info
        .media_id
        .as_deref()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| Error::unresolvable(post_url, "video has no media_id"))?;
    let url = url.ok_or_else(|| {
        Error::unresolvable(post_url, format!("video {} has no playable URL", media_id))
    })?;

    Ok(MediaRef::new(url, media_id, MediaKind::Video))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}

fn first_non_empty<'a>(candidates: &[Option<&'a str>]) -> Option<&'a str> {
    candidates.iter().copied().find_map(non_empty)
}
