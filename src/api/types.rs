//! API response type definitions.
//!
//! Every field that the platform omits on some posts is optional or
//! defaulted; presence checks drive page-type classification, so absent
//! and empty are kept distinct where it matters.

use serde::{Deserialize, Deserializer};
use std::collections::HashMap;

/// Wrapper used by the mobile container API.
#[derive(Debug, Deserialize)]
pub struct ContainerResponse<T> {
    #[serde(default)]
    pub ok: Option<i64>,
    pub data: Option<T>,
}

/// `getIndex?type=uid&value=<uid>` payload.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileIndex {
    pub user_info: Option<UserInfo>,
    pub tabs_info: Option<TabsInfo>,
}

impl ProfileIndex {
    /// Container id of the timeline tab, if the profile exposes one.
    pub fn timeline_container(&self) -> Option<&str> {
        self.tabs_info
            .as_ref()?
            .tabs
            .iter()
            .find(|tab| tab.tab_type.as_deref() == Some("weibo"))
            .and_then(|tab| tab.containerid.as_deref())
            .filter(|id| !id.is_empty())
    }
}

/// Profile owner.
#[derive(Debug, Clone, Deserialize)]
pub struct UserInfo {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: Option<String>,
    pub screen_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TabsInfo {
    #[serde(default)]
    pub tabs: Vec<Tab>,
}

#[derive(Debug, Deserialize)]
pub struct Tab {
    pub tab_type: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub containerid: Option<String>,
}

/// `getIndex?containerid=<id>&page=<n>` payload.
#[derive(Debug, Default, Deserialize)]
pub struct FeedPage {
    #[serde(default)]
    pub cards: Vec<Card>,
}

/// Card type carrying a post.
pub const POST_CARD_TYPE: i64 = 9;

#[derive(Debug, Deserialize)]
pub struct Card {
    pub card_type: Option<i64>,
    pub mblog: Option<Mblog>,
}

/// Post summary inside a feed card.
#[derive(Debug, Deserialize)]
pub struct Mblog {
    pub bid: Option<String>,
    pub user: Option<UserInfo>,
}

/// `ajax/statuses/show?id=<page_id>` payload.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct StatusDetail {
    pub created_at: Option<String>,
    pub text: Option<String>,
    pub text_raw: Option<String>,
    pub mix_media_info: Option<MixMediaInfo>,
    pub pic_ids: Option<Vec<String>>,
    pub pic_num: Option<u32>,
    #[serde(default)]
    pub pic_infos: HashMap<String, PicInfo>,
    pub page_info: Option<PageInfo>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct MixMediaInfo {
    #[serde(default)]
    pub items: Vec<MixMediaItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MixMediaItem {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: MixMediaData,
}

/// Item data: a picture (`pic_id`, `largest`) or a video (`media_info`).
#[derive(Debug, Default, Clone, Deserialize)]
pub struct MixMediaData {
    pub pic_id: Option<String>,
    pub largest: Option<PicVariant>,
    pub media_info: Option<MediaInfo>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct PicInfo {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub largest: Option<PicVariant>,
    /// Short video of a live photo.
    pub video: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct PicVariant {
    pub url: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct PageInfo {
    pub media_info: Option<MediaInfo>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct MediaInfo {
    #[serde(default, deserialize_with = "string_or_number")]
    pub media_id: Option<String>,
    #[serde(default)]
    pub playback_list: Vec<Playback>,
    pub mp4_720p_mp4: Option<String>,
    pub stream_url_hd: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct Playback {
    #[serde(default)]
    pub play_info: PlayInfo,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct PlayInfo {
    pub url: Option<String>,
}

/// Ids arrive as strings on some endpoints and numbers on others.
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
