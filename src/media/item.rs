//! Post and media item representation.

use std::fmt;

/// Type of a downloadable asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Image,
    Video,
    /// Short video attached to a live photo.
    LivePhoto,
}

impl MediaKind {
    /// File extension used for this kind.
    pub fn extension(&self) -> &'static str {
        match self {
            MediaKind::Image => "jpg",
            MediaKind::Video => "mp4",
            MediaKind::LivePhoto => "mov",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Image => write!(f, "image"),
            MediaKind::Video => write!(f, "video"),
            MediaKind::LivePhoto => write!(f, "live photo"),
        }
    }
}

/// End-of-file signature an image transfer must finish with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
}

impl ImageFormat {
    /// Detect the expected format from a URL's path extension.
    pub fn from_url(url: &str) -> Option<Self> {
        let path = url.split(['?', '#']).next()?;
        let ext = path.rsplit('/').next()?.rsplit_once('.')?.1;

        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "png" => Some(ImageFormat::Png),
            _ => None,
        }
    }

    pub fn trailer(&self) -> &'static [u8] {
        match self {
            ImageFormat::Jpeg => &[0xFF, 0xD9],
            ImageFormat::Png => &[0xAE, 0x42, 0x60, 0x82],
        }
    }

    /// Whether `bytes` end with this format's signature.
    pub fn is_complete(&self, bytes: &[u8]) -> bool {
        bytes.ends_with(self.trailer())
    }
}

/// One downloadable asset of a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRef {
    /// Source URL.
    pub url: String,

    /// Stable identifier, used as the file stem.
    pub media_id: String,

    pub kind: MediaKind,
}

impl MediaRef {
    pub fn new(url: impl Into<String>, media_id: impl Into<String>, kind: MediaKind) -> Self {
        Self {
            url: url.into(),
            media_id: media_id.into(),
            kind,
        }
    }

    /// Destination file name: `<media_id>.<ext>`.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.media_id, self.kind.extension())
    }

    /// Expected trailing signature, for image assets whose format is known.
    pub fn expected_format(&self) -> Option<ImageFormat> {
        match self.kind {
            MediaKind::Image => ImageFormat::from_url(&self.url),
            MediaKind::Video | MediaKind::LivePhoto => None,
        }
    }
}

/// Which payload shape the media list was extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageType {
    Multimedia,
    Images,
    Video,
    Unknown,
}

impl fmt::Display for PageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageType::Multimedia => write!(f, "multimedia"),
            PageType::Images => write!(f, "images"),
            PageType::Video => write!(f, "video"),
            PageType::Unknown => write!(f, "unknown"),
        }
    }
}

/// A discovered post in canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PostRef {
    pub url: String,
    pub page_id: String,
}

impl PostRef {
    /// Parse a canonical post URL `https://<host>/<numeric uid>/<post id>`.
    ///
    /// Returns `None` for anything else; short links must be resolved first.
    pub fn parse(url: &str) -> Option<Self> {
        let parsed = url::Url::parse(url).ok()?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return None;
        }

        let mut segments = parsed.path_segments()?.filter(|s| !s.is_empty());
        let user_id = segments.next()?;
        let page_id = segments.next()?;

        if !user_id.chars().all(|c| c.is_ascii_digit())
            || !page_id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return None;
        }

        Some(Self {
            url: url.to_string(),
            page_id: page_id.to_string(),
        })
    }

    /// Compose the canonical URL of a post.
    pub fn from_parts(host: &str, user_id: &str, bid: &str) -> Option<Self> {
        Self::parse(&format!("https://{}/{}/{}", host, user_id, bid))
    }
}

/// Resolved metadata of one post.
#[derive(Debug, Clone)]
pub struct PostContent {
    pub url: String,

    /// Publish time formatted for folder names.
    pub published: String,

    /// Markup-free text with collapsed whitespace.
    pub text: String,

    /// Short, filesystem-safe excerpt of `text`.
    pub excerpt: String,

    pub page_type: PageType,

    pub media: Vec<MediaRef>,
}

impl PostContent {
    /// Folder name: `<published>_<excerpt>`, or just the time when the
    /// excerpt is empty.
    pub fn folder_name(&self) -> String {
        if self.excerpt.is_empty() {
            self.published.clone()
        } else {
            format!("{}_{}", self.published, self.excerpt)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extensions_are_distinct() {
        assert_eq!(MediaKind::Image.extension(), "jpg");
        assert_eq!(MediaKind::Video.extension(), "mp4");
        assert_eq!(MediaKind::LivePhoto.extension(), "mov");
    }

    #[test]
    fn test_file_name() {
        let item = MediaRef::new("https://wx1.sinaimg.cn/large/abc.jpg", "abc", MediaKind::Image);
        assert_eq!(item.file_name(), "abc.jpg");

        let live = MediaRef::new("https://video.weibo.com/x.mov", "abc", MediaKind::LivePhoto);
        assert_eq!(live.file_name(), "abc.mov");
    }

    #[test]
    fn test_image_format_from_url() {
        assert_eq!(
            ImageFormat::from_url("https://wx1.sinaimg.cn/large/abc.JPG?KID=1"),
            Some(ImageFormat::Jpeg)
        );
        assert_eq!(
            ImageFormat::from_url("https://wx1.sinaimg.cn/large/abc.png"),
            Some(ImageFormat::Png)
        );
        assert_eq!(ImageFormat::from_url("https://wx1.sinaimg.cn/large/abc.gif"), None);
        assert_eq!(ImageFormat::from_url("https://wx1.sinaimg.cn/large/abc"), None);
    }

    #[test]
    fn test_image_format_trailer() {
        assert!(ImageFormat::Jpeg.is_complete(&[0xFF, 0xD8, 0x00, 0xFF, 0xD9]));
        assert!(!ImageFormat::Jpeg.is_complete(&[0xFF, 0xD8, 0x00]));
        assert!(ImageFormat::Png.is_complete(b"\x89PNG....IEND\xaeB`\x82"));
        assert!(!ImageFormat::Png.is_complete(b""));
    }

    #[test]
    fn test_videos_have_no_expected_format() {
        let item = MediaRef::new("https://f.video.weibocdn.com/a.jpg", "1", MediaKind::Video);
        assert_eq!(item.expected_format(), None);
    }

    #[test]
    fn test_post_ref_parse() {
        let post = PostRef::parse("https://weibo.com/1923024604/NxYz12").unwrap();
        assert_eq!(post.page_id, "NxYz12");
        assert_eq!(post.url, "https://weibo.com/1923024604/NxYz12");

        let trailing = PostRef::parse("https://weibo.com/1923024604/NxYz12/?type=x").unwrap();
        assert_eq!(trailing.page_id, "NxYz12");
    }

    #[test]
    fn test_post_ref_rejects_non_canonical() {
        assert!(PostRef::parse("https://weibo.com/1923024604").is_none());
        assert!(PostRef::parse("https://weibo.com/u/NxYz12").is_none());
        assert!(PostRef::parse("https://t.cn/A6abc").is_none());
        assert!(PostRef::parse("not a url").is_none());
    }

    #[test]
    fn test_post_ref_from_parts() {
        let post = PostRef::from_parts("weibo.com", "123", "Abc").unwrap();
        assert_eq!(post.url, "https://weibo.com/123/Abc");
        assert_eq!(post.page_id, "Abc");
    }

    #[test]
    fn test_folder_name() {
        let mut content = PostContent {
            url: "https://weibo.com/1/A".into(),
            published: "2024-03-05_21-14-07".into(),
            text: "hello".into(),
            excerpt: "hello".into(),
            page_type: PageType::Unknown,
            media: Vec::new(),
        };
        assert_eq!(content.folder_name(), "2024-03-05_21-14-07_hello");

        content.excerpt.clear();
        assert_eq!(content.folder_name(), "2024-03-05_21-14-07");
    }
}
