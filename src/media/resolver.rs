//! Post content resolution: URL to page id to typed media list.

use crate::api::WeiboApi;
use crate::error::{Error, Result};
use crate::fs::naming::{clean_text, make_excerpt};
use crate::media::item::{PostContent, PostRef};
use crate::media::parser::{classify, extract_media, parse_publish_time};

/// Resolves post URLs into [`PostContent`].
pub struct ContentResolver<'a> {
    api: &'a WeiboApi,
    excerpt_length: usize,
}

impl<'a> ContentResolver<'a> {
    pub fn new(api: &'a WeiboApi, excerpt_length: usize) -> Self {
        Self {
            api,
            excerpt_length,
        }
    }

    fn is_short_link(&self, url: &str) -> bool {
        let Ok(parsed) = url::Url::parse(url) else {
            return false;
        };
        parsed.host_str().is_some_and(|host| {
            self.api
                .endpoints()
                .short_link_hosts
                .iter()
                .any(|h| h.eq_ignore_ascii_case(host))
        })
    }

    /// Canonical post reference for a URL, following a short link if needed.
    ///
    /// The returned reference keeps the URL as given, so the caller's
    /// bookkeeping stays keyed by what was discovered.
    pub async fn post_ref(&self, url: &str) -> Result<PostRef> {
        let canonical = if self.is_short_link(url) {
            self.api
                .resolve_short_link(url)
                .await
                .map_err(|e| Error::unresolvable(url, format!("short link: {}", e)))?
        } else {
            url.to_string()
        };

        let post = PostRef::parse(&canonical)
            .ok_or_else(|| Error::unresolvable(url, "no page id in URL"))?;

        Ok(PostRef {
            url: url.to_string(),
            page_id: post.page_id,
        })
    }

    /// Resolve a post URL into its content and media list.
    pub async fn resolve(&self, url: &str) -> Result<PostContent> {
        let post = self.post_ref(url).await?;

        let detail = self
            .api
            .get_status(&post.page_id)
            .await
            .map_err(|e| Error::unresolvable(url, format!("post detail: {}", e)))?;

        let published = parse_publish_time(detail.created_at.as_deref());
        let raw_text = detail
            .text_raw
            .as_deref()
            .or(detail.text.as_deref())
            .unwrap_or_default();

        let page_type = classify(&detail);
        let media = extract_media(&detail, page_type, url)?;

        tracing::debug!(
            "Resolved {} as {} with {} media item(s)",
            url,
            page_type,
            media.len()
        );

        Ok(PostContent {
            url: url.to_string(),
            published,
            text: clean_text(raw_text),
            excerpt: make_excerpt(raw_text, self.excerpt_length),
            page_type,
            media,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::media::item::{MediaKind, PageType};
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_api(base: &str) -> WeiboApi {
        let mut config = Config::for_mock_server(base, "SUB=test");
        config.endpoints.short_link_hosts = vec!["127.0.0.1".to_string()];
        WeiboApi::from_config(&config).unwrap()
    }

    #[tokio::test]
    async fn test_resolve_images_post() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/ajax/statuses/show"))
            .and(query_param("id", "NxYz12"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "created_at": "Tue Mar 05 21:14:07 +0800 2024",
                "text": "Spring <a href=\"/x\">trip</a>\nday one",
                "pic_ids": ["p1"],
                "pic_num": 1,
                "pic_infos": {"p1": {"type": "pic", "largest": {"url": "https://wx1.sinaimg.cn/large/p1.jpg"}}},
                "page_info": {"media_info": {"media_id": "1"}}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let api = test_api(&server.uri());
        let resolver = ContentResolver::new(&api, 20);
        let content = resolver
            .resolve("https://weibo.com/1923024604/NxYz12")
            .await
            .unwrap();

        assert_eq!(content.page_type, PageType::Images);
        assert_eq!(content.published, "2024-03-05_21-14-07");
        assert_eq!(content.text, "Spring trip day one");
        assert_eq!(content.folder_name(), "2024-03-05_21-14-07_Spring trip day one");
        assert_eq!(content.media.len(), 1);
        assert_eq!(content.media[0].kind, MediaKind::Image);
    }

    #[tokio::test]
    async fn test_resolve_follows_short_link() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/A6abc"))
            .respond_with(
                ResponseTemplate::new(302)
                    .insert_header("Location", "https://weibo.com/1923024604/Short1"),
            )
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/ajax/statuses/show"))
            .and(query_param("id", "Short1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"text": "plain"})))
            .expect(1)
            .mount(&server)
            .await;

        let api = test_api(&server.uri());
        let resolver = ContentResolver::new(&api, 20);
        let short = format!("{}/A6abc", server.uri());
        let content = resolver.resolve(&short).await.unwrap();

        assert_eq!(content.url, short);
        assert_eq!(content.page_type, PageType::Unknown);
        assert!(content.media.is_empty());
    }

    #[tokio::test]
    async fn test_short_link_without_location_is_unresolvable() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/A6abc"))
            .respond_with(ResponseTemplate::new(302))
            .mount(&server)
            .await;

        let api = test_api(&server.uri());
        let resolver = ContentResolver::new(&api, 20);
        let err = resolver
            .post_ref(&format!("{}/A6abc", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Unresolvable { .. }));
    }

    #[tokio::test]
    async fn test_bad_url_is_unresolvable_without_network() {
        let server = MockServer::start().await;
        let api = test_api(&server.uri());
        let resolver = ContentResolver::new(&api, 20);

        let err = resolver.resolve("https://weibo.com/u/profile").await.unwrap_err();
        assert!(matches!(err, Error::Unresolvable { .. }));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_detail_failure_is_unresolvable() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/ajax/statuses/show"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let api = test_api(&server.uri());
        let resolver = ContentResolver::new(&api, 20);
        let err = resolver
            .resolve("https://weibo.com/1923024604/Gone")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Unresolvable { .. }));
    }
}
