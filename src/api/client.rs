//! Weibo HTTP client.

use std::time::Duration;

use reqwest::{header, redirect, Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tokio::time::sleep;

use crate::api::types::*;
use crate::config::{Config, EndpointsConfig, OptionsConfig, UserTarget};
use crate::error::{Error, Result};

/// Referer expected by the image and video CDNs.
const REFERER: &str = "https://weibo.com/";

/// Base delay between transport-level retries, multiplied by the retry number.
const TRANSPORT_BACKOFF_MS: u64 = 200;

/// Characters of an undecodable body quoted in the error message.
const BODY_SNIPPET_CHARS: usize = 200;

/// Weibo client carrying the session cookie on every request.
///
/// One connection pool serves API calls and media transfers; a second,
/// redirect-disabled client is used only to resolve short links.
pub struct WeiboApi {
    client: Client,
    redirect_client: Client,
    endpoints: EndpointsConfig,
    transport_retries: u32,
    api_timeout: Duration,
}

impl WeiboApi {
    /// Create a new API client.
    pub fn new(cookie: &str, options: &OptionsConfig, endpoints: EndpointsConfig) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        let cookie_value = header::HeaderValue::from_str(cookie.trim()).map_err(|_| {
            Error::ConfigValidation {
                field: "cookie".to_string(),
                message: "Cookie contains characters that are not valid in an HTTP header"
                    .to_string(),
            }
        })?;
        headers.insert(header::COOKIE, cookie_value);
        headers.insert(header::REFERER, header::HeaderValue::from_static(REFERER));

        let client = Client::builder()
            .user_agent(&options.user_agent)
            .default_headers(headers.clone())
            .connect_timeout(options.connect_timeout())
            .read_timeout(options.read_timeout())
            .build()
            .map_err(|e| Error::Api(format!("Failed to create HTTP client: {}", e)))?;

        let redirect_client = Client::builder()
            .user_agent(&options.user_agent)
            .default_headers(headers)
            .redirect(redirect::Policy::none())
            .connect_timeout(options.connect_timeout())
            .timeout(options.api_timeout())
            .build()
            .map_err(|e| Error::Api(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            redirect_client,
            endpoints,
            transport_retries: options.transport_retries,
            api_timeout: options.api_timeout(),
        })
    }

    /// Create a client from the loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            &config.target.cookie,
            &config.options,
            config.endpoints.clone(),
        )
    }

    /// Create a client that sends the target's validated cookie.
    pub fn for_target(target: &UserTarget, config: &Config) -> Result<Self> {
        Self::new(target.cookie(), &config.options, config.endpoints.clone())
    }

    pub fn endpoints(&self) -> &EndpointsConfig {
        &self.endpoints
    }

    /// Send a request, retrying connect and timeout failures.
    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let mut retries = 0;

        loop {
            let attempt = request
                .try_clone()
                .ok_or_else(|| Error::Api("Request cannot be retried".into()))?;

            match attempt.send().await {
                Ok(response) => return Ok(response),
                Err(e) if (e.is_connect() || e.is_timeout()) && retries < self.transport_retries => {
                    retries += 1;
                    tracing::debug!(
                        "Transport error ({}), retry {}/{}",
                        e,
                        retries,
                        self.transport_retries
                    );
                    sleep(Duration::from_millis(TRANSPORT_BACKOFF_MS * retries as u64)).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// GET a JSON document.
    async fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, &str)]) -> Result<T> {
        tracing::debug!("GET {} {:?}", url, query);

        let request = self.client.get(url).query(query).timeout(self.api_timeout);
        let response = self.send(request).await?;

        let status = response.status();
        tracing::debug!("Response status: {}", status);

        if !status.is_success() {
            return Err(Error::Api(format!("HTTP {} from {}", status, url)));
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            Error::Api(format!(
                "Failed to parse response from {}: {} - Response: {}",
                url,
                e,
                snippet(&text)
            ))
        })
    }

    /// Get the profile index of a user (screen name and feed tabs).
    pub async fn get_profile(&self, uid: &str) -> Result<ProfileIndex> {
        let url = format!("{}/api/container/getIndex", self.endpoints.mobile_api);
        let response: ContainerResponse<ProfileIndex> =
            self.get_json(&url, &[("type", "uid"), ("value", uid)]).await?;

        response
            .data
            .ok_or_else(|| Error::UserNotFound(uid.to_string()))
    }

    /// Get one page of a timeline container. Pages start at 1.
    pub async fn get_feed_page(&self, containerid: &str, page: u32) -> Result<FeedPage> {
        let url = format!("{}/api/container/getIndex", self.endpoints.mobile_api);
        let page = page.to_string();
        let response: ContainerResponse<FeedPage> = self
            .get_json(&url, &[("containerid", containerid), ("page", &page)])
            .await?;

        Ok(response.data.unwrap_or_default())
    }

    /// Get the detail payload of a post.
    pub async fn get_status(&self, page_id: &str) -> Result<StatusDetail> {
        let url = format!("{}/ajax/statuses/show", self.endpoints.web_api);
        self.get_json(&url, &[("id", page_id)]).await
    }

    /// Resolve a short link to the URL it redirects to.
    pub async fn resolve_short_link(&self, short_url: &str) -> Result<String> {
        tracing::debug!("Resolving short link {}", short_url);

        let response = self.send(self.redirect_client.get(short_url)).await?;
        let status = response.status();

        if !status.is_redirection() {
            return Err(Error::Api(format!(
                "Short link {} answered HTTP {} instead of a redirect",
                short_url, status
            )));
        }

        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| Error::Api(format!("Short link {} has no Location", short_url)))?;

        // Location may be relative to the short link.
        let resolved = url::Url::parse(short_url)?.join(location)?;
        Ok(resolved.to_string())
    }

    /// Download a file into memory.
    pub async fn download_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.send(self.client.get(url)).await?;

        if !response.status().is_success() {
            return Err(Error::Download(format!(
                "Failed to download file: HTTP {}",
                response.status()
            )));
        }

        Ok(response.bytes().await?.to_vec())
    }
}

/// Leading characters of a response body, cut on a char boundary.
fn snippet(text: &str) -> &str {
    let end = text
        .char_indices()
        .nth(BODY_SNIPPET_CHARS)
        .map_or(text.len(), |(i, _)| i);
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header as header_eq, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_api(base: &str) -> WeiboApi {
        let config = Config::for_mock_server(base, "SUB=test-cookie");
        WeiboApi::from_config(&config).unwrap()
    }

    #[tokio::test]
    async fn test_get_profile_sends_cookie() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/container/getIndex"))
            .and(query_param("type", "uid"))
            .and(query_param("value", "123"))
            .and(header_eq("cookie", "SUB=test-cookie"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": 1,
                "data": {
                    "userInfo": {"id": 123, "screen_name": "tester"},
                    "tabsInfo": {"tabs": [{"tab_type": "weibo", "containerid": "107603123"}]}
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let api = test_api(&server.uri());
        let profile = api.get_profile("123").await.unwrap();
        assert_eq!(profile.timeline_container(), Some("107603123"));
    }

    #[tokio::test]
    async fn test_get_profile_without_data() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/container/getIndex"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": 0, "msg": "gone"})))
            .mount(&server)
            .await;

        let api = test_api(&server.uri());
        let err = api.get_profile("123").await.unwrap_err();
        assert!(matches!(err, Error::UserNotFound(_)));
    }

    #[tokio::test]
    async fn test_get_status_error_status() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/ajax/statuses/show"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let api = test_api(&server.uri());
        assert!(matches!(api.get_status("Abc").await, Err(Error::Api(_))));
    }

    #[tokio::test]
    async fn test_get_status_undecodable_body() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/ajax/statuses/show"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
            .mount(&server)
            .await;

        let api = test_api(&server.uri());
        assert!(api.get_status("Abc").await.is_err());
    }

    #[tokio::test]
    async fn test_undecodable_cjk_body_is_api_error() {
        let server = MockServer::start().await;
        let body = format!("{}请先登录微博", "a".repeat(199));

        Mock::given(method("GET"))
            .and(path("/ajax/statuses/show"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;

        let api = test_api(&server.uri());
        match api.get_status("X1").await {
            Err(Error::Api(message)) => assert!(message.ends_with("请")),
            other => panic!("expected Error::Api, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_snippet_cuts_on_char_boundary() {
        assert_eq!(snippet("short"), "short");

        let text = "微".repeat(300);
        assert_eq!(snippet(&text).chars().count(), BODY_SNIPPET_CHARS);
    }

    #[tokio::test]
    async fn test_sends_target_cookie() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/ajax/statuses/show"))
            .and(header_eq("cookie", "SUB=target-cookie"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1})))
            .expect(1)
            .mount(&server)
            .await;

        let config = Config::for_mock_server(&server.uri(), "SUB=config-cookie");
        let target = UserTarget::new("123", "SUB=target-cookie", std::path::PathBuf::from("."))
            .unwrap();
        let api = WeiboApi::for_target(&target, &config).unwrap();
        assert!(api.get_status("Abc").await.is_ok());
    }

    #[tokio::test]
    async fn test_connect_failure_gives_up_after_retries() {
        // Grab a free port, then close it so every connect is refused.
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let base = format!("http://127.0.0.1:{}", port);

        let mut config = Config::for_mock_server(&base, "SUB=test-cookie");
        config.options.transport_retries = 2;
        let api = WeiboApi::from_config(&config).unwrap();

        let started = std::time::Instant::now();
        match api.get_profile("123").await {
            Err(Error::Http(e)) => assert!(e.is_connect()),
            other => panic!("expected a connect error, got {:?}", other.map(|_| ())),
        }

        // Two backoffs of 200ms and 400ms, then the error is returned.
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(600));
        assert!(elapsed < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_timeout_is_retried() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/ajax/statuses/show"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"id": 1}))
                    .set_delay(Duration::from_secs(3)),
            )
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/ajax/statuses/show"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1})))
            .expect(1)
            .mount(&server)
            .await;

        let mut config = Config::for_mock_server(&server.uri(), "SUB=test-cookie");
        config.options.transport_retries = 2;
        config.options.api_timeout_seconds = 1;
        let api = WeiboApi::from_config(&config).unwrap();

        assert!(api.get_status("Abc").await.is_ok());
    }

    #[tokio::test]
    async fn test_server_error_is_not_retried() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/ajax/statuses/show"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let mut config = Config::for_mock_server(&server.uri(), "SUB=test-cookie");
        config.options.transport_retries = 3;
        let api = WeiboApi::from_config(&config).unwrap();

        assert!(matches!(api.get_status("Abc").await, Err(Error::Api(_))));
    }

    #[tokio::test]
    async fn test_resolve_short_link() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/A6abc"))
            .respond_with(
                ResponseTemplate::new(302)
                    .insert_header("Location", "https://weibo.com/1923024604/NxYz12"),
            )
            .mount(&server)
            .await;

        let api = test_api(&server.uri());
        let resolved = api
            .resolve_short_link(&format!("{}/A6abc", server.uri()))
            .await
            .unwrap();
        assert_eq!(resolved, "https://weibo.com/1923024604/NxYz12");
    }

    #[tokio::test]
    async fn test_resolve_short_link_without_redirect() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/A6abc"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let api = test_api(&server.uri());
        assert!(api
            .resolve_short_link(&format!("{}/A6abc", server.uri()))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_download_bytes() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/large/a.jpg"))
            .and(header_eq("referer", REFERER))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8, 2, 3]))
            .mount(&server)
            .await;

        let api = test_api(&server.uri());
        let bytes = api
            .download_bytes(&format!("{}/large/a.jpg", server.uri()))
            .await
            .unwrap();
        assert_eq!(bytes, vec![1, 2, 3]);
    }
}
