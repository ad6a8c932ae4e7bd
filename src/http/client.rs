//! Plain HTTP fetcher using wreq for TLS fingerprint emulation.

use crate::config::Config;
use crate::error::EngineError;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};
use wreq::Client;
use wreq_util::Emulation;

/// Statuses storefronts use to turn away automated traffic.
const BLOCK_STATUSES: &[u16] = &[403, 429, 503];

/// Trait for fetching raw page HTML - enables mocking for tests.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches a page and returns its HTML body.
    async fn fetch(&self, url: &str) -> Result<String, EngineError>;
}

/// HTTP client with browser impersonation.
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Creates a new client with the given configuration.
    pub fn new(config: &Config) -> Result<Self, EngineError> {
        let mut builder = Client::builder()
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .timeout(config.http_timeout())
            .connect_timeout(Duration::from_secs(10));

        // Configure proxy if specified
        if let Some(proxy_url) = &config.proxy {
            debug!("Configuring proxy: {}", proxy_url);
            let proxy = wreq::Proxy::all(proxy_url)
                .map_err(|e| EngineError::BackendUnavailable(format!("invalid proxy {proxy_url}: {e}")))?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| EngineError::BackendUnavailable(format!("http client: {e}")))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpClient {
    async fn fetch(&self, url: &str) -> Result<String, EngineError> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .emulation(Emulation::Chrome131)
            .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8")
            .header("Accept-Language", "pt-BR,pt;q=0.9,en-US;q=0.8,en;q=0.7")
            .header("Accept-Encoding", "gzip, deflate, br")
            .header("Cache-Control", "no-cache")
            .header("Pragma", "no-cache")
            .header("Sec-Ch-Ua", "\"Chromium\";v=\"131\", \"Not_A Brand\";v=\"24\"")
            .header("Sec-Ch-Ua-Mobile", "?0")
            .header("Sec-Ch-Ua-Platform", "\"Windows\"")
            .header("Sec-Fetch-Dest", "document")
            .header("Sec-Fetch-Mode", "navigate")
            .header("Sec-Fetch-Site", "none")
            .header("Sec-Fetch-User", "?1")
            .header("Upgrade-Insecure-Requests", "1")
            .send()
            .await
            .map_err(|e| EngineError::Http(format!("request failed: {e}")))?;

        let status = response.status();
        debug!("Response status: {}", status);

        if BLOCK_STATUSES.contains(&status.as_u16()) {
            warn!("{} refused the request with {}", url, status);
            return Err(EngineError::Blocked { status: status.as_u16() });
        }

        if !status.is_success() {
            return Err(EngineError::Http(format!("request failed with status: {status}")));
        }

        response.text().await.map_err(|e| EngineError::Http(format!("failed to read response body: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client() -> HttpClient {
        HttpClient::new(&Config::default()).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let mock_server = MockServer::start().await;

        let html = r#"<html><body><span class="price">R$ 1.299,90</span></body></html>"#;

        Mock::given(method("GET"))
            .and(path("/produto/123"))
            .respond_with(ResponseTemplate::new(200).set_body_string(html))
            .mount(&mock_server)
            .await;

        let body = client().fetch(&format!("{}/produto/123", mock_server.uri())).await.unwrap();
        assert!(body.contains("R$ 1.299,90"));
    }

    #[tokio::test]
    async fn test_sends_brazilian_accept_language() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(header("Accept-Language", "pt-BR,pt;q=0.9,en-US;q=0.8,en;q=0.7"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&mock_server)
            .await;

        let body = client().fetch(&mock_server.uri()).await.unwrap();
        assert_eq!(body, "ok");
    }

    #[tokio::test]
    async fn test_blocked_statuses() {
        for status in [403, 429, 503] {
            let mock_server = MockServer::start().await;

            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(status))
                .mount(&mock_server)
                .await;

            let err = client().fetch(&mock_server.uri()).await.unwrap_err();
            assert!(matches!(err, EngineError::Blocked { status: s } if s == status));
        }
    }

    #[tokio::test]
    async fn test_http_error_404() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let err = client().fetch(&mock_server.uri()).await.unwrap_err();
        assert!(matches!(err, EngineError::Http(_)));
        assert!(err.to_string().contains("404"));
    }

    #[tokio::test]
    async fn test_empty_response() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(""))
            .mount(&mock_server)
            .await;

        assert!(client().fetch(&mock_server.uri()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_connection_refused() {
        // Nothing listens on port 9 locally
        let err = client().fetch("http://127.0.0.1:9/").await.unwrap_err();
        assert!(matches!(err, EngineError::Http(_)));
    }
}
