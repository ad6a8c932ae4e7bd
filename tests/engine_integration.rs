//! Integration tests for the price engine using storefront fixture pages.

use async_trait::async_trait;
use pricewatch::http::{HttpClient, PageFetcher};
use pricewatch::render::{RenderBackend, RenderedPage};
use pricewatch::{extract_price, Config, EngineError, PriceEngine, StrategyKind};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const KABUM_FIXTURE: &str = include_str!("fixtures/kabum_product.html");
const OPENGRAPH_FIXTURE: &str = include_str!("fixtures/opengraph_product.html");
const RENDERED_FIXTURE: &str = include_str!("fixtures/rendered_product.html");

/// Renders every URL as the same fixture page.
struct FixtureRenderer(&'static str);

#[async_trait]
impl RenderBackend for FixtureRenderer {
    async fn acquire(&self) -> Result<(), EngineError> {
        Ok(())
    }

    async fn render(&self, url: &str) -> Result<RenderedPage, EngineError> {
        Ok(RenderedPage { html: self.0.to_string(), final_url: url.to_string() })
    }

    async fn release(&self) {}
}

/// A browser that never launches.
struct MissingBrowser;

#[async_trait]
impl RenderBackend for MissingBrowser {
    async fn acquire(&self) -> Result<(), EngineError> {
        Err(EngineError::BackendUnavailable("chrome not found".into()))
    }

    async fn render(&self, _url: &str) -> Result<RenderedPage, EngineError> {
        Err(EngineError::BackendUnavailable("chrome not found".into()))
    }

    async fn release(&self) {}
}

/// Fails the test if the HTML path is taken.
struct NoFetch;

#[async_trait]
impl PageFetcher for NoFetch {
    async fn fetch(&self, url: &str) -> Result<String, EngineError> {
        panic!("unexpected HTTP fetch of {url}");
    }
}

fn test_config() -> Config {
    Config { retry_backoff_ms: 0, human_delay_min_ms: 0, human_delay_max_ms: 0, ..Config::default() }
}

fn rendering(fixture: &'static str) -> PriceEngine {
    PriceEngine::with_backends(&test_config(), Some(Box::new(FixtureRenderer(fixture))), Box::new(NoFetch))
}

#[tokio::test]
async fn test_known_storefront_uses_domain_selectors() {
    let engine = rendering(KABUM_FIXTURE);

    let result = engine.scrape_price_auto("https://www.kabum.com.br/produto/512345/rtx-4070-super").await;

    assert!(result.success, "{:?}", result.error);
    assert_eq!(result.price, Some(4599.9));
    assert_eq!(result.strategy, Some(StrategyKind::DomainSelector));
    assert_eq!(result.locator.as_deref(), Some("h4.finalPrice"));
}

#[tokio::test]
async fn test_structured_data_then_cached_selector() {
    let engine = rendering(OPENGRAPH_FIXTURE);
    let url = "https://loja-exemplo.com.br/galaxy-a55/p";

    let first = engine.scrape_price_auto(url).await;
    assert_eq!(first.price, Some(2349.0));
    assert_eq!(first.strategy, Some(StrategyKind::Xpath));
    assert_eq!(first.locator.as_deref(), Some("//meta[@property='product:price:amount']/@content"));

    let second = engine.scrape_price_auto(url).await;
    assert_eq!(second.price, Some(2349.0));
    assert_eq!(second.strategy, Some(StrategyKind::CachedSelector));
    assert_eq!(second.locator, first.locator);
}

#[tokio::test]
async fn test_layout_analysis_skips_hidden_prices() {
    let engine = rendering(RENDERED_FIXTURE);
    let url = "https://sons-e-fones.com.br/jbl-tune-520bt";

    let first = engine.scrape_price_auto(url).await;
    assert_eq!(first.price, Some(189.9));
    assert_eq!(first.strategy, Some(StrategyKind::SemanticAnalysis));

    // The synthesized locator replays on the next visit
    let second = engine.scrape_price_auto(url).await;
    assert_eq!(second.price, Some(189.9));
    assert_eq!(second.strategy, Some(StrategyKind::CachedSelector));

    let stats = engine.stats("sons-e-fones.com.br");
    assert_eq!(stats.last_success, Some(StrategyKind::CachedSelector));
    assert_eq!(stats.last_price, Some(189.9));
    assert_eq!(engine.all_stats().len(), 1);
}

#[tokio::test]
async fn test_html_fallback_over_http() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/galaxy-a55/p"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html; charset=utf-8")
                .set_body_string(OPENGRAPH_FIXTURE),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = test_config();
    let fetcher = HttpClient::new(&config).unwrap();
    let engine = PriceEngine::with_backends(&config, Some(Box::new(MissingBrowser)), Box::new(fetcher));

    let result = engine.scrape_price_auto(&format!("{}/galaxy-a55/p", mock_server.uri())).await;

    assert!(result.success, "{:?}", result.error);
    assert_eq!(result.price, Some(2349.0));
    assert_eq!(result.strategy, Some(StrategyKind::DomainSelector));
    assert_eq!(result.locator.as_deref(), Some("meta[property='product:price:amount']"));
    assert_eq!(engine.cached_domains(), 0);
}

#[tokio::test]
async fn test_both_backends_fail_over_http() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = test_config();
    let fetcher = HttpClient::new(&config).unwrap();
    let engine = PriceEngine::with_backends(&config, Some(Box::new(MissingBrowser)), Box::new(fetcher));

    let result = engine.scrape_price_auto(&format!("{}/produto", mock_server.uri())).await;

    assert!(!result.success);
    assert!(result.price.is_none());
    assert_eq!(
        result.error.as_deref(),
        Some("render backend: render backend unavailable: chrome not found; html backend: blocked by storefront (HTTP 503)")
    );
}

#[test]
fn test_extract_price_storefront_strings() {
    assert_eq!(extract_price("R$\u{a0}4.599,90"), Some(4599.9));
    assert_eq!(extract_price("à vista R$ 189,90 no pix"), Some(189.9));
    assert_eq!(extract_price("2349.00"), Some(2349.0));
    assert_eq!(extract_price("CEP 01310-100"), None);
    assert_eq!(extract_price("Indisponível"), None);
}
