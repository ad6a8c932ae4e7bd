//! Public entry point: render with retries, fall back to plain HTTP once.
//!
//! [`PriceEngine::scrape_price_auto`] never panics and never returns `Err`;
//! every failure is folded into a [`ScrapingResult`].

pub mod html;

pub use html::HtmlBackend;

use crate::config::Config;
use crate::error::EngineError;
use crate::extract::cache::{MemorySelectorCache, SelectorCache};
use crate::extract::models::{Domain, DomainStats, ScrapingResult};
use crate::extract::orchestrator::Orchestrator;
use crate::extract::telemetry::{AttemptLog, MemoryAttemptLog};
use crate::http::{HttpClient, PageFetcher};
use crate::render::{ChromiumBackend, RenderBackend};
use chrono::TimeDelta;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct PriceEngine {
    config: Config,
    renderer: Option<Box<dyn RenderBackend>>,
    html: HtmlBackend,
    rendered: Orchestrator,
    cache: Arc<dyn SelectorCache>,
    attempts: Arc<dyn AttemptLog>,
}

impl PriceEngine {
    /// Builds an engine with the Chromium and wreq backends.
    ///
    /// The browser is not launched until the first scrape.
    pub fn new(config: &Config) -> Result<Self, EngineError> {
        let renderer: Option<Box<dyn RenderBackend>> = if config.render {
            Some(Box::new(ChromiumBackend::from_config(config)))
        } else {
            None
        };
        let fetcher = Box::new(HttpClient::new(config)?);

        Ok(Self::with_backends(config, renderer, fetcher))
    }

    /// Builds an engine around caller-supplied backends. `None` disables rendering.
    pub fn with_backends(
        config: &Config,
        renderer: Option<Box<dyn RenderBackend>>,
        fetcher: Box<dyn PageFetcher>,
    ) -> Self {
        let ttl = i64::try_from(config.cache_ttl_hours)
            .ok()
            .and_then(TimeDelta::try_hours)
            .unwrap_or(TimeDelta::MAX);
        let cache: Arc<dyn SelectorCache> = Arc::new(MemorySelectorCache::new(ttl, config.cache_capacity));
        let attempts: Arc<dyn AttemptLog> = Arc::new(MemoryAttemptLog::new(config.attempt_history));

        Self {
            config: config.clone(),
            renderer,
            html: HtmlBackend::new(fetcher, attempts.clone()),
            rendered: Orchestrator::rendered(cache.clone(), attempts.clone()),
            cache,
            attempts,
        }
    }

    /// Scrapes the current price of a product page.
    pub async fn scrape_price_auto(&self, url: &str) -> ScrapingResult {
        let domain = match Domain::from_url(url) {
            Ok(domain) => domain,
            Err(e) => return ScrapingResult::failure(e.to_string()),
        };

        let render_error = match self.render_and_extract(url, &domain).await {
            Ok(result) => return result,
            Err(e) => e,
        };

        warn!("{}: rendering did not produce a price ({}), trying plain HTTP", domain, render_error);

        match self.html.scrape(url, &domain).await {
            Ok(result) => result,
            Err(html_error) => {
                info!("{}: both backends failed", domain);
                ScrapingResult::failure(format!("render backend: {render_error}; html backend: {html_error}"))
            }
        }
    }

    async fn render_and_extract(&self, url: &str, domain: &Domain) -> Result<ScrapingResult, EngineError> {
        let Some(renderer) = &self.renderer else {
            return Err(EngineError::BackendUnavailable("rendering disabled".into()));
        };

        let mut retries = 0;
        let page = loop {
            match renderer.render(url).await {
                Ok(page) => break page,
                Err(e) if e.is_retryable() && retries < self.config.max_render_retries => {
                    retries += 1;
                    let backoff = self.config.retry_backoff(retries);
                    warn!("Render of {} failed ({}), retry {} in {:?}", url, e, retries, backoff);

                    // A fresh browser for the next attempt
                    renderer.release().await;
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(e),
            }
        };

        debug!("Rendered {} ({} bytes)", page.final_url, page.html.len());

        let result = self.rendered.run(&page.html, domain);
        if result.success {
            Ok(result)
        } else {
            Err(EngineError::NotFound)
        }
    }

    /// Releases the browser. The engine stays usable; the next scrape relaunches it.
    pub async fn shutdown(&self) {
        if let Some(renderer) = &self.renderer {
            renderer.release().await;
        }
    }

    pub fn stats(&self, domain: &str) -> DomainStats {
        self.attempts.stats(&Domain::new(domain).to_string())
    }

    /// Telemetry for every domain scraped so far.
    pub fn all_stats(&self) -> Vec<DomainStats> {
        self.attempts.domains().iter().map(|domain| self.attempts.stats(domain)).collect()
    }

    pub fn cached_domains(&self) -> usize {
        self.cache.len()
    }
}

/// One-shot scrape with configuration from the usual files and environment.
pub async fn scrape_price_auto(url: &str) -> ScrapingResult {
    let config = match Config::load(None) {
        Ok(config) => config.with_env(),
        Err(e) => {
            warn!("Ignoring unreadable config: {:#}", e);
            Config::default().with_env()
        }
    };

    let engine = match PriceEngine::new(&config) {
        Ok(engine) => engine,
        Err(e) => return ScrapingResult::failure(e.to_string()),
    };

    let result = engine.scrape_price_auto(url).await;
    engine.shutdown().await;
    result
}
