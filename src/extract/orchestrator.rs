//! Runs a strategy cascade over one page.
//!
//! Strategies are tried in order and the first validated price wins. Every
//! attempt is logged; a win is written back to the selector cache so the next
//! scrape of the same storefront starts from the locator that worked.

use crate::extract::cache::SelectorCache;
use crate::extract::models::{Domain, ExtractionAttempt, ScrapingResult, StrategyKind};
use crate::extract::page::PageSnapshot;
use crate::extract::strategies::{self, Strategy};
use crate::extract::telemetry::AttemptLog;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

pub struct Orchestrator {
    strategies: Vec<Box<dyn Strategy>>,
    cache: Option<Arc<dyn SelectorCache>>,
    attempts: Arc<dyn AttemptLog>,
}

impl Orchestrator {
    pub fn new(
        strategies: Vec<Box<dyn Strategy>>,
        cache: Option<Arc<dyn SelectorCache>>,
        attempts: Arc<dyn AttemptLog>,
    ) -> Self {
        Self { strategies, cache, attempts }
    }

    /// Full cascade for rendered pages, backed by the selector cache.
    pub fn rendered(cache: Arc<dyn SelectorCache>, attempts: Arc<dyn AttemptLog>) -> Self {
        Self::new(strategies::rendered_cascade(cache.clone()), Some(cache), attempts)
    }

    /// Reduced cascade for raw HTML. Never writes the cache.
    pub fn html_only(attempts: Arc<dyn AttemptLog>) -> Self {
        Self::new(strategies::html_cascade(), None, attempts)
    }

    /// Strategy tags in cascade order.
    pub fn kinds(&self) -> Vec<StrategyKind> {
        self.strategies.iter().map(|strategy| strategy.kind()).collect()
    }

    pub fn run(&self, html: &str, domain: &Domain) -> ScrapingResult {
        let page = PageSnapshot::parse(html);
        self.run_on(&page, domain)
    }

    pub fn run_on(&self, page: &PageSnapshot, domain: &Domain) -> ScrapingResult {
        for strategy in &self.strategies {
            let kind = strategy.kind();
            let outcome = strategy.attempt(page, domain);

            self.attempts.record(ExtractionAttempt {
                domain: domain.clone(),
                strategy: kind,
                locator: outcome.as_ref().map(|found| found.locator.to_string()),
                success: outcome.is_some(),
                price: outcome.as_ref().map(|found| found.price),
                timestamp: Utc::now(),
            });

            match outcome {
                Some(found) => {
                    info!("{}: {} found R$ {:.2} via {}", domain, kind, found.price, found.locator);
                    if let Some(cache) = &self.cache {
                        cache.record_success(domain, &found.locator);
                    }
                    return ScrapingResult::found(&found, kind);
                }
                None => debug!("{}: {} found nothing", domain, kind),
            }
        }

        info!("{}: no strategy found a price", domain);
        ScrapingResult::not_found()
    }
}
