//! HTML-only fallback backend: a plain HTTP fetch and a reduced cascade.

use crate::error::EngineError;
use crate::extract::models::{Domain, ScrapingResult};
use crate::extract::orchestrator::Orchestrator;
use crate::extract::telemetry::AttemptLog;
use crate::http::PageFetcher;
use std::sync::Arc;
use tracing::debug;

pub struct HtmlBackend {
    fetcher: Box<dyn PageFetcher>,
    orchestrator: Orchestrator,
}

impl HtmlBackend {
    pub fn new(fetcher: Box<dyn PageFetcher>, attempts: Arc<dyn AttemptLog>) -> Self {
        Self { fetcher, orchestrator: Orchestrator::html_only(attempts) }
    }

    /// Fetches the page and runs the reduced cascade. Only successes are `Ok`.
    pub async fn scrape(&self, url: &str, domain: &Domain) -> Result<ScrapingResult, EngineError> {
        let html = self.fetcher.fetch(url).await?;
        debug!("Fetched {} bytes from {}", html.len(), url);

        let result = self.orchestrator.run(&html, domain);
        if result.success {
            Ok(result)
        } else {
            Err(EngineError::NotFound)
        }
    }
}
