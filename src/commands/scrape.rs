//! Scrape command implementation.

use crate::config::Config;
use crate::engine::PriceEngine;
use crate::format::{Formatter, ScrapeReport};
use anyhow::{Context, Result};
use tracing::info;

/// Scrapes the current price of one or more product pages.
pub struct ScrapeCommand {
    config: Config,
}

impl ScrapeCommand {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Scrapes every URL and returns formatted output. Failures are reported
    /// per URL, never as an `Err`.
    pub async fn execute(&self, urls: &[String], stats: bool) -> Result<String> {
        let engine = PriceEngine::new(&self.config).context("Failed to create price engine")?;

        let output = self.execute_with_engine(&engine, urls, stats).await;
        engine.shutdown().await;

        Ok(output)
    }

    /// Scrapes with a provided engine (for testing).
    pub async fn execute_with_engine(&self, engine: &PriceEngine, urls: &[String], stats: bool) -> String {
        let mut reports = Vec::with_capacity(urls.len());

        for url in urls {
            let url = url.trim();
            info!("Scraping {}", url);

            let result = engine.scrape_price_auto(url).await;
            reports.push(ScrapeReport { url: url.to_string(), result });
        }

        let formatter = Formatter::new(self.config.format);
        let mut output = formatter.format_reports(&reports);

        if stats {
            output.push_str("\n\n");
            output.push_str(&formatter.format_stats(&engine.all_stats()));
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use crate::error::EngineError;
    use crate::http::PageFetcher;
    use async_trait::async_trait;

    /// Serves one page for every URL.
    struct MockFetcher {
        html: Option<String>,
    }

    #[async_trait]
    impl PageFetcher for MockFetcher {
        async fn fetch(&self, _url: &str) -> Result<String, EngineError> {
            self.html.clone().ok_or_else(|| EngineError::Http("request failed with status: 404".into()))
        }
    }

    fn engine(config: &Config, html: Option<&str>) -> PriceEngine {
        let fetcher = MockFetcher { html: html.map(String::from) };
        PriceEngine::with_backends(config, None, Box::new(fetcher))
    }

    fn config(format: OutputFormat) -> Config {
        Config { render: false, format, ..Config::default() }
    }

    #[tokio::test]
    async fn test_scrape_json() {
        let config = config(OutputFormat::Json);
        let engine = engine(&config, Some("<html><body><p>Apenas R$ 249,90 no pix</p></body></html>"));
        let cmd = ScrapeCommand::new(config);

        let output = cmd.execute_with_engine(&engine, &["https://loja.com.br/p/1".to_string()], false).await;

        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed[0]["url"], "https://loja.com.br/p/1");
        assert_eq!(parsed[0]["success"], true);
        assert_eq!(parsed[0]["price"], 249.9);
    }

    #[tokio::test]
    async fn test_scrape_reports_failures_per_url() {
        let config = config(OutputFormat::Table);
        let engine = engine(&config, None);
        let cmd = ScrapeCommand::new(config);

        let urls = vec!["https://loja.com.br/p/1".to_string(), "not a url".to_string()];
        let output = cmd.execute_with_engine(&engine, &urls, false).await;

        assert!(output.contains("html backend: HTTP error: request failed with status: 404"), "{output}");
        assert!(output.contains("invalid URL"));
        assert!(output.contains("Found: 0/2 prices"));
    }

    #[tokio::test]
    async fn test_scrape_with_stats() {
        let config = config(OutputFormat::Csv);
        let engine = engine(&config, Some("<html><body><p>Por R$ 10,00</p></body></html>"));
        let cmd = ScrapeCommand::new(config);

        let output = cmd.execute_with_engine(&engine, &["https://www.loja.com.br/p/1".to_string()], true).await;

        assert!(output.contains("domain,attempts,successes,last_strategy,last_price"));
        assert!(output.contains("loja.com.br,"));
        assert!(output.contains("html-body-pattern,10.00"));
    }
}
