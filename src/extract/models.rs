//! Data models shared by the extraction cascade, the cache and the backends.

use crate::error::EngineError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Normalized hostname: lowercased, `www.` stripped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Domain(String);

impl Domain {
    /// Normalizes a bare hostname.
    pub fn new(host: &str) -> Self {
        let host = host.trim().trim_end_matches('.').to_lowercase();
        let host = host.strip_prefix("www.").unwrap_or(&host);
        Self(host.to_string())
    }

    /// Derives the domain from a product URL. Scheme-less URLs are read as https.
    pub fn from_url(raw: &str) -> Result<Self, EngineError> {
        let raw = raw.trim();
        let parsed = match Url::parse(raw) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(&format!("https://{raw}"))
                .map_err(|_| EngineError::InvalidUrl(raw.to_string()))?,
            Err(_) => return Err(EngineError::InvalidUrl(raw.to_string())),
        };

        match parsed.host_str() {
            Some(host) if !host.is_empty() => Ok(Self::new(host)),
            _ => Err(EngineError::InvalidUrl(raw.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The host followed by each parent suffix that still has two labels.
    ///
    /// `loja.kabum.com.br` yields `loja.kabum.com.br`, `kabum.com.br`, `com.br`.
    pub fn candidates(&self) -> impl Iterator<Item = &str> {
        let host = self.0.as_str();
        std::iter::successors(Some(host), |&current| {
            current.split_once('.').map(|(_, rest)| rest).filter(|rest| rest.contains('.'))
        })
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// XPath-equivalent path expression, evaluated over the whole tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct PathQuery {
    /// Element name, `None` for `*`.
    pub tag: Option<String>,
    /// Direct text of the element must contain this needle.
    pub text_contains: Option<String>,
    /// Attribute that must be present.
    pub attribute: Option<String>,
    /// Exact value required for `attribute`.
    pub attribute_equals: Option<String>,
    /// Read this attribute instead of the element text (`/@attr`).
    pub read_attribute: Option<String>,
}

impl PathQuery {
    /// `//tag[contains(text(), 'needle')]`
    pub fn text(tag: &str, needle: &str) -> Self {
        Self {
            tag: Some(tag.to_string()),
            text_contains: Some(needle.to_string()),
            ..Self::default()
        }
    }

    /// `//tag[@attr]`
    pub fn has_attribute(tag: Option<&str>, attribute: &str) -> Self {
        Self {
            tag: tag.map(String::from),
            attribute: Some(attribute.to_string()),
            ..Self::default()
        }
    }

    /// `//tag[@attr='value']`
    pub fn attribute_equals(tag: Option<&str>, attribute: &str, value: &str) -> Self {
        Self {
            tag: tag.map(String::from),
            attribute: Some(attribute.to_string()),
            attribute_equals: Some(value.to_string()),
            ..Self::default()
        }
    }

    /// Appends `/@attr`.
    pub fn reading(mut self, attribute: &str) -> Self {
        self.read_attribute = Some(attribute.to_string());
        self
    }
}

impl fmt::Display for PathQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "//{}", self.tag.as_deref().unwrap_or("*"))?;

        if let Some(needle) = &self.text_contains {
            write!(f, "[contains(text(), '{needle}')]")?;
        }

        match (&self.attribute, &self.attribute_equals) {
            (Some(attr), Some(value)) => write!(f, "[@{attr}='{value}']")?,
            (Some(attr), None) => write!(f, "[@{attr}]")?,
            _ => {}
        }

        if let Some(read) = &self.read_attribute {
            write!(f, "/@{read}")?;
        }

        Ok(())
    }
}

/// Where in a page a price might appear.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    Css(String),
    XPath(PathQuery),
    Attribute { selector: String, attribute: String },
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css(selector.into())
    }

    pub fn attribute(selector: impl Into<String>, attribute: impl Into<String>) -> Self {
        Locator::Attribute { selector: selector.into(), attribute: attribute.into() }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css(selector) => f.write_str(selector),
            Locator::XPath(query) => write!(f, "{query}"),
            Locator::Attribute { selector, attribute } => write!(f, "{selector}@{attribute}"),
        }
    }
}

/// The tag each strategy reports in results and telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    CachedSelector,
    DomainSelector,
    Xpath,
    DataAttribute,
    SemanticAnalysis,
    CommonSelector,
    TextPattern,
    StructuralAnalysis,
    TextSearch,
    HtmlBodyPattern,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::CachedSelector => "cached-selector",
            StrategyKind::DomainSelector => "domain-selector",
            StrategyKind::Xpath => "xpath",
            StrategyKind::DataAttribute => "data-attribute",
            StrategyKind::SemanticAnalysis => "semantic-analysis",
            StrategyKind::CommonSelector => "common-selector",
            StrategyKind::TextPattern => "text-pattern",
            StrategyKind::StructuralAnalysis => "structural-analysis",
            StrategyKind::TextSearch => "text-search",
            StrategyKind::HtmlBodyPattern => "html-body-pattern",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated price and the locator that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub price: f64,
    pub locator: Locator,
}

impl Extraction {
    pub fn new(price: f64, locator: Locator) -> Self {
        Self { price, locator }
    }
}

/// Last locator that worked for a domain.
#[derive(Debug, Clone)]
pub struct CachedSelector {
    pub domain: Domain,
    pub locator: Locator,
    pub last_used_at: DateTime<Utc>,
    pub success_count: u32,
}

/// One strategy run against one page, kept for diagnostics only.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionAttempt {
    pub domain: Domain,
    pub strategy: StrategyKind,
    pub locator: Option<String>,
    pub success: bool,
    pub price: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

/// The only value that leaves the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapingResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<StrategyKind>,
}

impl ScrapingResult {
    pub fn found(extraction: &Extraction, strategy: StrategyKind) -> Self {
        Self {
            success: true,
            price: Some(extraction.price),
            error: None,
            locator: Some(extraction.locator.to_string()),
            strategy: Some(strategy),
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self { success: false, price: None, error: Some(error.into()), locator: None, strategy: None }
    }

    pub fn not_found() -> Self {
        Self::failure(EngineError::NotFound.to_string())
    }
}

/// Telemetry summary for one domain.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DomainStats {
    pub domain: String,
    pub attempts: usize,
    pub successes: usize,
    pub last_success: Option<StrategyKind>,
    pub last_price: Option<f64>,
}

impl DomainStats {
    pub fn success_rate(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            self.successes as f64 / self.attempts as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_normalization() {
        assert_eq!(Domain::new("WWW.Kabum.com.br").as_str(), "kabum.com.br");
        assert_eq!(Domain::new("loja.exemplo.com.br.").as_str(), "loja.exemplo.com.br");
    }

    #[test]
    fn test_domain_from_url() {
        let domain = Domain::from_url("https://www.magazineluiza.com.br/produto/p/123/").unwrap();
        assert_eq!(domain.as_str(), "magazineluiza.com.br");

        let domain = Domain::from_url("www.amazon.com.br/dp/B0TEST").unwrap();
        assert_eq!(domain.as_str(), "amazon.com.br");

        assert!(matches!(Domain::from_url("mailto:someone@x.com"), Err(EngineError::InvalidUrl(_))));
        assert!(Domain::from_url("http://").is_err());
    }

    #[test]
    fn test_domain_candidates() {
        let domain = Domain::new("produto.mercadolivre.com.br");
        let candidates: Vec<_> = domain.candidates().collect();
        assert_eq!(candidates, vec!["produto.mercadolivre.com.br", "mercadolivre.com.br", "com.br"]);

        let domain = Domain::new("localhost");
        assert_eq!(domain.candidates().collect::<Vec<_>>(), vec!["localhost"]);
    }

    #[test]
    fn test_path_query_display() {
        assert_eq!(PathQuery::text("span", "R$").to_string(), "//span[contains(text(), 'R$')]");
        assert_eq!(PathQuery::has_attribute(None, "data-price").to_string(), "//*[@data-price]");
        assert_eq!(
            PathQuery::attribute_equals(Some("meta"), "property", "product:price:amount")
                .reading("content")
                .to_string(),
            "//meta[@property='product:price:amount']/@content"
        );
    }

    #[test]
    fn test_locator_display() {
        assert_eq!(Locator::css(".price").to_string(), ".price");
        assert_eq!(Locator::attribute("[data-price]", "data-price").to_string(), "[data-price]@data-price");
    }

    #[test]
    fn test_scraping_result_serde() {
        let result = ScrapingResult::found(
            &Extraction::new(1299.99, Locator::css(".price")),
            StrategyKind::CommonSelector,
        );
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"strategy\":\"common-selector\""));
        assert!(!json.contains("error"));

        let parsed: ScrapingResult = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, result);

        let failed = ScrapingResult::not_found();
        assert!(!failed.success);
        assert_eq!(failed.error.as_deref(), Some("all strategies failed"));
    }

    #[test]
    fn test_domain_stats_rate() {
        let stats = DomainStats { attempts: 4, successes: 1, ..Default::default() };
        assert_eq!(stats.success_rate(), 0.25);
        assert_eq!(DomainStats::default().success_rate(), 0.0);
    }
}
