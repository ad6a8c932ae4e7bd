//! Price-location strategies, tried in cascade order by the orchestrator.
//!
//! A strategy only locates; every candidate text goes through
//! [`extract_price`](crate::extract::normalizer::extract_price) before it can win.

mod analysis;
mod attributes;
mod path;
mod selectors;
mod text;

pub use analysis::{SemanticStrategy, StructuralStrategy};
pub use attributes::DataAttributeStrategy;
pub use path::XPathStrategy;
pub use selectors::{CachedSelectorStrategy, CommonSelectorStrategy, DomainSelectorStrategy};
pub use text::{BodyPatternStrategy, TextPatternStrategy, TextSearchStrategy};

use crate::extract::cache::SelectorCache;
use crate::extract::models::{Domain, Extraction, StrategyKind};
use crate::extract::page::PageSnapshot;
use std::sync::Arc;

/// One way of finding a price on a page.
pub trait Strategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Returns the first validated price this strategy can locate.
    fn attempt(&self, page: &PageSnapshot, domain: &Domain) -> Option<Extraction>;
}

/// Full cascade for browser-rendered pages.
pub fn rendered_cascade(cache: Arc<dyn SelectorCache>) -> Vec<Box<dyn Strategy>> {
    vec![
        Box::new(CachedSelectorStrategy::new(cache)),
        Box::new(DomainSelectorStrategy::new()),
        Box::new(XPathStrategy::new()),
        Box::new(DataAttributeStrategy::new()),
        Box::new(SemanticStrategy::new()),
        Box::new(CommonSelectorStrategy::new()),
        Box::new(TextPatternStrategy::new()),
        Box::new(StructuralStrategy::new()),
        Box::new(TextSearchStrategy::new()),
    ]
}

/// Reduced cascade for the plain-HTTP fallback.
pub fn html_cascade() -> Vec<Box<dyn Strategy>> {
    vec![Box::new(DomainSelectorStrategy::with_common_fallback()), Box::new(BodyPatternStrategy::new())]
}
