//! Path expressions over the whole tree, hidden elements included.

use super::Strategy;
use crate::extract::models::{Domain, Extraction, Locator, PathQuery, StrategyKind};
use crate::extract::page::PageSnapshot;
use std::sync::LazyLock;

/// Structured-data attributes first, then currency-bearing text.
static PATHS: LazyLock<Vec<PathQuery>> = LazyLock::new(|| {
    vec![
        PathQuery::attribute_equals(Some("meta"), "property", "product:price:amount").reading("content"),
        PathQuery::attribute_equals(None, "itemprop", "price").reading("content"),
        PathQuery::has_attribute(None, "data-price"),
        PathQuery::text("span", "R$"),
        PathQuery::text("strong", "R$"),
        PathQuery::text("b", "R$"),
        PathQuery::text("p", "R$"),
        PathQuery::text("div", "R$"),
    ]
});

pub struct XPathStrategy {
    paths: &'static [PathQuery],
}

impl XPathStrategy {
    pub fn new() -> Self {
        Self { paths: PATHS.as_slice() }
    }
}

impl Default for XPathStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for XPathStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Xpath
    }

    fn attempt(&self, page: &PageSnapshot, _domain: &Domain) -> Option<Extraction> {
        self.paths.iter().find_map(|query| {
            let locator = Locator::XPath(query.clone());
            page.resolve(&locator).map(|price| Extraction::new(price, locator))
        })
    }
}
