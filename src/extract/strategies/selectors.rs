//! Selector-list strategies: cached, storefront-specific and generic.

use super::Strategy;
use crate::extract::cache::SelectorCache;
use crate::extract::knowledge::{domain_locators, known_locators, COMMON_LOCATORS};
use crate::extract::models::{Domain, Extraction, Locator, StrategyKind};
use crate::extract::page::PageSnapshot;
use std::sync::Arc;
use tracing::{debug, trace};

/// Tries each CSS selector in order; the first one that yields a price wins.
fn first_match(page: &PageSnapshot, selectors: &[&str]) -> Option<Extraction> {
    selectors.iter().find_map(|selector| {
        let locator = Locator::css(*selector);
        let price = page.resolve(&locator)?;
        trace!("Selector {} matched {}", selector, price);
        Some(Extraction::new(price, locator))
    })
}

/// Replays the locator that last worked for this domain.
pub struct CachedSelectorStrategy {
    cache: Arc<dyn SelectorCache>,
}

impl CachedSelectorStrategy {
    pub fn new(cache: Arc<dyn SelectorCache>) -> Self {
        Self { cache }
    }
}

impl Strategy for CachedSelectorStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::CachedSelector
    }

    fn attempt(&self, page: &PageSnapshot, domain: &Domain) -> Option<Extraction> {
        let locator = self.cache.get(domain)?;

        match page.resolve(&locator) {
            Some(price) => Some(Extraction::new(price, locator)),
            None => {
                debug!("Cached selector {} no longer matches on {}", locator, domain);
                self.cache.record_failure(domain);
                None
            }
        }
    }
}

/// Storefront-specific selectors from the knowledge base.
pub struct DomainSelectorStrategy {
    fallback_to_common: bool,
}

impl DomainSelectorStrategy {
    /// Only runs for storefronts with a dedicated entry.
    pub fn new() -> Self {
        Self { fallback_to_common: false }
    }

    /// Uses the generic list for storefronts without an entry.
    pub fn with_common_fallback() -> Self {
        Self { fallback_to_common: true }
    }
}

impl Default for DomainSelectorStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for DomainSelectorStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::DomainSelector
    }

    fn attempt(&self, page: &PageSnapshot, domain: &Domain) -> Option<Extraction> {
        let selectors =
            if self.fallback_to_common { known_locators(domain) } else { domain_locators(domain)? };
        first_match(page, selectors)
    }
}

/// Cross-storefront heuristics.
#[derive(Default)]
pub struct CommonSelectorStrategy;

impl CommonSelectorStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl Strategy for CommonSelectorStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::CommonSelector
    }

    fn attempt(&self, page: &PageSnapshot, _domain: &Domain) -> Option<Extraction> {
        first_match(page, COMMON_LOCATORS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::cache::MemorySelectorCache;
    use chrono::TimeDelta;

    fn cache() -> Arc<MemorySelectorCache> {
        Arc::new(MemorySelectorCache::new(TimeDelta::hours(24), 100))
    }

    #[test]
    fn test_cached_hit() {
        let cache = cache();
        let domain = Domain::new("loja.com.br");
        cache.record_success(&domain, &Locator::css("#valor"));

        let page = PageSnapshot::parse(r#"<div id="valor">R$ 10,50</div>"#);
        let found = CachedSelectorStrategy::new(cache.clone()).attempt(&page, &domain).unwrap();
        assert_eq!(found.price, 10.5);
        assert_eq!(found.locator, Locator::css("#valor"));
    }

    #[test]
    fn test_cached_miss_drops_entry() {
        let cache = cache();
        let domain = Domain::new("loja.com.br");
        cache.record_success(&domain, &Locator::css("#valor"));

        let page = PageSnapshot::parse(r#"<div id="outro">R$ 10,50</div>"#);
        assert!(CachedSelectorStrategy::new(cache.clone()).attempt(&page, &domain).is_none());
        assert!(cache.get(&domain).is_none());
    }

    #[test]
    fn test_cached_without_entry() {
        let page = PageSnapshot::parse(r#"<div class="price">R$ 10,50</div>"#);
        let domain = Domain::new("loja.com.br");
        assert!(CachedSelectorStrategy::new(cache()).attempt(&page, &domain).is_none());
    }

    #[test]
    fn test_domain_selectors() {
        let page = PageSnapshot::parse(
            r#"<h4 class="oldPrice">R$ 5.999,00</h4><h4 class="finalPrice">R$ 4.599,90</h4>"#,
        );
        let found = DomainSelectorStrategy::new().attempt(&page, &Domain::new("kabum.com.br")).unwrap();
        assert_eq!(found.price, 4599.9);
        assert_eq!(found.locator, Locator::css("h4.finalPrice"));
    }

    #[test]
    fn test_domain_selectors_skip_unknown_storefront() {
        let page = PageSnapshot::parse(r#"<span class="price">R$ 10,00</span>"#);
        let domain = Domain::new("loja-exemplo.com.br");
        assert!(DomainSelectorStrategy::new().attempt(&page, &domain).is_none());

        let found = DomainSelectorStrategy::with_common_fallback().attempt(&page, &domain).unwrap();
        assert_eq!(found.price, 10.0);
    }

    #[test]
    fn test_common_selectors_skip_unparsable_text() {
        let page = PageSnapshot::parse(
            r#"<span itemprop="price">Consulte</span><div class="product-price">R$ 79,90</div>"#,
        );
        let found = CommonSelectorStrategy::new().attempt(&page, &Domain::new("x.com.br")).unwrap();
        assert_eq!(found.price, 79.9);
        assert_eq!(found.locator, Locator::css(".product-price"));
    }
}
