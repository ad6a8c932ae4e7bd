//! Data, test-id and ARIA attributes that name a price.

use super::Strategy;
use crate::extract::models::{Domain, Extraction, Locator, StrategyKind};
use crate::extract::page::PageSnapshot;

/// Selector and, when the value may live in it, the attribute to read after the text.
const ATTRIBUTE_LOCATORS: &[(&str, Option<&str>)] = &[
    ("[data-price]", Some("data-price")),
    ("[data-price-amount]", Some("data-price-amount")),
    ("[data-product-price]", Some("data-product-price")),
    ("[data-sale-price]", Some("data-sale-price")),
    ("[data-testid*='price']", None),
    ("[data-test*='price']", None),
    ("[data-qa*='price']", None),
    ("[data-cy*='price']", None),
    ("[data-automation*='price']", None),
    ("[aria-label*='preço']", Some("aria-label")),
    ("[aria-label*='Preço']", Some("aria-label")),
    ("[aria-label*='price']", Some("aria-label")),
    ("[title*='preço']", Some("title")),
    ("[title*='Preço']", Some("title")),
];

#[derive(Default)]
pub struct DataAttributeStrategy;

impl DataAttributeStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl Strategy for DataAttributeStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::DataAttribute
    }

    fn attempt(&self, page: &PageSnapshot, _domain: &Domain) -> Option<Extraction> {
        ATTRIBUTE_LOCATORS.iter().find_map(|(selector, attribute)| {
            let locator = match attribute {
                Some(attribute) => Locator::attribute(*selector, *attribute),
                None => Locator::css(*selector),
            };
            page.resolve(&locator).map(|price| Extraction::new(price, locator))
        })
    }
}
