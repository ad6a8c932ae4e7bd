//! Pure scoring for the layout-aware strategies.

use crate::extract::page::PageSnapshot;
use regex_lite::Regex;
use scraper::ElementRef;
use std::sync::LazyLock;

/// Class or id fragments that suggest a price container.
const PRICE_HINTS: &[&str] = &["price", "preco", "preço", "valor", "amount", "sale", "offer", "cost"];

const CURRENCY_TOKENS: &[&str] = &["r$", "brl", "reais"];

/// Font size at which a number reads as a headline price.
pub const LARGE_FONT_PX: f32 = 14.0;

/// Text longer than this is a container, not a price.
pub const SEMANTIC_MAX_TEXT: usize = 50;

pub const STRUCTURAL_MAX_TEXT: usize = 80;

static NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+(?:[.,]\d+)*").unwrap());

/// What the scorers know about one element.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ElementFeatures {
    pub has_currency: bool,
    pub price_hint: bool,
    pub has_number: bool,
    pub visible: bool,
    pub font_px: Option<f32>,
    pub text_len: usize,
}

impl ElementFeatures {
    pub fn extract(page: &PageSnapshot, el: ElementRef<'_>, text: &str) -> Self {
        let lower = text.to_lowercase();
        let markers = page.class_and_id(el);

        Self {
            has_currency: CURRENCY_TOKENS.iter().any(|token| lower.contains(token)),
            price_hint: PRICE_HINTS.iter().any(|hint| markers.contains(hint)),
            has_number: NUMBER.is_match(text),
            visible: page.is_visible(el),
            font_px: page.layout(el).and_then(|layout| layout.font_px),
            text_len: text.chars().count(),
        }
    }
}

/// Currency 3, price-ish class or id 2, any number 1.
pub fn semantic_score(features: &ElementFeatures) -> u32 {
    let mut score = 0;
    if features.has_currency {
        score += 3;
    }
    if features.price_hint {
        score += 2;
    }
    if features.has_number {
        score += 1;
    }
    score
}

pub fn is_semantic_candidate(features: &ElementFeatures) -> bool {
    features.visible && features.text_len > 0 && features.text_len < SEMANTIC_MAX_TEXT
}

/// Currency 3, price-ish class or id 2, large font 2.
pub fn structural_score(features: &ElementFeatures) -> u32 {
    let mut score = 0;
    if features.has_currency {
        score += 3;
    }
    if features.price_hint {
        score += 2;
    }
    if features.font_px.is_some_and(|px| px >= LARGE_FONT_PX) {
        score += 2;
    }
    score
}

pub fn is_structural_candidate(features: &ElementFeatures) -> bool {
    features.visible && features.has_number && features.text_len < STRUCTURAL_MAX_TEXT
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features() -> ElementFeatures {
        ElementFeatures { visible: true, text_len: 10, ..Default::default() }
    }

    #[test]
    fn test_semantic_weights() {
        let all = ElementFeatures { has_currency: true, price_hint: true, has_number: true, ..features() };
        assert_eq!(semantic_score(&all), 6);
        assert_eq!(semantic_score(&ElementFeatures { has_number: true, ..features() }), 1);
        assert_eq!(semantic_score(&features()), 0);
    }

    #[test]
    fn test_structural_weights() {
        let big = ElementFeatures { font_px: Some(24.0), ..features() };
        assert_eq!(structural_score(&big), 2);

        let small = ElementFeatures { font_px: Some(12.0), has_currency: true, ..features() };
        assert_eq!(structural_score(&small), 3);

        let unknown = ElementFeatures { font_px: None, price_hint: true, ..features() };
        assert_eq!(structural_score(&unknown), 2);
    }

    #[test]
    fn test_candidate_filters() {
        assert!(is_semantic_candidate(&features()));
        assert!(!is_semantic_candidate(&ElementFeatures { visible: false, ..features() }));
        assert!(!is_semantic_candidate(&ElementFeatures { text_len: 50, ..features() }));
        assert!(!is_semantic_candidate(&ElementFeatures { text_len: 0, ..features() }));

        assert!(!is_structural_candidate(&features()));
        assert!(is_structural_candidate(&ElementFeatures { has_number: true, text_len: 79, ..features() }));
        assert!(!is_structural_candidate(&ElementFeatures { has_number: true, text_len: 80, ..features() }));
    }

    #[test]
    fn test_extract_features() {
        let page = PageSnapshot::parse(
            r#"<body><span id="preco-final" data-pw-box="100x20" data-pw-font="18">R$ 49,90</span></body>"#,
        );
        let el = page.select("span")[0];
        let text = page.text(el);
        let features = ElementFeatures::extract(&page, el, &text);

        assert!(features.has_currency);
        assert!(features.price_hint);
        assert!(features.has_number);
        assert!(features.visible);
        assert_eq!(features.font_px, Some(18.0));
        assert_eq!(features.text_len, 8);
    }
}
