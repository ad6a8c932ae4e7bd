//! Regex scans over text nodes and whole-body text.

use super::Strategy;
use crate::extract::models::{Domain, Extraction, Locator, StrategyKind};
use crate::extract::normalizer::{clean, extract_price, has_positive_context};
use crate::extract::page::PageSnapshot;
use regex_lite::Regex;
use scraper::ElementRef;
use std::sync::LazyLock;

/// Characters of context kept on each side of a match.
const CONTEXT_RADIUS: usize = 20;

/// Extra words that announce a price in Brazilian storefront copy.
const PRICE_INDICATORS: &[&str] = &["por", "pix", "boleto", "apenas"];

/// Page regions whose numbers are never the product price.
const EXCLUDED_REGIONS: &[&str] =
    &["footer", "nav", "breadcrumb", "legal", "pagination", "social", "comment"];

/// Last-resort elements shorter than this are tried before longer ones.
const TEXT_SEARCH_PREFERRED: usize = 100;

static CURRENCY_SHAPES: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        Regex::new(r"[Rr]\$\s*\d{1,3}(?:\.\d{3})*(?:,\d{2})?").unwrap(),
        Regex::new(r"\d{1,3}(?:\.\d{3})*,\d{2}").unwrap(),
    ]
});

fn has_price_indicator(lower: &str) -> bool {
    has_positive_context(lower)
        || lower
            .split(|c: char| !c.is_alphanumeric())
            .any(|word| PRICE_INDICATORS.contains(&word))
}

/// Up to `radius` characters either side of `start..end`, on char boundaries.
fn window(text: &str, start: usize, end: usize, radius: usize) -> &str {
    let from = text[..start].char_indices().rev().take(radius).last().map_or(start, |(i, _)| i);
    let to = text[end..]
        .char_indices()
        .take(radius)
        .last()
        .map_or(end, |(i, c)| end + i + c.len_utf8());
    &text[from..to]
}

/// True when a class or id segment starts with `region` (`site-footer`,
/// `navbar`, `social_links`), never on a bare substring (`unavailable`).
fn marks_region(markers: &str, region: &str) -> bool {
    markers
        .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .any(|segment| segment.starts_with(region))
}

fn in_excluded_region(page: &PageSnapshot, el: ElementRef<'_>) -> bool {
    std::iter::once(el).chain(el.ancestors().filter_map(ElementRef::wrap)).any(|node| {
        let name = node.value().name();
        let markers = page.class_and_id(node);
        EXCLUDED_REGIONS.iter().any(|region| name == *region || marks_region(&markers, region))
    })
}

/// Currency-shaped text next to a price word, outside footers and navigation.
#[derive(Default)]
pub struct TextPatternStrategy;

impl TextPatternStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl Strategy for TextPatternStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::TextPattern
    }

    fn attempt(&self, page: &PageSnapshot, _domain: &Domain) -> Option<Extraction> {
        for el in page.elements() {
            let own = page.own_text(el);
            if own.is_empty() {
                continue;
            }

            for shape in CURRENCY_SHAPES.iter() {
                for found in shape.find_iter(&own) {
                    let context = window(&own, found.start(), found.end(), CONTEXT_RADIUS).to_lowercase();
                    let near_indicator = has_price_indicator(&context)
                        || has_price_indicator(&page.text(el).to_lowercase());
                    if !near_indicator || in_excluded_region(page, el) {
                        continue;
                    }

                    if let Some(price) = extract_price(found.as_str()) {
                        return Some(Extraction::new(price, Locator::Css(page.css_path(el))));
                    }
                }
            }
        }
        None
    }
}

/// Any element mentioning `R$`, in document order, short ones first.
#[derive(Default)]
pub struct TextSearchStrategy;

impl TextSearchStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl Strategy for TextSearchStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::TextSearch
    }

    fn attempt(&self, page: &PageSnapshot, _domain: &Domain) -> Option<Extraction> {
        let candidates: Vec<(ElementRef<'_>, String)> = page
            .elements()
            .filter_map(|el| {
                let text = page.text(el);
                text.contains("R$").then_some((el, text))
            })
            .collect();

        // Short elements first, then anything left
        let (short, long): (Vec<_>, Vec<_>) =
            candidates.into_iter().partition(|(_, text)| text.chars().count() < TEXT_SEARCH_PREFERRED);

        short.into_iter().chain(long).find_map(|(el, text)| {
            let price = extract_price(&text)?;
            Some(Extraction::new(price, Locator::Css(page.css_path(el))))
        })
    }
}

/// First currency-shaped match anywhere in the body text.
#[derive(Default)]
pub struct BodyPatternStrategy;

impl BodyPatternStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl Strategy for BodyPatternStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::HtmlBodyPattern
    }

    fn attempt(&self, page: &PageSnapshot, _domain: &Domain) -> Option<Extraction> {
        let body = clean(&page.text(page.body()?));

        CURRENCY_SHAPES.iter().find_map(|shape| {
            shape
                .find_iter(&body)
                .find_map(|found| extract_price(found.as_str()))
                .map(|price| Extraction::new(price, Locator::css("body")))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn domain() -> Domain {
        Domain::new("loja.com.br")
    }

    #[test]
    fn test_window_is_char_safe() {
        let text = "ção R$ 10,00 à vista";
        let start = text.find("R$").unwrap();
        let end = start + "R$ 10,00".len();
        assert_eq!(window(text, start, end, 2), "o R$ 10,00 à");
        assert_eq!(window(text, start, end, 100), text);
    }

    #[test]
    fn test_text_pattern_with_indicator() {
        let page = PageSnapshot::parse("<body><div><p>Por apenas 1.299,90 no pix</p></div></body>");
        let found = TextPatternStrategy::new().attempt(&page, &domain()).unwrap();
        assert_eq!(found.price, 1299.9);
        assert_eq!(page.resolve(&found.locator), Some(1299.9));
    }

    #[test]
    fn test_text_pattern_needs_indicator() {
        let page = PageSnapshot::parse("<body><p>Avaliação 4,50 de 5</p></body>");
        assert!(TextPatternStrategy::new().attempt(&page, &domain()).is_none());
    }

    #[test]
    fn test_text_pattern_skips_footer() {
        let page = PageSnapshot::parse(
            r#"<body><footer><p>Frete grátis acima de R$ 199,00</p></footer>
               <div class="social-links"><p>R$ 5,00 de desconto</p></div></body>"#,
        );
        assert!(TextPatternStrategy::new().attempt(&page, &domain()).is_none());
    }

    #[test]
    fn test_region_markers_are_segments() {
        assert!(marks_region("site-footer", "footer"));
        assert!(marks_region("navbar main", "nav"));
        assert!(marks_region("social_links", "social"));
        assert!(!marks_region("produto unavailable", "nav"));
        assert!(!marks_region("canvas-wrapper", "nav"));
    }

    #[test]
    fn test_text_pattern_ignores_substring_markers() {
        let page = PageSnapshot::parse(
            r#"<body><div class="stock-unavailable"><p>Por R$ 99,90</p></div></body>"#,
        );
        let found = TextPatternStrategy::new().attempt(&page, &domain()).unwrap();
        assert_eq!(found.price, 99.9);
    }

    #[test]
    fn test_text_search_short_elements() {
        let page = PageSnapshot::parse(
            "<body><section><p>Leve já</p><span>R$ 45,00</span></section></body>",
        );
        let found = TextSearchStrategy::new().attempt(&page, &domain()).unwrap();
        assert_eq!(found.price, 45.0);
    }

    #[test]
    fn test_text_search_falls_back_to_long_text() {
        let long = format!("<body><p>R$ 45,00 {}</p></body>", "texto ".repeat(30));
        let page = PageSnapshot::parse(&long);
        let found = TextSearchStrategy::new().attempt(&page, &domain()).unwrap();
        assert_eq!(found.price, 45.0);
    }

    #[test]
    fn test_text_search_prefers_short_text() {
        let html = format!(
            "<body><p>Antes R$ 99,00 {}</p><span>R$ 79,00</span></body>",
            "texto ".repeat(30)
        );
        let page = PageSnapshot::parse(&html);
        let found = TextSearchStrategy::new().attempt(&page, &domain()).unwrap();
        assert_eq!(found.price, 79.0);
    }

    #[test]
    fn test_body_pattern() {
        let page = PageSnapshot::parse(
            "<body><script>var p = 'R$ 1,00'</script><div>Oferta</div><div>R$ 2.499,00</div></body>",
        );
        let found = BodyPatternStrategy::new().attempt(&page, &domain()).unwrap();
        assert_eq!(found.price, 2499.0);
        assert_eq!(found.locator, Locator::css("body"));
    }
}
