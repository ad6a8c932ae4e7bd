//! Parsed page view shared by all strategies.
//!
//! The render backend stamps every element with its bounding box and computed
//! font size (see [`BOX_ATTR`], [`FONT_ATTR`]) before taking the HTML snapshot,
//! so layout-aware strategies can run on a plain `scraper` document. Pages
//! fetched without a browser have no stamps; their elements count as visible
//! with unknown font size.

use crate::extract::models::{Locator, PathQuery};
use crate::extract::normalizer::{clean, extract_price};
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use tracing::trace;

/// `WIDTHxHEIGHT` in CSS pixels, written by the render backend.
pub const BOX_ATTR: &str = "data-pw-box";

/// Computed font size in CSS pixels, written by the render backend.
pub const FONT_ATTR: &str = "data-pw-font";

/// Elements whose text never holds a visible price.
const IGNORED_TAGS: &[&str] = &["script", "style", "noscript", "template", "head", "title"];

static BODY_ELEMENTS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("body *").unwrap());

static BODY: LazyLock<Selector> = LazyLock::new(|| Selector::parse("body").unwrap());

/// Rendered geometry of one element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub width: f32,
    pub height: f32,
    pub font_px: Option<f32>,
}

/// A parsed document plus the helpers strategies need to query it.
pub struct PageSnapshot {
    document: Html,
    has_layout: bool,
}

impl PageSnapshot {
    pub fn parse(html: &str) -> Self {
        let document = Html::parse_document(html);
        let has_layout = html.contains(BOX_ATTR);
        Self { document, has_layout }
    }

    /// True when the HTML came from the render backend with layout stamps.
    pub fn has_layout(&self) -> bool {
        self.has_layout
    }

    /// Elements matching a CSS selector. Invalid selectors match nothing.
    pub fn select(&self, css: &str) -> Vec<ElementRef<'_>> {
        match Selector::parse(css) {
            Ok(selector) => self.document.select(&selector).collect(),
            Err(e) => {
                trace!("Skipping unparsable selector {:?}: {:?}", css, e);
                Vec::new()
            }
        }
    }

    /// Every element inside `<body>` in document order, minus script-like tags.
    pub fn elements(&self) -> impl Iterator<Item = ElementRef<'_>> {
        self.document
            .select(&BODY_ELEMENTS)
            .filter(|el| !el.ancestors().filter_map(ElementRef::wrap).any(is_ignored) && !is_ignored(*el))
    }

    /// The `<body>` element, if the parser produced one.
    pub fn body(&self) -> Option<ElementRef<'_>> {
        self.document.select(&BODY).next()
    }

    /// Visible text of an element with whitespace collapsed.
    pub fn text(&self, el: ElementRef<'_>) -> String {
        let raw: String = el
            .descendants()
            .filter_map(|node| {
                let text = node.value().as_text()?;
                let parent = node.parent().and_then(ElementRef::wrap)?;
                (!is_ignored(parent)).then_some(&**text)
            })
            .collect();
        clean(&raw)
    }

    /// Text held directly by the element, excluding its children.
    pub fn own_text(&self, el: ElementRef<'_>) -> String {
        let raw: String =
            el.children().filter_map(|node| node.value().as_text().map(|t| &**t)).collect();
        clean(&raw)
    }

    pub fn layout(&self, el: ElementRef<'_>) -> Option<Layout> {
        let (width, height) = el.value().attr(BOX_ATTR)?.split_once('x')?;
        let font_px = el.value().attr(FONT_ATTR).and_then(|f| f.trim().parse().ok());

        Some(Layout {
            width: width.trim().parse().ok()?,
            height: height.trim().parse().ok()?,
            font_px,
        })
    }

    /// Elements without layout information are assumed visible.
    pub fn is_visible(&self, el: ElementRef<'_>) -> bool {
        self.layout(el).map_or(true, |layout| layout.width > 0.0 && layout.height > 0.0)
    }

    /// Lowercased `class` and `id` of an element, space separated.
    pub fn class_and_id(&self, el: ElementRef<'_>) -> String {
        let class = el.value().attr("class").unwrap_or_default();
        let id = el.value().id().unwrap_or_default();
        format!("{class} {id}").to_lowercase()
    }

    /// A CSS selector that matches exactly this element.
    ///
    /// Uses `#id` when the element (or an ancestor) has a unique, selector-safe
    /// id, and `tag:nth-child(n)` steps otherwise.
    pub fn css_path(&self, el: ElementRef<'_>) -> String {
        let mut segments = Vec::new();
        let mut current = Some(el);

        while let Some(node) = current {
            let name = node.value().name();

            if let Some(id) = node.value().id() {
                if is_simple_ident(id) && self.select(&format!("#{id}")).len() == 1 {
                    segments.push(format!("#{id}"));
                    break;
                }
            }

            if name == "html" {
                segments.push(name.to_string());
                break;
            }

            let index = node.prev_siblings().filter(|sibling| sibling.value().is_element()).count() + 1;
            segments.push(format!("{name}:nth-child({index})"));
            current = node.parent().and_then(ElementRef::wrap);
        }

        segments.reverse();
        segments.join(" > ")
    }

    /// Values selected by an XPath-equivalent query, in document order.
    pub fn evaluate_path(&self, query: &PathQuery) -> Vec<String> {
        let tag = query.tag.as_deref().unwrap_or("*");
        let Ok(selector) = Selector::parse(tag) else {
            return Vec::new();
        };

        let mut values = Vec::new();
        for el in self.document.select(&selector) {
            if is_ignored(el) {
                continue;
            }

            if let Some(attribute) = &query.attribute {
                match el.value().attr(attribute) {
                    None => continue,
                    Some(value) => {
                        if query.attribute_equals.as_ref().is_some_and(|expected| expected != value) {
                            continue;
                        }
                    }
                }
            }

            if let Some(needle) = &query.text_contains {
                if !self.own_text(el).contains(needle.as_str()) {
                    continue;
                }
            }

            let value = match &query.read_attribute {
                Some(read) => el.value().attr(read).map(String::from).or_else(|| Some(self.text(el))),
                None => {
                    let text = self.text(el);
                    match (&query.attribute, text.is_empty()) {
                        (Some(attribute), true) => el.value().attr(attribute).map(String::from),
                        _ => Some(text),
                    }
                }
            };

            if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
                values.push(value);
            }
        }

        values
    }

    /// Replays a locator and returns the first candidate that normalizes to a price.
    pub fn resolve(&self, locator: &Locator) -> Option<f64> {
        match locator {
            Locator::Css(css) => self.select(css).into_iter().find_map(|el| {
                let text = self.text(el);
                if text.is_empty() {
                    el.value().attr("content").and_then(extract_price)
                } else {
                    extract_price(&text)
                }
            }),
            Locator::XPath(query) => {
                self.evaluate_path(query).iter().find_map(|value| extract_price(value))
            }
            Locator::Attribute { selector, attribute } => self.select(selector).into_iter().find_map(|el| {
                let text = self.text(el);
                extract_price(&text).or_else(|| el.value().attr(attribute).and_then(extract_price))
            }),
        }
    }
}

fn is_ignored(el: ElementRef<'_>) -> bool {
    IGNORED_TAGS.contains(&el.value().name())
}

fn is_simple_ident(id: &str) -> bool {
    let mut chars = id.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
