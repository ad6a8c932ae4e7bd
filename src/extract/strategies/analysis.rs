//! Layout-aware strategies that rank visible elements before parsing them.

use super::Strategy;
use crate::extract::models::{Domain, Extraction, Locator, StrategyKind};
use crate::extract::normalizer::extract_price;
use crate::extract::page::PageSnapshot;
use crate::extract::scoring::{
    is_semantic_candidate, is_structural_candidate, semantic_score, structural_score, ElementFeatures,
};
use scraper::ElementRef;
use tracing::trace;

const SEMANTIC_TOP: usize = 20;
const STRUCTURAL_TOP: usize = 10;

struct Ranked<'a> {
    score: u32,
    el: ElementRef<'a>,
    text: String,
}

/// Scores every element, keeps positive scores, sorts best first.
///
/// Ties go to the shorter text, then to document order, so a leaf price beats
/// the wrapper that contains it.
fn rank<'a>(
    page: &'a PageSnapshot,
    keep: fn(&ElementFeatures) -> bool,
    score: fn(&ElementFeatures) -> u32,
) -> Vec<Ranked<'a>> {
    let mut ranked: Vec<Ranked<'a>> = page
        .elements()
        .filter_map(|el| {
            let text = page.text(el);
            let features = ElementFeatures::extract(page, el, &text);
            if !keep(&features) {
                return None;
            }
            let score = score(&features);
            (score > 0).then_some(Ranked { score, el, text })
        })
        .collect();

    ranked.sort_by(|a, b| b.score.cmp(&a.score).then(a.text.len().cmp(&b.text.len())));
    ranked
}

fn first_price(page: &PageSnapshot, ranked: Vec<Ranked<'_>>, top: usize) -> Option<Extraction> {
    ranked.into_iter().take(top).find_map(|candidate| {
        let price = extract_price(&candidate.text)?;
        trace!("Candidate {:?} scored {} -> {}", candidate.text, candidate.score, price);
        Some(Extraction::new(price, Locator::Css(page.css_path(candidate.el))))
    })
}

/// Currency symbols, price-like class names and numbers on short visible text.
#[derive(Default)]
pub struct SemanticStrategy;

impl SemanticStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl Strategy for SemanticStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::SemanticAnalysis
    }

    fn attempt(&self, page: &PageSnapshot, _domain: &Domain) -> Option<Extraction> {
        let ranked = rank(page, is_semantic_candidate, semantic_score);
        first_price(page, ranked, SEMANTIC_TOP)
    }
}

/// Favors large rendered fonts, where the headline price usually sits.
#[derive(Default)]
pub struct StructuralStrategy;

impl StructuralStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl Strategy for StructuralStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::StructuralAnalysis
    }

    fn attempt(&self, page: &PageSnapshot, _domain: &Domain) -> Option<Extraction> {
        let ranked = rank(page, is_structural_candidate, structural_score);
        first_price(page, ranked, STRUCTURAL_TOP)
    }
}
