//! Price text normalization for Brazilian Real formatting.
//!
//! Every strategy hands candidate text to [`extract_price`]; it owns all
//! numeric parsing so that locating and parsing are tested separately.
//!
//! Rules are tried in order and the first one that matches decides. Rules 1-6
//! are strict: a match whose value fails its bound yields `None`. Rules 7 and 8
//! depend on surrounding words and fall through when the context rejects them.

use regex_lite::{Captures, Regex};
use std::sync::LazyLock;

/// Exclusive upper bound for any accepted price.
pub const MAX_PRICE: f64 = 1_000_000.0;

/// Exclusive upper bound for a bare `123.45` decimal.
pub const MAX_BARE_DECIMAL: f64 = 100_000.0;

/// Words that make a bare integer believable as a price.
const POSITIVE_WORDS: &[&str] = &["preço", "preco", "valor", "total", "price", "reais", "brl"];

const POSITIVE_PHRASES: &[&str] = &["r$", "à vista", "a vista"];

/// Words that mark a number as a phone, postal code, year, version or ID.
const NEGATIVE_WORDS: &[&str] = &[
    "copyright",
    "cep",
    "telefone",
    "tel",
    "fone",
    "whatsapp",
    "versão",
    "versao",
    "version",
    "cnpj",
    "cpf",
    "sku",
    "código",
    "codigo",
];

mod patterns {
    use super::*;

    /// `R$ 1.234,56`
    pub static BRL_FULL: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"[Rr]\$\s*(\d{1,3}(?:\.\d{3})+),(\d{2})").unwrap());

    /// `R$ 1.234`, `R$ 99`
    pub static BRL_INTEGER: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"[Rr]\$\s*(\d+(?:\.\d{3})*)").unwrap());

    /// `R$ 123,45`
    pub static BRL_SIMPLE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"[Rr]\$\s*(\d+),(\d{2})").unwrap());

    /// `1.234,56`, `123,45`
    pub static BRL_BARE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(\d{1,3}(?:\.\d{3})+|\d{1,6}),(\d{2})").unwrap());

    /// `$ 1,234.56`
    pub static INTERNATIONAL: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\$\s*(\d{1,3}(?:,\d{3})+|\d+)\.(\d{2})").unwrap());

    /// `123.45`
    pub static BARE_DECIMAL: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(\d+)\.(\d{2})").unwrap());

    /// `1999`
    pub static BARE_INTEGER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{3,6}").unwrap());

    pub static DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());
}

/// Extracts a plausible price from arbitrary text.
///
/// Returned values are always `> 0` and `< 1_000_000`.
pub fn extract_price(text: &str) -> Option<f64> {
    let text = clean(text);
    if text.is_empty() {
        return None;
    }

    let price = parse(&text)?;
    within_bounds(price).then_some(price)
}

fn parse(text: &str) -> Option<f64> {
    // 1. R$ 1.234,56
    if let Some(caps) = first_match(&patterns::BRL_FULL, text, ends_cleanly) {
        return decimal(&caps[1].replace('.', ""), &caps[2]);
    }

    // 2. R$ 1.234
    if let Some(caps) = first_match(&patterns::BRL_INTEGER, text, ends_cleanly) {
        return caps[1].replace('.', "").parse().ok();
    }

    // 3. R$ 123,45
    if let Some(caps) = first_match(&patterns::BRL_SIMPLE, text, ends_cleanly) {
        return decimal(&caps[1], &caps[2]);
    }

    // 4. 1.234,56
    if let Some(caps) = first_match(&patterns::BRL_BARE, text, standalone) {
        return decimal(&caps[1].replace('.', ""), &caps[2]);
    }

    // 5. $ 1,234.56
    if let Some(caps) = first_match(&patterns::INTERNATIONAL, text, ends_cleanly) {
        return decimal(&caps[1].replace(',', ""), &caps[2]);
    }

    // 6. 123.45
    if let Some(caps) = first_match(&patterns::BARE_DECIMAL, text, standalone) {
        let value = decimal(&caps[1], &caps[2])?;
        return (value > 0.0 && value < MAX_BARE_DECIMAL).then_some(value);
    }

    let lower = text.to_lowercase();
    let negative = has_negative_context(&lower);

    // 7. 1999 next to a price word
    if !negative && has_positive_context(&lower) {
        if let Some(caps) = first_match(&patterns::BARE_INTEGER, text, standalone) {
            if let Ok(value) = caps[0].parse::<u32>() {
                return Some(reinterpret_integer(value));
            }
        }
    }

    // 8. any digit run
    if negative {
        return None;
    }
    patterns::DIGITS
        .find_iter(text)
        .filter_map(|m| m.as_str().parse::<u64>().ok())
        .find(|value| (1..=99_999).contains(value))
        .map(|value| value as f64)
}

/// Bare integers read as cents when that lands in `[1, 9999]`, else as-is.
fn reinterpret_integer(value: u32) -> f64 {
    let cents = f64::from(value) / 100.0;
    if (1.0..=9999.0).contains(&cents) {
        cents
    } else {
        f64::from(value)
    }
}

/// True when a price word such as `preço` or `R$` appears in the text.
pub fn has_positive_context(lower: &str) -> bool {
    POSITIVE_PHRASES.iter().any(|phrase| lower.contains(phrase))
        || words(lower).any(|word| POSITIVE_WORDS.contains(&word))
}

/// True when the text reads like a phone number, postal code, legal line or ID.
pub fn has_negative_context(lower: &str) -> bool {
    lower.contains('©') || words(lower).any(|word| NEGATIVE_WORDS.contains(&word))
}

fn words(lower: &str) -> impl Iterator<Item = &str> {
    lower.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty())
}

fn within_bounds(price: f64) -> bool {
    price.is_finite() && price > 0.0 && price < MAX_PRICE
}

fn decimal(integer: &str, cents: &str) -> Option<f64> {
    format!("{integer}.{cents}").parse().ok()
}

/// Collapses whitespace variants (NBSP, narrow NBSP, thin space) into single spaces.
pub fn clean(text: &str) -> String {
    text.split(|c: char| c.is_whitespace() || matches!(c, '\u{a0}' | '\u{202f}' | '\u{2009}'))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn first_match<'t>(
    regex: &Regex,
    text: &'t str,
    accept: fn(&str, usize, usize) -> bool,
) -> Option<Captures<'t>> {
    regex
        .captures_iter(text)
        .find(|caps| caps.get(0).is_some_and(|whole| accept(text, whole.start(), whole.end())))
}

/// The number must not continue past the match (`1.234` inside `1.2345`).
fn ends_cleanly(text: &str, _start: usize, end: usize) -> bool {
    let mut rest = text[end..].chars();
    match rest.next() {
        None => true,
        Some(c) if c.is_ascii_digit() => false,
        Some('.' | ',') => !rest.next().is_some_and(|c| c.is_ascii_digit()),
        Some(_) => true,
    }
}

/// The match is not a fragment of a longer number, ID or date.
fn standalone(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    if before.is_some_and(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '/' | '-')) {
        return false;
    }
    if text[end..].starts_with('/') {
        return false;
    }
    ends_cleanly(text, start, end)
}
