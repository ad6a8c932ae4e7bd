//! pricewatch - Adaptive price extraction for Brazilian storefronts
//!
//! Renders a product page in headless Chrome, runs a cascade of extraction
//! strategies over it and remembers which selector worked for each domain.
//! When rendering fails the page is fetched over plain HTTP with TLS
//! fingerprint emulation and a reduced cascade runs instead.

pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod extract;
pub mod format;
pub mod http;
pub mod render;

pub use config::Config;
pub use engine::{scrape_price_auto, PriceEngine};
pub use error::EngineError;
pub use extract::{extract_price, Domain, DomainStats, ScrapingResult, StrategyKind};
