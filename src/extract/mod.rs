//! Price extraction: normalization, storefront knowledge, the strategy cascade
//! and the state it learns from (selector cache, attempt log).

pub mod cache;
pub mod knowledge;
pub mod models;
pub mod normalizer;
pub mod orchestrator;
pub mod page;
pub mod scoring;
pub mod strategies;
pub mod telemetry;

pub use cache::{MemorySelectorCache, SelectorCache};
pub use models::{Domain, DomainStats, Locator, ScrapingResult, StrategyKind};
pub use normalizer::extract_price;
pub use orchestrator::Orchestrator;
pub use telemetry::{AttemptLog, MemoryAttemptLog};
