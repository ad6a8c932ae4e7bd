//! Error taxonomy for the extraction engine.
//!
//! None of these escape [`crate::engine::PriceEngine::scrape_price_auto`]; they are
//! folded into a failed [`crate::extract::models::ScrapingResult`] at the boundary.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Every strategy ran and none produced a plausible price.
    #[error("all strategies failed")]
    NotFound,

    /// Connection to the render backend was lost mid-call.
    #[error("render backend transport error: {0}")]
    Transport(String),

    #[error("navigation timed out after {0:?}")]
    RenderTimeout(Duration),

    /// The render backend could not be launched at all.
    #[error("render backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The browser answered but could not load or read the page.
    #[error("render failed: {0}")]
    Render(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("blocked by storefront (HTTP {status})")]
    Blocked { status: u16 },

    #[error("invalid URL \"{0}\"")]
    InvalidUrl(String),
}

impl EngineError {
    /// Transport losses and navigation timeouts are retried with a fresh browser.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::Transport(_) | EngineError::RenderTimeout(_))
    }
}
