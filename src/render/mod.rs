//! Headless-browser rendering.
//!
//! [`RenderBackend`] abstracts over the browser engine so the entry point can
//! be tested with a scripted mock and run without Chrome installed.

pub mod chromium;
pub mod stealth;

pub use chromium::ChromiumBackend;

use crate::error::EngineError;
use async_trait::async_trait;

/// Markup fragments of captcha and bot-wall pages.
const BLOCK_TOKENS: &[&str] = &[
    "captcha",
    "cf-challenge",
    "challenge-platform",
    "are you a robot",
    "robot check",
    "unusual traffic",
    "access denied",
    "acesso negado",
    "não sou um robô",
];

/// HTML snapshot of a fully rendered page.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPage {
    pub html: String,
    /// URL after redirects.
    pub final_url: String,
}

/// A browser that turns URLs into rendered HTML.
#[async_trait]
pub trait RenderBackend: Send + Sync {
    /// Starts the browser if it is not running.
    async fn acquire(&self) -> Result<(), EngineError>;

    /// Loads a page and returns its rendered HTML.
    async fn render(&self, url: &str) -> Result<RenderedPage, EngineError>;

    /// Shuts the browser down. The next call relaunches it.
    async fn release(&self);
}

/// True when the markup looks like a captcha or block page.
pub fn looks_blocked(html: &str) -> bool {
    let lower = html.to_lowercase();
    BLOCK_TOKENS.iter().any(|token| lower.contains(token))
}
