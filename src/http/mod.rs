//! Plain HTTP access for the HTML-only fallback.

pub mod client;

pub use client::{HttpClient, PageFetcher};
