//! Output formatting for scrape results (table, JSON, markdown, CSV).

use crate::config::OutputFormat;
use crate::extract::models::{DomainStats, ScrapingResult};
use serde::Serialize;

/// One scraped URL and its outcome.
#[derive(Debug, Clone, Serialize)]
pub struct ScrapeReport {
    pub url: String,
    #[serde(flatten)]
    pub result: ScrapingResult,
}

/// Formats results for output.
pub struct Formatter {
    format: OutputFormat,
}

impl Formatter {
    /// Creates a new formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a batch of scrape results.
    pub fn format_reports(&self, reports: &[ScrapeReport]) -> String {
        if reports.is_empty() {
            return match self.format {
                OutputFormat::Json => "[]".to_string(),
                OutputFormat::Csv => Self::csv_report_header().to_string(),
                _ => "No URLs scraped.".to_string(),
            };
        }

        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(reports).unwrap_or_else(|_| "[]".to_string()),
            OutputFormat::Table => self.table_reports(reports),
            OutputFormat::Markdown => self.markdown_reports(reports),
            OutputFormat::Csv => self.csv_reports(reports),
        }
    }

    /// Formats per-domain telemetry.
    pub fn format_stats(&self, stats: &[DomainStats]) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(stats).unwrap_or_else(|_| "[]".to_string()),
            OutputFormat::Table => self.table_stats(stats),
            OutputFormat::Markdown => self.markdown_stats(stats),
            OutputFormat::Csv => self.csv_stats(stats),
        }
    }

    /// Formats the normalizer's reading of a single string.
    pub fn format_parsed(&self, text: &str, price: Option<f64>) -> String {
        match self.format {
            OutputFormat::Json => serde_json::json!({ "text": text, "price": price }).to_string(),
            OutputFormat::Csv => format!("text,price\n{},{}", Self::csv_escape(text), csv_number(price)),
            OutputFormat::Table | OutputFormat::Markdown => match price {
                Some(price) => brl(price),
                None => "No price found.".to_string(),
            },
        }
    }

    // Table formatting

    fn table_reports(&self, reports: &[ScrapeReport]) -> String {
        let price_width = 14;
        let strategy_width = 20;
        let url_width = 60;

        let mut lines = Vec::new();

        // Header
        lines.push(format!("{:<price_width$}  {:<strategy_width$}  {}", "Price", "Strategy", "URL"));
        lines.push(format!("{:-<price_width$}  {:-<strategy_width$}  {:-<url_width$}", "", "", ""));

        // Rows
        for report in reports {
            let price_str = report.result.price.map(brl).unwrap_or_else(|| "N/A".to_string());
            let strategy_str = report.result.strategy.map(|s| s.as_str()).unwrap_or("-");

            lines.push(format!(
                "{:>price_width$}  {:<strategy_width$}  {}",
                price_str,
                strategy_str,
                truncate(&report.url, url_width)
            ));

            if let Some(error) = &report.result.error {
                lines.push(format!("{:>price_width$}  {}", "", error));
            }
        }

        let found = reports.iter().filter(|r| r.result.success).count();
        lines.push(String::new());
        lines.push(format!("Found: {}/{} prices", found, reports.len()));

        lines.join("\n")
    }

    fn table_stats(&self, stats: &[DomainStats]) -> String {
        let mut lines = Vec::new();

        lines.push(format!(
            "{:<30}  {:>8}  {:>9}  {:<20}  {:>14}",
            "Domain", "Attempts", "Successes", "Last strategy", "Last price"
        ));
        lines.push(format!("{:-<30}  {:-<8}  {:-<9}  {:-<20}  {:-<14}", "", "", "", "", ""));

        for entry in stats {
            lines.push(format!(
                "{:<30}  {:>8}  {:>9}  {:<20}  {:>14}",
                truncate(&entry.domain, 30),
                entry.attempts,
                entry.successes,
                entry.last_success.map(|s| s.as_str()).unwrap_or("-"),
                entry.last_price.map(brl).unwrap_or_else(|| "N/A".to_string())
            ));
        }

        lines.join("\n")
    }

    // Markdown formatting

    fn markdown_reports(&self, reports: &[ScrapeReport]) -> String {
        let mut lines = Vec::new();

        lines.push("| Price | Strategy | URL |".to_string());
        lines.push("|-------|----------|-----|".to_string());

        for report in reports {
            let price_str = match (&report.result.price, &report.result.error) {
                (Some(price), _) => brl(*price),
                (None, Some(error)) => format!("❌ {}", error.replace('|', "\\|")),
                (None, None) => "N/A".to_string(),
            };
            let strategy_str = report.result.strategy.map(|s| s.as_str()).unwrap_or("");

            lines.push(format!("| {} | {} | <{}> |", price_str, strategy_str, report.url));
        }

        let found = reports.iter().filter(|r| r.result.success).count();
        lines.push(String::new());
        lines.push(format!("*{} of {} prices found*", found, reports.len()));

        lines.join("\n")
    }

    fn markdown_stats(&self, stats: &[DomainStats]) -> String {
        let mut lines = Vec::new();

        lines.push("| Domain | Attempts | Success rate | Last strategy | Last price |".to_string());
        lines.push("|--------|----------|--------------|---------------|------------|".to_string());

        for entry in stats {
            lines.push(format!(
                "| {} | {} | {:.0}% | {} | {} |",
                entry.domain,
                entry.attempts,
                entry.success_rate() * 100.0,
                entry.last_success.map(|s| s.as_str()).unwrap_or(""),
                entry.last_price.map(brl).unwrap_or_default()
            ));
        }

        lines.join("\n")
    }

    // CSV formatting

    fn csv_report_header() -> &'static str {
        "url,success,price,strategy,locator,error"
    }

    fn csv_reports(&self, reports: &[ScrapeReport]) -> String {
        let mut lines = Vec::new();
        lines.push(Self::csv_report_header().to_string());

        for report in reports {
            let result = &report.result;
            lines.push(format!(
                "{},{},{},{},{},{}",
                Self::csv_escape(&report.url),
                result.success,
                csv_number(result.price),
                result.strategy.map(|s| s.as_str()).unwrap_or_default(),
                result.locator.as_deref().map(Self::csv_escape).unwrap_or_default(),
                result.error.as_deref().map(Self::csv_escape).unwrap_or_default()
            ));
        }

        lines.join("\n")
    }

    fn csv_stats(&self, stats: &[DomainStats]) -> String {
        let mut lines = Vec::new();
        lines.push("domain,attempts,successes,last_strategy,last_price".to_string());

        for entry in stats {
            lines.push(format!(
                "{},{},{},{},{}",
                entry.domain,
                entry.attempts,
                entry.successes,
                entry.last_success.map(|s| s.as_str()).unwrap_or_default(),
                csv_number(entry.last_price)
            ));
        }

        lines.join("\n")
    }

    fn csv_escape(s: &str) -> String {
        if s.contains(',') || s.contains('"') || s.contains('\n') {
            format!("\"{}\"", s.replace('"', "\"\""))
        } else {
            s.to_string()
        }
    }
}

fn csv_number(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.2}")).unwrap_or_default()
}

/// `R$ 1.299,99`
pub fn brl(price: f64) -> String {
    let fixed = format!("{:.2}", price.abs());
    let (integer, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::new();
    for (i, digit) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    let sign = if price < 0.0 { "-" } else { "" };
    format!("{sign}R$ {grouped},{cents}")
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() > width {
        let head: String = s.chars().take(width.saturating_sub(3)).collect();
        format!("{head}...")
    } else {
        s.to_string()
    }
}
