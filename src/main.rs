//! pricewatch - Adaptive price extraction for Brazilian storefronts
//!
//! Scrapes the current BRL price of arbitrary product pages.

use anyhow::Result;
use clap::{Parser, Subcommand};
use pricewatch::commands::ScrapeCommand;
use pricewatch::config::{Config, Environment, OutputFormat};
use pricewatch::extract::knowledge;
use pricewatch::extract_price;
use pricewatch::format::Formatter;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "pricewatch",
    version,
    about = "Adaptive price extraction for Brazilian storefronts",
    long_about = "Renders product pages in headless Chrome and runs a cascade of extraction strategies, \
                  falling back to a TLS-fingerprinted HTTP fetch when rendering fails."
)]
struct Cli {
    /// Runtime environment (local, constrained)
    #[arg(short, long, global = true, env = "PRICEWATCH_ENV")]
    env: Option<Environment>,

    /// Proxy URL (e.g., socks5://host:port)
    #[arg(long, global = true, env = "PRICEWATCH_PROXY")]
    proxy: Option<String>,

    /// Chrome/Chromium executable
    #[arg(long, global = true, env = "PRICEWATCH_CHROME")]
    chrome: Option<PathBuf>,

    /// Navigation timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Skip the headless browser and fetch plain HTML only
    #[arg(long, global = true)]
    no_render: bool,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true)]
    format: Option<OutputFormat>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape the current price of product pages
    #[command(alias = "s")]
    Scrape {
        /// Product page URL(s)
        #[arg(required = true)]
        urls: Vec<String>,

        /// Print per-domain strategy statistics after the results
        #[arg(long)]
        stats: bool,
    },

    /// Normalize a price string without fetching anything
    #[command(alias = "p")]
    Parse {
        /// Text such as "R$ 1.299,99"
        text: String,
    },

    /// List storefronts with dedicated selectors
    Stores,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    // Load config with layered overrides
    let mut config = Config::load(cli.config.as_deref())?.with_env();

    // Apply CLI overrides
    if let Some(environment) = cli.env {
        config.environment = environment;
    }
    if let Some(format) = cli.format {
        config.format = format;
    }
    if let Some(proxy) = cli.proxy {
        config.proxy = Some(proxy);
    }
    if let Some(chrome) = cli.chrome {
        config.chrome_path = Some(chrome);
    }
    if let Some(timeout) = cli.timeout {
        config.navigation_timeout_secs = Some(timeout);
    }
    if cli.no_render {
        config.render = false;
    }

    match cli.command {
        Commands::Scrape { urls, stats } => {
            let cmd = ScrapeCommand::new(config);
            let output = cmd.execute(&urls, stats).await?;
            println!("{}", output);
        }

        Commands::Parse { text } => {
            let formatter = Formatter::new(config.format);
            println!("{}", formatter.format_parsed(&text, extract_price(&text)));
        }

        Commands::Stores => {
            println!("Storefronts with dedicated selectors:\n");
            println!("{:<28} {:<10}", "Domain", "Selectors");
            println!("{:-<28} {:-<10}", "", "");

            for (host, count) in knowledge::storefronts() {
                println!("{:<28} {:<10}", host, count);
            }
        }
    }

    Ok(())
}
