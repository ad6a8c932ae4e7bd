//! Configuration management with TOML, environment variables, and CLI overrides.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Where the engine runs; picks browser flags and default timeouts
    #[serde(default)]
    pub environment: Environment,

    /// Use the headless browser before falling back to plain HTTP
    #[serde(default = "default_render")]
    pub render: bool,

    /// Proxy URL (e.g., socks5://host:port)
    #[serde(default)]
    pub proxy: Option<String>,

    /// Chrome/Chromium executable; auto-detected when unset
    #[serde(default)]
    pub chrome_path: Option<PathBuf>,

    /// Page navigation timeout; defaults to 30s local, 60s constrained
    #[serde(default)]
    pub navigation_timeout_secs: Option<u64>,

    /// Timeout for the HTML-only fetch
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    /// Extra render attempts after a transport failure or timeout
    #[serde(default = "default_max_render_retries")]
    pub max_render_retries: u32,

    /// Base backoff between render attempts, doubled each retry
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Lower bound of the pause after page load
    #[serde(default = "default_human_delay_min_ms")]
    pub human_delay_min_ms: u64,

    /// Upper bound of the pause after page load
    #[serde(default = "default_human_delay_max_ms")]
    pub human_delay_max_ms: u64,

    /// How long a winning selector stays cached
    #[serde(default = "default_cache_ttl_hours")]
    pub cache_ttl_hours: u64,

    /// Maximum number of cached domains
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// Attempts kept per domain for diagnostics
    #[serde(default = "default_attempt_history")]
    pub attempt_history: usize,

    /// Output format
    #[serde(default)]
    pub format: OutputFormat,
}

fn default_render() -> bool {
    true
}

fn default_http_timeout_secs() -> u64 {
    30
}

fn default_max_render_retries() -> u32 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    1000
}

fn default_human_delay_min_ms() -> u64 {
    2000
}

fn default_human_delay_max_ms() -> u64 {
    5000
}

fn default_cache_ttl_hours() -> u64 {
    24
}

fn default_cache_capacity() -> usize {
    1000
}

fn default_attempt_history() -> usize {
    50
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: Environment::Local,
            render: default_render(),
            proxy: None,
            chrome_path: None,
            navigation_timeout_secs: None,
            http_timeout_secs: default_http_timeout_secs(),
            max_render_retries: default_max_render_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            human_delay_min_ms: default_human_delay_min_ms(),
            human_delay_max_ms: default_human_delay_max_ms(),
            cache_ttl_hours: default_cache_ttl_hours(),
            cache_capacity: default_cache_capacity(),
            attempt_history: default_attempt_history(),
            format: OutputFormat::Table,
        }
    }
}

impl Config {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading config from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Loads configuration with fallback to default locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        // 1. Explicit path takes precedence
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        // 2. Try current directory
        let local_config = Path::new("config.toml");
        if local_config.exists() {
            debug!("Found config.toml in current directory");
            return Self::from_file(local_config);
        }

        // 3. Try XDG config directory
        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("pricewatch").join("config.toml");
            if xdg_config.exists() {
                debug!("Found config in XDG config directory");
                return Self::from_file(xdg_config);
            }
        }

        // 4. Return default config
        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Applies environment variable overrides.
    pub fn with_env(mut self) -> Self {
        if let Ok(environment) = std::env::var("PRICEWATCH_ENV") {
            if let Ok(e) = environment.parse() {
                self.environment = e;
            }
        }

        if let Ok(proxy) = std::env::var("PRICEWATCH_PROXY") {
            self.proxy = Some(proxy);
        }

        if let Ok(chrome) = std::env::var("PRICEWATCH_CHROME") {
            self.chrome_path = Some(PathBuf::from(chrome));
        }

        if let Ok(render) = std::env::var("PRICEWATCH_RENDER") {
            match render.to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.render = true,
                "0" | "false" | "no" | "off" => self.render = false,
                _ => {}
            }
        }

        self
    }

    /// Navigation timeout, falling back to the environment's default.
    pub fn navigation_timeout(&self) -> Duration {
        self.navigation_timeout_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| self.environment.default_navigation_timeout())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Backoff before render retry `attempt` (1-based).
    pub fn retry_backoff(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
        Duration::from_millis(self.retry_backoff_ms.saturating_mul(factor))
    }

    /// Pause bounds after page load, ordered even if configured backwards.
    pub fn human_delay_range(&self) -> (u64, u64) {
        let (a, b) = (self.human_delay_min_ms, self.human_delay_max_ms);
        (a.min(b), a.max(b))
    }
}

/// Where the engine runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// A developer machine with a full desktop Chrome.
    #[default]
    Local,
    /// Containers and serverless hosts: no sandbox, small /dev/shm, no GPU.
    Constrained,
}

impl Environment {
    pub fn default_navigation_timeout(&self) -> Duration {
        match self {
            Environment::Local => Duration::from_secs(30),
            Environment::Constrained => Duration::from_secs(60),
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" | "dev" => Ok(Environment::Local),
            "constrained" | "container" | "serverless" => Ok(Environment::Constrained),
            _ => Err(format!("Unknown environment: {}. Use: local, constrained", s)),
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Local => write!(f, "local"),
            Environment::Constrained => write!(f, "constrained"),
        }
    }
}

/// Output format for results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Markdown,
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown format: {}. Use: table, json, markdown, csv", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}
