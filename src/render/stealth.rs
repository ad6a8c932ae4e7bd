//! Browser fingerprint randomization, launch flags and injected scripts.

use crate::config::Environment;
use crate::extract::page::{BOX_ATTR, FONT_ATTR};
use rand::seq::IndexedRandom;
use rand::Rng;
use std::time::Duration;

pub const ACCEPT_LANGUAGE: &str = "pt-BR,pt;q=0.9,en-US;q=0.8,en;q=0.7";

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/130.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36 Edg/131.0.0.0",
];

const VIEWPORTS: &[(i64, i64)] = &[(1920, 1080), (1366, 768), (1536, 864), (1440, 900), (1280, 720)];

/// Flags for every launch.
const COMMON_ARGS: &[&str] = &[
    "--disable-blink-features=AutomationControlled",
    "--no-first-run",
    "--no-default-browser-check",
    "--disable-default-apps",
    "--disable-popup-blocking",
    "--disable-extensions",
    "--disable-sync",
    "--disable-translate",
    "--mute-audio",
    "--lang=pt-BR",
];

/// Extra flags for containers and serverless hosts.
const CONSTRAINED_ARGS: &[&str] =
    &["--no-sandbox", "--disable-dev-shm-usage", "--disable-gpu", "--single-process", "--no-zygote"];

/// Hides the usual headless tells before any page script runs.
pub const STEALTH_SCRIPT: &str = r#"
    Object.defineProperty(navigator, 'webdriver', { get: () => undefined, configurable: true });
    delete navigator.__proto__.webdriver;

    Object.defineProperty(navigator, 'plugins', {
        get: () => {
            const plugins = [
                { name: 'Chrome PDF Plugin', filename: 'internal-pdf-viewer' },
                { name: 'Chrome PDF Viewer', filename: 'mhjfbmdgcfjbbpaeojofohoefgiehjai' },
                { name: 'Native Client', filename: 'internal-nacl-plugin' }
            ];
            plugins.length = 3;
            return plugins;
        }
    });

    Object.defineProperty(navigator, 'languages', { get: () => ['pt-BR', 'pt', 'en-US', 'en'] });

    window.chrome = window.chrome || { runtime: {}, loadTimes: () => ({}), csi: () => ({}) };

    const originalQuery = window.navigator.permissions && window.navigator.permissions.query;
    if (originalQuery) {
        window.navigator.permissions.query = (parameters) => (
            parameters.name === 'notifications'
                ? Promise.resolve({ state: Notification.permission })
                : originalQuery(parameters)
        );
    }

    Object.defineProperty(navigator, 'hardwareConcurrency', { get: () => 8 });
    Object.defineProperty(navigator, 'deviceMemory', { get: () => 8 });
"#;

/// `-1` until the document is complete, then the number of loaded resources.
pub const QUIESCENCE_SCRIPT: &str = r#"
    document.readyState === 'complete'
        ? performance.getEntriesByType('resource').length
        : -1
"#;

pub const SCROLL_SCRIPT: &str = "window.scrollBy(0, Math.floor(200 + Math.random() * 400)); true";

/// Stamps every body element with its rendered box and font size.
pub fn layout_script() -> String {
    format!(
        r#"(() => {{
            const all = document.querySelectorAll('body *');
            for (const el of all) {{
                const style = window.getComputedStyle(el);
                const rect = el.getBoundingClientRect();
                const hidden = style.display === 'none'
                    || style.visibility === 'hidden'
                    || parseFloat(style.opacity) === 0;
                const w = hidden ? 0 : Math.round(rect.width);
                const h = hidden ? 0 : Math.round(rect.height);
                el.setAttribute('{BOX_ATTR}', w + 'x' + h);
                el.setAttribute('{FONT_ATTR}', String(parseFloat(style.fontSize) || 0));
            }}
            return all.length;
        }})()"#
    )
}

/// Per-call browser identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fingerprint {
    pub user_agent: &'static str,
    pub width: i64,
    pub height: i64,
}

impl Fingerprint {
    pub fn sample() -> Self {
        let mut rng = rand::rng();
        let user_agent = USER_AGENTS.choose(&mut rng).copied().unwrap_or(USER_AGENTS[0]);
        let (width, height) = VIEWPORTS.choose(&mut rng).copied().unwrap_or(VIEWPORTS[0]);
        Self { user_agent, width, height }
    }
}

/// Random pause within `(min_ms, max_ms)`.
pub fn human_pause((min_ms, max_ms): (u64, u64)) -> Duration {
    if max_ms <= min_ms {
        return Duration::from_millis(min_ms);
    }
    Duration::from_millis(rand::rng().random_range(min_ms..=max_ms))
}

pub fn launch_args(environment: Environment, proxy: Option<&str>) -> Vec<String> {
    let mut args: Vec<String> = COMMON_ARGS.iter().map(|arg| arg.to_string()).collect();

    if environment == Environment::Constrained {
        args.extend(CONSTRAINED_ARGS.iter().map(|arg| arg.to_string()));
    }

    if let Some(proxy) = proxy {
        args.push(format!("--proxy-server={proxy}"));
    }

    args
}
