//! Chromium render backend using chromiumoxide.

use crate::config::{Config, Environment};
use crate::error::EngineError;
use crate::render::stealth::{self, Fingerprint, ACCEPT_LANGUAGE, QUIESCENCE_SCRIPT, SCROLL_SCRIPT, STEALTH_SCRIPT};
use crate::render::{looks_blocked, RenderBackend, RenderedPage};
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::network::{Headers, SetExtraHttpHeadersParams};
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::error::CdpError;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

/// Longest wait for the network to settle after navigation.
const QUIESCENCE_TIMEOUT: Duration = Duration::from_secs(10);
const QUIESCENCE_POLL: Duration = Duration::from_millis(500);

/// Launch and navigation settings taken from [`Config`].
#[derive(Debug, Clone)]
pub struct RenderSettings {
    pub environment: Environment,
    pub chrome_path: Option<PathBuf>,
    pub proxy: Option<String>,
    pub navigation_timeout: Duration,
    pub human_delay: (u64, u64),
}

impl RenderSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            environment: config.environment,
            chrome_path: config.chrome_path.clone(),
            proxy: config.proxy.clone(),
            navigation_timeout: config.navigation_timeout(),
            human_delay: config.human_delay_range(),
        }
    }
}

/// A running browser and the task driving its CDP connection.
///
/// Dropping it stops the handler; chromiumoxide kills the child process when
/// the `Browser` goes.
struct Session {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl Drop for Session {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

/// Outcome of detaching the current session.
enum Detached<S> {
    Empty,
    /// No call was using it; the caller owns it now.
    Idle(S),
    /// Other calls still hold it and finish on it; the last one drops it.
    Shared,
}

/// The session new calls attach to.
///
/// Detaching only swaps the slot out, so one call's retry never tears down a
/// browser another call is still rendering on.
struct SessionSlot<S> {
    current: Mutex<Option<Arc<S>>>,
}

impl<S> SessionSlot<S> {
    fn new() -> Self {
        Self { current: Mutex::new(None) }
    }

    async fn get_or_launch<F, Fut>(&self, launch: F) -> Result<Arc<S>, EngineError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<S, EngineError>>,
    {
        let mut current = self.current.lock().await;
        if let Some(session) = current.as_ref() {
            return Ok(session.clone());
        }

        let session = Arc::new(launch().await?);
        *current = Some(session.clone());
        Ok(session)
    }

    async fn detach(&self) -> Detached<S> {
        let Some(session) = self.current.lock().await.take() else {
            return Detached::Empty;
        };

        match Arc::try_unwrap(session) {
            Ok(session) => Detached::Idle(session),
            Err(_) => Detached::Shared,
        }
    }

    async fn is_empty(&self) -> bool {
        self.current.lock().await.is_none()
    }
}

/// One lazily launched headless Chrome shared by all calls; pages are per call.
pub struct ChromiumBackend {
    settings: RenderSettings,
    slot: SessionSlot<Session>,
}

impl ChromiumBackend {
    pub fn new(settings: RenderSettings) -> Self {
        Self { settings, slot: SessionSlot::new() }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(RenderSettings::from_config(config))
    }

    async fn launch(&self) -> Result<Session, EngineError> {
        let mut builder = BrowserConfig::builder()
            .args(stealth::launch_args(self.settings.environment, self.settings.proxy.as_deref()));

        if let Some(path) = &self.settings.chrome_path {
            builder = builder.chrome_executable(path);
        }

        let config = builder.build().map_err(EngineError::BackendUnavailable)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| EngineError::BackendUnavailable(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    trace!("CDP handler: {}", e);
                }
            }
        });

        info!("Launched headless browser ({})", self.settings.environment);
        Ok(Session { browser, handler })
    }

    /// The shared session, launched on first use.
    async fn session(&self) -> Result<Arc<Session>, EngineError> {
        self.slot.get_or_launch(|| self.launch()).await
    }

    async fn drive(&self, page: &Page, url: &str) -> Result<RenderedPage, EngineError> {
        let timeout = self.settings.navigation_timeout;
        let cdp = |e: CdpError| classify(e, timeout);

        // Sampled up front; the RNG must not live across an await
        let fingerprint = Fingerprint::sample();
        let pause = stealth::human_pause(self.settings.human_delay);
        trace!("Fingerprint {:?}", fingerprint);

        page.set_user_agent(fingerprint.user_agent).await.map_err(cdp)?;
        page.execute(SetDeviceMetricsOverrideParams::new(fingerprint.width, fingerprint.height, 1.0, false))
            .await
            .map_err(cdp)?;
        page.execute(SetExtraHttpHeadersParams::new(Headers::new(serde_json::json!({
            "Accept-Language": ACCEPT_LANGUAGE,
        }))))
        .await
        .map_err(cdp)?;
        page.execute(AddScriptToEvaluateOnNewDocumentParams::new(STEALTH_SCRIPT)).await.map_err(cdp)?;

        debug!("Navigating to {}", url);
        let navigation = async {
            page.goto(url).await?;
            page.wait_for_navigation().await?;
            Ok::<_, CdpError>(())
        };
        match tokio::time::timeout(timeout, navigation).await {
            Err(_) => return Err(EngineError::RenderTimeout(timeout)),
            Ok(Err(e)) => return Err(cdp(e)),
            Ok(Ok(())) => {}
        }

        self.wait_for_quiet(page).await;
        tokio::time::sleep(pause).await;

        if let Err(e) = page.evaluate(SCROLL_SCRIPT).await {
            trace!("Scroll failed: {}", e);
        }

        page.evaluate(stealth::layout_script()).await.map_err(cdp)?;
        let html = page.content().await.map_err(cdp)?;
        let final_url = page.url().await.ok().flatten().unwrap_or_else(|| url.to_string());

        if looks_blocked(&html) {
            warn!("{} looks like a captcha or block page; extracting anyway", final_url);
        }

        Ok(RenderedPage { html, final_url })
    }

    /// Polls until the resource count stops growing, bounded by [`QUIESCENCE_TIMEOUT`].
    async fn wait_for_quiet(&self, page: &Page) {
        let deadline = Instant::now() + QUIESCENCE_TIMEOUT;
        let mut last: Option<i64> = None;

        while Instant::now() < deadline {
            let count = match page.evaluate(QUIESCENCE_SCRIPT).await {
                Ok(result) => result.into_value::<i64>().ok(),
                Err(e) => {
                    trace!("Quiescence check failed: {}", e);
                    None
                }
            };

            match count {
                Some(n) if n >= 0 && last == Some(n) => return,
                Some(n) if n >= 0 => last = Some(n),
                _ => {}
            }

            tokio::time::sleep(QUIESCENCE_POLL).await;
        }

        debug!("Network still busy after {:?}", QUIESCENCE_TIMEOUT);
    }
}

#[async_trait]
impl RenderBackend for ChromiumBackend {
    async fn acquire(&self) -> Result<(), EngineError> {
        self.session().await.map(|_| ())
    }

    async fn render(&self, url: &str) -> Result<RenderedPage, EngineError> {
        // Held until the page is closed, even if another call releases meanwhile
        let session = self.session().await?;
        let page = session
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| classify(e, self.settings.navigation_timeout))?;

        let outcome = self.drive(&page, url).await;

        if let Err(e) = page.close().await {
            debug!("Failed to close page: {}", e);
        }

        outcome
    }

    async fn release(&self) {
        match self.slot.detach().await {
            Detached::Empty => {}
            Detached::Idle(mut session) => {
                if let Err(e) = session.browser.close().await {
                    debug!("Browser close failed: {}", e);
                }
                if let Err(e) = session.browser.wait().await {
                    debug!("Browser wait failed: {}", e);
                }
                info!("Released headless browser");
            }
            Detached::Shared => {
                info!("Detached headless browser; it shuts down when its last page closes");
            }
        }
    }
}

/// Maps CDP failures onto the engine taxonomy.
fn classify(error: CdpError, timeout: Duration) -> EngineError {
    match error {
        CdpError::Timeout => EngineError::RenderTimeout(timeout),
        CdpError::Ws(_) | CdpError::Io(_) | CdpError::NoResponse | CdpError::ChannelSendError(_) => {
            EngineError::Transport(error.to_string())
        }
        other => EngineError::Render(other.to_string()),
    }
}
