//! §4.I Browser Collaborator: a concrete `chromiumoxide`-driven headless
//! Chrome instance satisfying the §6 browser contract.
//!
//! One `Browser` process is shared across a run (cheap to keep alive,
//! expensive to start); each worker gets its own `Page` so that per-page
//! state (request interception, navigation) never crosses workers. This is
//! the "single shared browser with one page per worker" option SPEC_FULL.md
//! §4.I calls out — pooling multiple browser processes is an orthogonal
//! efficiency knob this crawler doesn't need at its target concurrency.

use std::time::Duration;

use anyhow::{Context, Result};
use chromiumoxide::browser::{Browser, BrowserConfigBuilder, HeadlessMode};
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::Page;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::page_extractor::install_request_interception;

/// Viewport and locale applied to every page this browser opens.
#[derive(Debug, Clone)]
pub struct BrowserSettings {
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub locale: String,
    /// Record a HAR-equivalent trace via CDP network events; off by default
    /// since nothing in this crawl core consumes it yet.
    pub record_network: bool,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1920,
            viewport_height: 1080,
            locale: "en-US".to_string(),
            record_network: false,
        }
    }
}

/// Owns the one `Browser` process for a run and the task driving its CDP
/// connection. Dropping this without calling [`BrowserCollaborator::close`]
/// leaves the handler task running; callers should always close explicitly.
pub struct BrowserCollaborator {
    browser: Browser,
    handler: JoinHandle<()>,
    settings: BrowserSettings,
}

impl BrowserCollaborator {
    /// Launch a single headless Chrome instance per `settings`. HTTPS
    /// errors are never ignored, per §6.
    pub async fn launch(settings: BrowserSettings) -> Result<Self> {
        let mut config_builder = BrowserConfigBuilder::default()
            .request_timeout(Duration::from_secs(30))
            .window_size(settings.viewport_width, settings.viewport_height)
            .arg(format!("--lang={}", settings.locale));

        config_builder = if settings.headless {
            config_builder.headless_mode(HeadlessMode::default())
        } else {
            config_builder.with_head()
        };

        let config = config_builder
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build browser config: {e}"))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("failed to launch headless browser")?;

        let handler = tokio::spawn(async move {
            use futures_util::StreamExt;
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    warn!(error = %e, "browser CDP handler error");
                }
            }
            debug!("browser CDP handler exited");
        });

        Ok(Self { browser, handler, settings })
    }

    /// Open a fresh page for one worker's extraction: sets the configured
    /// viewport and installs subresource request interception (abort
    /// image/media/font, continue everything else) before returning.
    pub async fn new_page(&self) -> Result<Page> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .context("failed to open new page")?;
        let viewport = SetDeviceMetricsOverrideParams::builder()
            .width(self.settings.viewport_width as i64)
            .height(self.settings.viewport_height as i64)
            .device_scale_factor(1.0)
            .mobile(false)
            .build()
            .map_err(anyhow::Error::msg)
            .context("failed to build viewport override params")?;
        page.execute(viewport)
            .await
            .context("failed to set page viewport")?;
        install_request_interception(&page)
            .await
            .context("failed to install request interception")?;
        Ok(page)
    }

    /// Close the browser process and stop the CDP handler task.
    pub async fn close(mut self) -> Result<()> {
        if let Err(e) = self.browser.close().await {
            warn!(error = %e, "error closing browser, proceeding with handler shutdown");
        }
        let _ = self.browser.wait().await;
        self.handler.abort();
        Ok(())
    }
}
