//! Chromium driver over the DevTools protocol.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::network::{
    CookieParam, CookieSameSite, EnableParams, EventResponseReceived, GetResponseBodyParams,
    RequestId, TimeSinceEpoch,
};
use chromiumoxide::handler::HandlerConfig;
use chromiumoxide::{Browser, Handler, Page};
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{BrowserConfig, CookieRecord, DriverError, LogEntry, PageDriver, ResponseBody};

/// A single Chromium page with network events forwarded into a log.
///
/// Dropping the driver aborts the background tasks; chromiumoxide kills a
/// launched child process when the `Browser` is dropped.
pub struct ChromeDriver {
    browser: Option<Browser>,
    page: Page,
    remote: bool,
    events: mpsc::UnboundedReceiver<LogEntry>,
    events_task: JoinHandle<()>,
    handler_task: JoinHandle<()>,
}

impl ChromeDriver {
    /// Common Chrome executable paths to check.
    const CHROME_PATHS: &'static [&'static str] = &[
        // Linux
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
        "/snap/bin/chromium",
        // macOS
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
        // Common install locations
        "/opt/google/chrome/google-chrome",
    ];

    /// Find Chrome executable.
    fn find_chrome() -> Result<PathBuf, DriverError> {
        for path in Self::CHROME_PATHS {
            let p = std::path::Path::new(path);
            if p.exists() {
                info!("Found Chrome at: {}", path);
                return Ok(p.to_path_buf());
            }
        }

        for cmd in &[
            "google-chrome",
            "google-chrome-stable",
            "chromium",
            "chromium-browser",
        ] {
            if let Ok(path) = which::which(cmd) {
                info!("Found Chrome in PATH: {}", path.display());
                return Ok(path);
            }
        }

        Err(DriverError::Launch(
            "Chrome/Chromium not found. Please install it:\n\
             - Arch/Manjaro: sudo pacman -S chromium\n\
             - Ubuntu/Debian: sudo apt install chromium-browser\n\
             - Fedora: sudo dnf install chromium\n\
             - Or download from: https://www.google.com/chrome/"
                .to_string(),
        ))
    }

    /// Launch (or connect to) a browser and open one page with network
    /// tracking enabled.
    pub async fn launch(config: &BrowserConfig) -> Result<Self, DriverError> {
        let remote = config.remote_url.is_some();
        let (browser, mut handler) = match config.remote_url.as_deref() {
            Some(url) => Self::connect_remote(config, url).await?,
            None => Self::launch_local(config).await?,
        };

        let handler_task = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler_task.abort();
                return Err(DriverError::protocol(e));
            }
        };

        let (events, events_task) = match Self::track_responses(&page).await {
            Ok(tracking) => tracking,
            Err(e) => {
                handler_task.abort();
                return Err(e);
            }
        };

        Ok(Self {
            browser: Some(browser),
            page,
            remote,
            events,
            events_task,
            handler_task,
        })
    }

    async fn launch_local(config: &BrowserConfig) -> Result<(Browser, Handler), DriverError> {
        info!("Launching browser (headless={})", config.headless);

        let chrome_path = Self::find_chrome()?;

        let mut builder = chromiumoxide::BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .request_timeout(Duration::from_secs(config.request_timeout));

        // with_head means NOT headless
        if !config.headless {
            builder = builder.with_head();
        }

        if let Some(ref proxy) = config.proxy {
            builder = builder.arg(format!("--proxy-server={}", proxy));
        }

        builder = builder
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check");

        for arg in &config.chrome_args {
            builder = builder.arg(arg);
        }

        let browser_config = builder.build().map_err(DriverError::Launch)?;

        Browser::launch(browser_config)
            .await
            .map_err(|e| DriverError::Launch(e.to_string()))
    }

    /// Connect to a remote Chrome instance.
    async fn connect_remote(
        config: &BrowserConfig,
        url: &str,
    ) -> Result<(Browser, Handler), DriverError> {
        info!(
            "Connecting to remote browser at {} (timeout: {}s)",
            url, config.request_timeout
        );

        // Get WebSocket URL from the /json/version endpoint
        let http_url = url
            .replace("ws://", "http://")
            .replace("wss://", "https://");
        let version_url = format!("{}/json/version", http_url.trim_end_matches('/'));

        let resp: serde_json::Value = reqwest::Client::new()
            .get(&version_url)
            .send()
            .await
            .map_err(|e| DriverError::Connect(e.to_string()))?
            .json()
            .await
            .map_err(|e| DriverError::Connect(format!("bad version info: {}", e)))?;

        let ws_url = resp
            .get("webSocketDebuggerUrl")
            .and_then(|v| v.as_str())
            .ok_or_else(|| DriverError::Connect("No webSocketDebuggerUrl in response".into()))?;

        info!("Connecting to WebSocket: {}", ws_url);

        let handler_config = HandlerConfig {
            request_timeout: Duration::from_secs(config.request_timeout),
            ..Default::default()
        };

        Browser::connect_with_config(ws_url, handler_config)
            .await
            .map_err(|e| DriverError::Connect(e.to_string()))
    }

    /// Subscribe to `Network.responseReceived` and forward each event as a
    /// serialized log entry.
    async fn track_responses(
        page: &Page,
    ) -> Result<(mpsc::UnboundedReceiver<LogEntry>, JoinHandle<()>), DriverError> {
        let mut stream = page
            .event_listener::<EventResponseReceived>()
            .await
            .map_err(DriverError::protocol)?;
        page.execute(EnableParams::default())
            .await
            .map_err(DriverError::protocol)?;

        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(async move {
            while let Some(event) = stream.next().await {
                let message = serde_json::json!({
                    "method": "Network.responseReceived",
                    "params": {
                        "requestId": event.request_id.inner(),
                        "response": {
                            "url": event.response.url.as_str(),
                            "status": event.response.status,
                            "mimeType": event.response.mime_type.as_str(),
                        },
                    },
                });
                if tx.send(LogEntry::new(message.to_string())).is_err() {
                    break;
                }
            }
        });

        Ok((rx, task))
    }

    fn cookie_param(cookie: &CookieRecord, url: &str) -> Result<CookieParam, String> {
        let mut builder = CookieParam::builder()
            .name(cookie.name.clone())
            .value(cookie.value.clone());

        builder = match cookie.domain {
            Some(ref domain) if !domain.is_empty() => builder.domain(domain.clone()),
            _ => builder.url(url),
        };
        if let Some(ref path) = cookie.path {
            builder = builder.path(path.clone());
        }
        if let Some(secure) = cookie.secure {
            builder = builder.secure(secure);
        }
        if let Some(http_only) = cookie.http_only {
            builder = builder.http_only(http_only);
        }
        if let Some(expiry) = cookie.expiry {
            builder = builder.expires(TimeSinceEpoch::new(expiry));
        }
        let same_site = match cookie.same_site.as_deref() {
            Some("Strict") | Some("strict") => Some(CookieSameSite::Strict),
            Some("Lax") | Some("lax") => Some(CookieSameSite::Lax),
            Some("None") | Some("none") | Some("no_restriction") => Some(CookieSameSite::None),
            _ => None,
        };
        if let Some(same_site) = same_site {
            builder = builder.same_site(same_site);
        }

        builder.build()
    }
}

#[async_trait]
impl PageDriver for ChromeDriver {
    async fn navigate(&mut self, url: &str) -> Result<(), DriverError> {
        info!("Navigating to {}", url);
        self.page.goto(url).await.map_err(DriverError::protocol)?;
        Ok(())
    }

    async fn set_cookies(
        &mut self,
        cookies: &[CookieRecord],
        url: &str,
    ) -> Result<(), DriverError> {
        let mut params = Vec::with_capacity(cookies.len());
        for cookie in cookies {
            match Self::cookie_param(cookie, url) {
                Ok(param) => params.push(param),
                Err(e) => warn!("Failed to build cookie {}: {}", cookie.name, e),
            }
        }

        debug!("Setting {} cookies", params.len());
        self.page
            .set_cookies(params)
            .await
            .map_err(DriverError::protocol)?;
        Ok(())
    }

    async fn scroll_height(&mut self) -> Result<u64, DriverError> {
        self.page
            .evaluate("document.body.scrollHeight")
            .await
            .map_err(DriverError::script)?
            .into_value::<u64>()
            .map_err(DriverError::script)
    }

    async fn scroll_to_bottom(&mut self) -> Result<(), DriverError> {
        self.page
            .evaluate("window.scrollTo(0, document.body.scrollHeight)")
            .await
            .map_err(DriverError::script)?;
        Ok(())
    }

    async fn exists(&mut self, selector: &str) -> Result<bool, DriverError> {
        let quoted = serde_json::to_string(selector).map_err(DriverError::script)?;
        self.page
            .evaluate(format!("document.querySelector({}) !== null", quoted))
            .await
            .map_err(DriverError::script)?
            .into_value::<bool>()
            .map_err(DriverError::script)
    }

    async fn drain_network_log(&mut self) -> Result<Vec<LogEntry>, DriverError> {
        let mut entries = Vec::new();
        while let Ok(entry) = self.events.try_recv() {
            entries.push(entry);
        }
        Ok(entries)
    }

    async fn response_body(&mut self, request_id: &str) -> Result<ResponseBody, DriverError> {
        let response = self
            .page
            .execute(GetResponseBodyParams::new(RequestId::new(request_id)))
            .await
            .map_err(DriverError::protocol)?;

        Ok(ResponseBody {
            body: response.result.body.clone(),
            base64_encoded: response.result.base64_encoded,
        })
    }

    async fn close(&mut self) {
        let Some(mut browser) = self.browser.take() else {
            return;
        };

        if self.remote {
            // Leave the shared browser running, only drop our tab.
            if let Err(e) = self.page.clone().close().await {
                warn!("Failed to close page: {}", e);
            }
        } else {
            if let Err(e) = browser.close().await {
                warn!("Failed to close browser: {}", e);
            }
            if let Err(e) = browser.wait().await {
                debug!("Browser process wait failed: {}", e);
            }
        }

        self.events_task.abort();
        self.handler_task.abort();
        info!("Browser released");
    }
}

impl Drop for ChromeDriver {
    fn drop(&mut self) {
        self.events_task.abort();
        self.handler_task.abort();
    }
}
