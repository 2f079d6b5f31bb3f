//! Browser driver abstraction.
//!
//! The capture loop only talks to a [`PageDriver`]: one page, its scroll
//! height, a selector probe, the network event log, and response bodies.
//! [`ChromeDriver`] implements it over chromiumoxide (CDP).

#[cfg(feature = "browser")]
mod chrome;
mod config;
mod cookies;
mod error;
#[cfg(test)]
pub(crate) mod fake;

#[cfg(feature = "browser")]
pub use chrome::ChromeDriver;
pub use config::BrowserConfig;
pub use cookies::{load_cookies, CookieError, CookieRecord};
pub use error::DriverError;

use async_trait::async_trait;

/// One raw entry from the page's network event log.
///
/// `message` holds the serialized DevTools event (`{"method": ..., "params": ...}`),
/// the same shape a WebDriver performance log carries.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub message: String,
}

impl LogEntry {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Body of a network response fetched out-of-band.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseBody {
    pub body: String,
    pub base64_encoded: bool,
}

/// Capabilities the capture loop needs from a browser page.
#[async_trait]
pub trait PageDriver: Send {
    /// Navigate the page and wait for the load to finish.
    async fn navigate(&mut self, url: &str) -> Result<(), DriverError>;

    /// Install cookies; records without a domain are bound to `url`.
    async fn set_cookies(&mut self, cookies: &[CookieRecord], url: &str)
        -> Result<(), DriverError>;

    /// Current `document.body.scrollHeight`.
    async fn scroll_height(&mut self) -> Result<u64, DriverError>;

    /// Scroll the window to the bottom of the document.
    async fn scroll_to_bottom(&mut self) -> Result<(), DriverError>;

    /// Whether an element matching the CSS selector is present.
    async fn exists(&mut self, selector: &str) -> Result<bool, DriverError>;

    /// Take every network log entry accumulated since the last call.
    async fn drain_network_log(&mut self) -> Result<Vec<LogEntry>, DriverError>;

    /// Fetch the body of a response by its DevTools request id.
    async fn response_body(&mut self, request_id: &str) -> Result<ResponseBody, DriverError>;

    /// Release the browser. Must be safe to call more than once.
    async fn close(&mut self);
}
