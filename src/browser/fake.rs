//! Scripted in-memory page for exercising the capture loop without a browser.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{CookieRecord, DriverError, LogEntry, PageDriver, ResponseBody};

/// What the fake page observed, shared so tests can inspect it after the
/// driver has been moved into the code under test.
#[derive(Debug, Default)]
pub(crate) struct Journal {
    pub navigations: Vec<String>,
    pub cookies_set: usize,
    pub scrolls: usize,
    pub height_polls: usize,
    pub body_requests: Vec<String>,
    pub closed: u32,
}

#[derive(Default)]
pub(crate) struct FakePage {
    /// Page height after N scrolls; the last value repeats.
    heights: Vec<u64>,
    /// Height reported once this many height polls have returned.
    late_growth: Option<(usize, u64)>,
    /// The target selector matches once this many scrolls happened.
    target_after: Option<usize>,
    /// One batch of log entries per drain.
    logs: VecDeque<Vec<LogEntry>>,
    bodies: HashMap<String, ResponseBody>,
    /// Remaining failures before a body becomes fetchable.
    body_failures: HashMap<String, u32>,
    /// Fail `scroll_to_bottom` on this scroll number.
    fail_on_scroll: Option<usize>,
    pub journal: Arc<Mutex<Journal>>,
}

impl FakePage {
    pub fn new() -> Self {
        Self {
            heights: vec![1000],
            ..Default::default()
        }
    }

    pub fn with_heights(mut self, heights: &[u64]) -> Self {
        self.heights = heights.to_vec();
        self
    }

    /// Keep the scripted height for `polls` reads, then report `height`.
    pub fn with_growth_after_polls(mut self, polls: usize, height: u64) -> Self {
        self.late_growth = Some((polls, height));
        self
    }

    pub fn with_target_after(mut self, scrolls: usize) -> Self {
        self.target_after = Some(scrolls);
        self
    }

    pub fn with_log_batch(mut self, entries: Vec<LogEntry>) -> Self {
        self.logs.push_back(entries);
        self
    }

    pub fn with_body(mut self, request_id: &str, body: &str) -> Self {
        self.bodies.insert(
            request_id.to_string(),
            ResponseBody {
                body: body.to_string(),
                base64_encoded: false,
            },
        );
        self
    }

    pub fn with_encoded_body(mut self, request_id: &str, body: &str) -> Self {
        self.bodies.insert(
            request_id.to_string(),
            ResponseBody {
                body: body.to_string(),
                base64_encoded: true,
            },
        );
        self
    }

    pub fn with_body_failures(mut self, request_id: &str, failures: u32) -> Self {
        self.body_failures.insert(request_id.to_string(), failures);
        self
    }

    pub fn failing_on_scroll(mut self, scroll: usize) -> Self {
        self.fail_on_scroll = Some(scroll);
        self
    }

    pub fn journal(&self) -> Arc<Mutex<Journal>> {
        Arc::clone(&self.journal)
    }

    fn scrolls(&self) -> usize {
        self.journal.lock().unwrap().scrolls
    }
}

/// A serialized `Network.responseReceived` event.
pub(crate) fn response_event(request_id: &str, url: &str) -> LogEntry {
    LogEntry::new(
        serde_json::json!({
            "method": "Network.responseReceived",
            "params": {
                "requestId": request_id,
                "response": { "url": url, "status": 200, "mimeType": "application/json" },
            },
        })
        .to_string(),
    )
}

#[async_trait]
impl PageDriver for FakePage {
    async fn navigate(&mut self, url: &str) -> Result<(), DriverError> {
        self.journal.lock().unwrap().navigations.push(url.to_string());
        Ok(())
    }

    async fn set_cookies(
        &mut self,
        cookies: &[CookieRecord],
        _url: &str,
    ) -> Result<(), DriverError> {
        self.journal.lock().unwrap().cookies_set += cookies.len();
        Ok(())
    }

    async fn scroll_height(&mut self) -> Result<u64, DriverError> {
        let polls = {
            let mut journal = self.journal.lock().unwrap();
            journal.height_polls += 1;
            journal.height_polls
        };
        if let Some((after, height)) = self.late_growth {
            if polls > after {
                return Ok(height);
            }
        }

        let scrolls = self.scrolls();
        let idx = scrolls.min(self.heights.len().saturating_sub(1));
        Ok(self.heights.get(idx).copied().unwrap_or(0))
    }

    async fn scroll_to_bottom(&mut self) -> Result<(), DriverError> {
        let mut journal = self.journal.lock().unwrap();
        journal.scrolls += 1;
        if self.fail_on_scroll == Some(journal.scrolls) {
            return Err(DriverError::Script("page crashed".into()));
        }
        Ok(())
    }

    async fn exists(&mut self, _selector: &str) -> Result<bool, DriverError> {
        Ok(self.target_after.is_some_and(|n| self.scrolls() >= n))
    }

    async fn drain_network_log(&mut self) -> Result<Vec<LogEntry>, DriverError> {
        Ok(self.logs.pop_front().unwrap_or_default())
    }

    async fn response_body(&mut self, request_id: &str) -> Result<ResponseBody, DriverError> {
        self.journal
            .lock()
            .unwrap()
            .body_requests
            .push(request_id.to_string());

        if let Some(remaining) = self.body_failures.get_mut(request_id) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(DriverError::Protocol("No resource with given identifier".into()));
            }
        }

        self.bodies
            .get(request_id)
            .cloned()
            .ok_or_else(|| DriverError::Protocol("No data found for resource".into()))
    }

    async fn close(&mut self) {
        self.journal.lock().unwrap().closed += 1;
    }
}
