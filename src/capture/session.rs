//! Mutable state of one capture run.

use std::collections::{HashMap, HashSet};

use super::extract::ResponseEvent;

/// Attempts at fetching a response body before the response is given up on.
pub const MAX_BODY_ATTEMPTS: u32 = 3;

/// State owned by the scroll loop for the lifetime of one capture.
///
/// Nothing here is persisted; a restarted capture starts from scratch.
#[derive(Debug, Default)]
pub struct CaptureSession {
    /// Last observed `document.body.scrollHeight`.
    pub last_height: u64,
    /// Productive scrolls so far.
    pub scroll_count: u32,
    seen: HashSet<String>,
    /// Matching responses whose body could not be fetched yet.
    deferred: Vec<ResponseEvent>,
    attempts: HashMap<String, u32>,
    saved: usize,
}

impl CaptureSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_seen(&self, request_id: &str) -> bool {
        self.seen.contains(request_id)
    }

    /// Mark a response id as inspected. Returns false if it already was.
    pub fn mark_seen(&mut self, request_id: &str) -> bool {
        self.attempts.remove(request_id);
        self.seen.insert(request_id.to_string())
    }

    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    pub fn saved_count(&self) -> usize {
        self.saved
    }

    pub(crate) fn record_saved(&mut self) {
        self.saved += 1;
    }

    /// Record a failed body fetch; returns the attempts made so far.
    pub(crate) fn record_attempt(&mut self, request_id: &str) -> u32 {
        let attempts = self.attempts.entry(request_id.to_string()).or_insert(0);
        *attempts += 1;
        *attempts
    }

    pub(crate) fn defer(&mut self, event: ResponseEvent) {
        if !self.deferred.iter().any(|e| e.request_id == event.request_id) {
            self.deferred.push(event);
        }
    }

    pub(crate) fn take_deferred(&mut self) -> Vec<ResponseEvent> {
        std::mem::take(&mut self.deferred)
    }

    pub fn deferred_count(&self) -> usize {
        self.deferred.len()
    }
}
