//! Stopping conditions for the scroll loop.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::browser::{DriverError, PageDriver};

/// Default interval between page-height polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Why the evaluator returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Timeout,
    MaxScrollsReached,
    TargetFound,
    NewContentLoaded,
    None,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StopReason::Timeout => "timeout",
            StopReason::MaxScrollsReached => "max_scrolls_reached",
            StopReason::TargetFound => "target_found",
            StopReason::NewContentLoaded => "new_content_loaded",
            StopReason::None => "none",
        };
        f.write_str(s)
    }
}

/// Outcome of one evaluation.
///
/// `halt == false` with [`StopReason::NewContentLoaded`] means the page grew
/// and the caller should keep scrolling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopDecision {
    pub halt: bool,
    pub reason: StopReason,
}

impl StopDecision {
    pub fn halt(reason: StopReason) -> Self {
        Self { halt: true, reason }
    }

    pub fn proceed(reason: StopReason) -> Self {
        Self {
            halt: false,
            reason,
        }
    }
}

/// A link destination whose appearance on the page ends the capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetMarker(String);

impl TargetMarker {
    pub fn new(href: impl Into<String>) -> Self {
        Self(href.into())
    }

    pub fn href(&self) -> &str {
        &self.0
    }

    /// CSS selector matching an anchor with exactly this `href`.
    pub fn selector(&self) -> String {
        let escaped = self.0.replace('\\', "\\\\").replace('"', "\\\"");
        format!("a[href=\"{}\"]", escaped)
    }
}

/// The caller's scroll budget: a fixed number of scrolls or a target marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopLimit {
    MaxScrolls(u32),
    Target(TargetMarker),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StopConfigError {
    #[error("You cannot set both --max-scrolls and --target-href.")]
    Both,
    #[error("You must set either --max-scrolls or --target-href.")]
    Neither,
}

impl StopLimit {
    /// Build the limit from the two mutually exclusive options.
    pub fn from_options(
        max_scrolls: Option<u32>,
        target_href: Option<String>,
    ) -> Result<Self, StopConfigError> {
        match (max_scrolls, target_href) {
            (Some(_), Some(_)) => Err(StopConfigError::Both),
            (None, None) => Err(StopConfigError::Neither),
            (Some(max), None) => Ok(StopLimit::MaxScrolls(max)),
            (None, Some(href)) => Ok(StopLimit::Target(TargetMarker::new(href))),
        }
    }
}

/// Checks that need no page access, in priority order: deadline, then budget.
///
/// A `None` deadline is never reached.
pub fn check_limits(
    now: Instant,
    deadline: Option<Instant>,
    scroll_count: u32,
    limit: &StopLimit,
) -> Option<StopDecision> {
    if deadline.is_some_and(|deadline| now >= deadline) {
        return Some(StopDecision::halt(StopReason::Timeout));
    }
    if let StopLimit::MaxScrolls(max) = limit {
        if scroll_count >= *max {
            return Some(StopDecision::halt(StopReason::MaxScrollsReached));
        }
    }
    None
}

/// Decides, after each scroll, whether the loop should halt.
#[derive(Debug, Clone)]
pub struct StopEvaluator {
    limit: StopLimit,
    timeout: Duration,
    poll_interval: Duration,
}

impl StopEvaluator {
    pub fn new(limit: StopLimit, timeout: Duration) -> Self {
        Self {
            limit,
            timeout,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn limit(&self) -> &StopLimit {
        &self.limit
    }

    /// Poll the page until a stopping condition or new content shows up.
    ///
    /// The deadline is measured from the start of this call, not from the
    /// start of the session. A timeout too large to represent waits without
    /// a deadline.
    pub async fn evaluate<D: PageDriver + ?Sized>(
        &self,
        driver: &mut D,
        previous_height: u64,
        scroll_count: u32,
    ) -> Result<StopDecision, DriverError> {
        let deadline = Instant::now().checked_add(self.timeout);

        loop {
            if let Some(decision) =
                check_limits(Instant::now(), deadline, scroll_count, &self.limit)
            {
                match decision.reason {
                    StopReason::Timeout => info!("Stopping condition met: Timeout expired"),
                    _ => info!("Stopping condition met: Maximum scroll count reached"),
                }
                return Ok(decision);
            }

            let current_height = driver.scroll_height().await?;
            if current_height > previous_height {
                debug!(
                    "New content loaded (height {} -> {})",
                    previous_height, current_height
                );

                if let StopLimit::Target(ref marker) = self.limit {
                    if driver.exists(&marker.selector()).await? {
                        info!(
                            "Stopping condition met: Target href '{}' found",
                            marker.href()
                        );
                        return Ok(StopDecision::halt(StopReason::TargetFound));
                    }
                }

                return Ok(StopDecision::proceed(StopReason::NewContentLoaded));
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
