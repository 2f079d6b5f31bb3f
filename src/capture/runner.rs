//! The scroll-capture state machine.

use tracing::{debug, info};

use super::error::CaptureError;
use super::extract::ResponseExtractor;
use super::session::CaptureSession;
use super::stop::{StopEvaluator, StopReason};
use crate::browser::{CookieRecord, PageDriver};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopState {
    Init,
    Scrolling,
    Extracting,
    Done(StopReason),
}

/// Summary of a finished capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureOutcome {
    pub reason: StopReason,
    pub scrolls: u32,
    pub responses_seen: usize,
    pub artifacts_saved: usize,
}

/// Drives one page: load, authenticate, then scroll and extract until a
/// stopping condition halts it.
pub struct CaptureLoop<'a> {
    url: &'a str,
    cookies: &'a [CookieRecord],
    evaluator: &'a StopEvaluator,
    extractor: &'a ResponseExtractor,
    final_flush: bool,
}

impl<'a> CaptureLoop<'a> {
    pub fn new(
        url: &'a str,
        cookies: &'a [CookieRecord],
        evaluator: &'a StopEvaluator,
        extractor: &'a ResponseExtractor,
    ) -> Self {
        Self {
            url,
            cookies,
            evaluator,
            extractor,
            final_flush: false,
        }
    }

    /// Run one more extraction after the loop halts.
    pub fn with_final_flush(mut self, final_flush: bool) -> Self {
        self.final_flush = final_flush;
        self
    }

    /// Run to completion. Driver errors abort the loop; closing the driver
    /// is the caller's job.
    pub async fn run<D: PageDriver + ?Sized>(
        &self,
        driver: &mut D,
        session: &mut CaptureSession,
    ) -> Result<StopReason, CaptureError> {
        let mut state = LoopState::Init;

        loop {
            state = match state {
                LoopState::Init => {
                    driver.navigate(self.url).await?;
                    driver.set_cookies(self.cookies, self.url).await?;
                    // Navigate again rather than reload: an unauthenticated
                    // first load may have redirected elsewhere.
                    driver.navigate(self.url).await?;
                    session.last_height = driver.scroll_height().await?;
                    debug!("Initial page height {}", session.last_height);
                    LoopState::Scrolling
                }
                LoopState::Scrolling => {
                    driver.scroll_to_bottom().await?;
                    let decision = self
                        .evaluator
                        .evaluate(driver, session.last_height, session.scroll_count)
                        .await?;

                    if decision.halt {
                        LoopState::Done(decision.reason)
                    } else {
                        session.last_height = driver.scroll_height().await?;
                        session.scroll_count += 1;
                        LoopState::Extracting
                    }
                }
                LoopState::Extracting => {
                    self.flush(driver, session).await?;
                    LoopState::Scrolling
                }
                LoopState::Done(reason) => {
                    if self.final_flush {
                        self.flush(driver, session).await?;
                    }
                    info!(
                        "Capture finished ({}) after {} scrolls, {} responses saved",
                        reason,
                        session.scroll_count,
                        session.saved_count()
                    );
                    return Ok(reason);
                }
            };
        }
    }

    async fn flush<D: PageDriver + ?Sized>(
        &self,
        driver: &mut D,
        session: &mut CaptureSession,
    ) -> Result<(), CaptureError> {
        let entries = driver.drain_network_log().await?;
        let saved = self.extractor.extract(driver, &entries, session).await?;
        debug!(
            "Processed {} log entries, saved {} responses",
            entries.len(),
            saved.len()
        );
        Ok(())
    }
}

impl CaptureOutcome {
    pub(crate) fn from_session(reason: StopReason, session: &CaptureSession) -> Self {
        Self {
            reason,
            scrolls: session.scroll_count,
            responses_seen: session.seen_count(),
            artifacts_saved: session.saved_count(),
        }
    }
}
