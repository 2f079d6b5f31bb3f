//! Scroll-driven capture of timeline API responses.
//!
//! The loop scrolls the page, waits for a stopping condition, and saves every
//! new network response whose URL matches the configured prefix.

mod artifacts;
mod error;
mod extract;
mod runner;
mod session;
mod stop;

pub use artifacts::ArtifactStore;
pub use error::CaptureError;
pub use extract::{parse_entry, CapturedResponse, ResponseEvent, ResponseExtractor};
pub use runner::{CaptureLoop, CaptureOutcome};
pub use session::{CaptureSession, MAX_BODY_ATTEMPTS};
pub use stop::{
    check_limits, StopConfigError, StopDecision, StopEvaluator, StopLimit, StopReason,
    TargetMarker, DEFAULT_POLL_INTERVAL,
};

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::browser::{load_cookies, BrowserConfig, CookieRecord, PageDriver};
use crate::config::CaptureSettings;

/// Site hosting the likes timelines.
pub const SITE_ROOT: &str = "https://x.com/";

/// Likes timeline page of a profile, `https://x.com/<profile>/likes`.
pub fn likes_url(profile: &str) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(SITE_ROOT)?;
    url.path_segments_mut()
        .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
        .clear()
        .push(profile.trim_matches('/'))
        .push("likes");
    Ok(url)
}

/// Everything one capture invocation needs.
#[derive(Debug, Clone)]
pub struct CaptureJob {
    pub url: String,
    pub cookie_file: PathBuf,
    pub limit: StopLimit,
    pub timeout: Duration,
    pub poll_interval: Duration,
    pub url_prefix: String,
    pub output_dir: PathBuf,
    pub final_flush: bool,
}

impl CaptureJob {
    pub fn new(
        url: String,
        cookie_file: PathBuf,
        limit: StopLimit,
        settings: &CaptureSettings,
    ) -> Self {
        Self {
            url,
            cookie_file,
            limit,
            timeout: Duration::from_secs(settings.timeout_seconds),
            poll_interval: Duration::from_millis(settings.poll_interval_ms),
            url_prefix: settings.url_prefix.clone(),
            output_dir: settings.output_dir.clone(),
            final_flush: settings.final_flush,
        }
    }
}

/// Run a capture on an already acquired driver, releasing it on every exit
/// path before returning.
pub async fn capture_with<D: PageDriver>(
    mut driver: D,
    job: &CaptureJob,
    cookies: &[CookieRecord],
) -> Result<CaptureOutcome, CaptureError> {
    let evaluator =
        StopEvaluator::new(job.limit.clone(), job.timeout).with_poll_interval(job.poll_interval);
    let extractor = ResponseExtractor::new(
        job.url_prefix.clone(),
        ArtifactStore::new(job.output_dir.clone()),
    );
    let mut session = CaptureSession::new();

    let result = CaptureLoop::new(&job.url, cookies, &evaluator, &extractor)
        .with_final_flush(job.final_flush)
        .run(&mut driver, &mut session)
        .await;

    driver.close().await;

    result.map(|reason| CaptureOutcome::from_session(reason, &session))
}

/// Launch a browser and run a capture with it.
#[cfg(feature = "browser")]
pub async fn capture(
    job: &CaptureJob,
    browser: &BrowserConfig,
) -> Result<CaptureOutcome, CaptureError> {
    let cookies = load_cookies(&job.cookie_file)?;
    let driver = crate::browser::ChromeDriver::launch(browser).await?;
    capture_with(driver, job, &cookies).await
}

#[cfg(not(feature = "browser"))]
pub async fn capture(
    job: &CaptureJob,
    _browser: &BrowserConfig,
) -> Result<CaptureOutcome, CaptureError> {
    let _ = load_cookies(&job.cookie_file)?;
    Err(crate::browser::DriverError::Unavailable.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::fake::{response_event, FakePage};

    const PREFIX: &str = "https://x.com/i/api/graphql/abc/Likes";
    const URL: &str = "https://x.com/someone/likes";

    fn job(dir: &std::path::Path, limit: StopLimit) -> CaptureJob {
        CaptureJob {
            url: URL.to_string(),
            cookie_file: PathBuf::from("unused.json"),
            limit,
            timeout: Duration::from_secs(5),
            poll_interval: DEFAULT_POLL_INTERVAL,
            url_prefix: PREFIX.to_string(),
            output_dir: dir.to_path_buf(),
            final_flush: false,
        }
    }

    #[test]
    fn likes_url_for_profile() {
        assert_eq!(
            likes_url("someone").unwrap().as_str(),
            "https://x.com/someone/likes"
        );
        assert_eq!(
            likes_url("@someone/").unwrap().as_str(),
            "https://x.com/@someone/likes"
        );
    }

    fn cookie() -> CookieRecord {
        serde_json::from_str(r#"{"name": "auth_token", "value": "t", "domain": ".x.com"}"#).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn stops_at_max_scrolls_and_saves_each_batch() {
        let tmp = tempfile::tempdir().unwrap();
        let page = FakePage::new()
            .with_heights(&[1000, 2000, 3000, 4000, 5000])
            .with_log_batch(vec![response_event("1", PREFIX)])
            .with_log_batch(vec![response_event("2", PREFIX), response_event("1", PREFIX)])
            .with_body("1", r#"{"page": 1}"#)
            .with_body("2", r#"{"page": 2}"#);
        let journal = page.journal();

        let outcome = capture_with(page, &job(tmp.path(), StopLimit::MaxScrolls(2)), &[cookie()])
            .await
            .unwrap();

        assert_eq!(outcome.reason, StopReason::MaxScrollsReached);
        assert_eq!(outcome.scrolls, 2);
        assert_eq!(outcome.artifacts_saved, 2);
        assert!(tmp.path().join("response_1.json").exists());
        assert!(tmp.path().join("response_2.json").exists());

        let journal = journal.lock().unwrap();
        assert_eq!(journal.navigations, vec![URL, URL]);
        assert_eq!(journal.cookies_set, 1);
        assert_eq!(journal.closed, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stops_when_target_appears() {
        let tmp = tempfile::tempdir().unwrap();
        let page = FakePage::new()
            .with_heights(&[1000, 2000, 3000, 4000])
            .with_target_after(3);

        let limit = StopLimit::Target(TargetMarker::new("/someone/status/1"));
        let outcome = capture_with(page, &job(tmp.path(), limit), &[]).await.unwrap();

        assert_eq!(outcome.reason, StopReason::TargetFound);
        assert_eq!(outcome.scrolls, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_page_times_out() {
        let tmp = tempfile::tempdir().unwrap();
        let page = FakePage::new().with_heights(&[1000, 2000]);

        let outcome = capture_with(page, &job(tmp.path(), StopLimit::MaxScrolls(50)), &[])
            .await
            .unwrap();

        assert_eq!(outcome.reason, StopReason::Timeout);
        assert_eq!(outcome.scrolls, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn final_flush_collects_last_batch() {
        let tmp = tempfile::tempdir().unwrap();
        let page = FakePage::new()
            .with_heights(&[1000, 2000])
            .with_log_batch(vec![])
            .with_log_batch(vec![response_event("7", PREFIX)])
            .with_body("7", "{}");

        let mut job = job(tmp.path(), StopLimit::MaxScrolls(1));
        job.final_flush = true;
        let outcome = capture_with(page, &job, &[]).await.unwrap();

        assert_eq!(outcome.reason, StopReason::MaxScrollsReached);
        assert_eq!(outcome.artifacts_saved, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn driver_failure_still_releases_browser() {
        let tmp = tempfile::tempdir().unwrap();
        let page = FakePage::new()
            .with_heights(&[1000, 2000, 3000])
            .failing_on_scroll(2);
        let journal = page.journal();

        let err = capture_with(page, &job(tmp.path(), StopLimit::MaxScrolls(10)), &[])
            .await
            .unwrap_err();

        assert!(matches!(err, CaptureError::Driver(_)));
        assert_eq!(journal.lock().unwrap().closed, 1);
    }
}
