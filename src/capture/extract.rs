//! Network response extraction.
//!
//! Scans drained network-log entries for `Network.responseReceived` events
//! whose URL matches a prefix, fetches each new response body through the
//! driver, and writes it as an artifact.

use std::collections::HashSet;
use std::path::PathBuf;

use base64::Engine;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::artifacts::ArtifactStore;
use super::error::CaptureError;
use super::session::{CaptureSession, MAX_BODY_ATTEMPTS};
use crate::browser::{LogEntry, PageDriver, ResponseBody};

const RESPONSE_RECEIVED: &str = "Network.responseReceived";

#[derive(Debug, Deserialize)]
struct NetworkEvent {
    method: String,
    #[serde(default)]
    params: serde_json::Value,
}

/// The parts of a `Network.responseReceived` event the extractor uses.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEvent {
    pub request_id: String,
    pub response: ResponseMeta,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResponseMeta {
    #[serde(default)]
    pub url: String,
}

/// One response body written to disk.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedResponse {
    pub request_id: String,
    pub url: String,
    pub path: PathBuf,
}

#[derive(Debug, Error)]
enum BodyError {
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("body is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("body is not JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parse a log entry into a response event.
///
/// Returns `Ok(None)` for well-formed events of any other method. Entries
/// wrapped WebDriver-style (`{"message": {...}}`) are unwrapped first.
pub fn parse_entry(entry: &LogEntry) -> Result<Option<ResponseEvent>, serde_json::Error> {
    let mut value: serde_json::Value = serde_json::from_str(&entry.message)?;
    if value.get("message").is_some_and(|m| m.is_object()) {
        value = value["message"].take();
    }

    let event: NetworkEvent = serde_json::from_value(value)?;
    if event.method != RESPONSE_RECEIVED {
        return Ok(None);
    }

    serde_json::from_value(event.params).map(Some)
}

fn decode_body(body: &ResponseBody) -> Result<serde_json::Value, BodyError> {
    if body.base64_encoded {
        let bytes = base64::engine::general_purpose::STANDARD.decode(&body.body)?;
        let text = String::from_utf8(bytes)?;
        Ok(serde_json::from_str(&text)?)
    } else {
        Ok(serde_json::from_str(&body.body)?)
    }
}

/// Saves bodies of responses whose URL starts with a fixed prefix.
#[derive(Debug, Clone)]
pub struct ResponseExtractor {
    url_prefix: String,
    store: ArtifactStore,
}

impl ResponseExtractor {
    pub fn new(url_prefix: impl Into<String>, store: ArtifactStore) -> Self {
        Self {
            url_prefix: url_prefix.into(),
            store,
        }
    }

    pub fn url_prefix(&self) -> &str {
        &self.url_prefix
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Process one batch of log entries plus any responses deferred by
    /// earlier batches.
    ///
    /// A response id is marked seen once its body has been fetched, even if
    /// the body turns out not to be JSON. Failed fetches are retried on the
    /// next batch, up to [`MAX_BODY_ATTEMPTS`] in total.
    pub async fn extract<D: PageDriver + ?Sized>(
        &self,
        driver: &mut D,
        entries: &[LogEntry],
        session: &mut CaptureSession,
    ) -> Result<Vec<CapturedResponse>, CaptureError> {
        let mut candidates = session.take_deferred();

        for entry in entries {
            let event = match parse_entry(entry) {
                Ok(Some(event)) => event,
                Ok(None) => continue,
                Err(e) => {
                    warn!(error = %e, entry = %entry.message, "Error processing log entry");
                    continue;
                }
            };

            if session.is_seen(&event.request_id) {
                continue;
            }
            if !event.response.url.starts_with(&self.url_prefix) {
                continue;
            }
            candidates.push(event);
        }

        let mut attempted = HashSet::new();
        let mut saved = Vec::new();

        for event in candidates {
            if session.is_seen(&event.request_id) || !attempted.insert(event.request_id.clone())
            {
                continue;
            }

            let body = match driver.response_body(&event.request_id).await {
                Ok(body) => body,
                Err(e) => {
                    let attempts = session.record_attempt(&event.request_id);
                    if attempts >= MAX_BODY_ATTEMPTS {
                        warn!(
                            request_id = %event.request_id,
                            url = %event.response.url,
                            "Giving up on response body after {} attempts: {}",
                            attempts,
                            e
                        );
                        session.mark_seen(&event.request_id);
                    } else {
                        debug!(
                            request_id = %event.request_id,
                            "Response body not available yet ({}), retrying later",
                            e
                        );
                        session.defer(event);
                    }
                    continue;
                }
            };

            session.mark_seen(&event.request_id);

            let json = match decode_body(&body) {
                Ok(json) => json,
                Err(e) => {
                    warn!(
                        request_id = %event.request_id,
                        url = %event.response.url,
                        "Skipping response body: {}",
                        e
                    );
                    continue;
                }
            };

            let path = self
                .store
                .write(&event.request_id, &json)
                .map_err(|source| CaptureError::Artifact {
                    path: self.store.path_for(&event.request_id),
                    source,
                })?;

            info!(
                "Saved response body for URL: {} to {}",
                event.response.url,
                path.display()
            );
            session.record_saved();
            saved.push(CapturedResponse {
                request_id: event.request_id,
                url: event.response.url,
                path,
            });
        }

        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::fake::{response_event, FakePage};

    const PREFIX: &str = "https://x.com/i/api/graphql/abc/Likes";

    fn extractor(dir: &std::path::Path) -> ResponseExtractor {
        ResponseExtractor::new(PREFIX, ArtifactStore::new(dir))
    }

    #[test]
    fn parses_plain_and_wrapped_events() {
        let plain = response_event("1", "https://x.com/a");
        let event = parse_entry(&plain).unwrap().unwrap();
        assert_eq!(event.request_id, "1");
        assert_eq!(event.response.url, "https://x.com/a");

        let wrapped = LogEntry::new(format!(r#"{{"message": {}, "webview": "x"}}"#, plain.message));
        assert_eq!(parse_entry(&wrapped).unwrap(), Some(event));
    }

    #[test]
    fn other_methods_are_ignored() {
        let entry = LogEntry::new(r#"{"method": "Network.requestWillBeSent", "params": {}}"#);
        assert_eq!(parse_entry(&entry).unwrap(), None);
    }

    #[tokio::test]
    async fn saves_matching_responses_only() {
        let tmp = tempfile::tempdir().unwrap();
        let mut page = FakePage::new()
            .with_body("1", r#"{"data": 1}"#)
            .with_body("2", r#"{"data": 2}"#);
        let entries = vec![
            response_event("1", &format!("{}?variables=x", PREFIX)),
            response_event("2", "https://x.com/i/api/graphql/abc/HomeTimeline"),
        ];
        let mut session = CaptureSession::new();

        let saved = extractor(tmp.path())
            .extract(&mut page, &entries, &mut session)
            .await
            .unwrap();

        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].request_id, "1");
        assert!(saved[0].path.exists());
        assert!(session.is_seen("1"));
        assert!(!session.is_seen("2"));
        assert_eq!(page.journal().lock().unwrap().body_requests, vec!["1"]);
    }

    #[tokio::test]
    async fn malformed_entry_does_not_abort_batch() {
        let tmp = tempfile::tempdir().unwrap();
        let mut page = FakePage::new().with_body("9", r#"{"ok": true}"#);
        let entries = vec![
            LogEntry::new("{truncated"),
            LogEntry::new(r#"{"method": "Network.responseReceived", "params": {}}"#),
            response_event("9", PREFIX),
        ];
        let mut session = CaptureSession::new();

        let saved = extractor(tmp.path())
            .extract(&mut page, &entries, &mut session)
            .await
            .unwrap();

        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].request_id, "9");
    }

    #[tokio::test]
    async fn rerun_with_updated_seen_set_saves_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let mut page = FakePage::new()
            .with_body("1", r#"{"a": 1}"#)
            .with_body("2", r#"{"b": 2}"#);
        let entries = vec![response_event("1", PREFIX), response_event("2", PREFIX)];
        let extractor = extractor(tmp.path());
        let mut session = CaptureSession::new();

        let first = extractor
            .extract(&mut page, &entries, &mut session)
            .await
            .unwrap();
        let second = extractor
            .extract(&mut page, &entries, &mut session)
            .await
            .unwrap();

        assert_eq!(first.len(), 2);
        assert!(second.is_empty());
        assert_eq!(page.journal().lock().unwrap().body_requests.len(), 2);
    }

    #[tokio::test]
    async fn non_json_body_is_seen_but_not_saved() {
        let tmp = tempfile::tempdir().unwrap();
        let mut page = FakePage::new().with_body("3", "<html>rate limited</html>");
        let entries = vec![response_event("3", PREFIX)];
        let mut session = CaptureSession::new();

        let saved = extractor(tmp.path())
            .extract(&mut page, &entries, &mut session)
            .await
            .unwrap();

        assert!(saved.is_empty());
        assert!(session.is_seen("3"));
        assert_eq!(session.saved_count(), 0);
    }

    #[tokio::test]
    async fn base64_bodies_are_decoded() {
        let tmp = tempfile::tempdir().unwrap();
        let encoded = base64::engine::general_purpose::STANDARD.encode(r#"{"text": "héllo"}"#);
        let mut page = FakePage::new().with_encoded_body("4", &encoded);
        let mut session = CaptureSession::new();

        let saved = extractor(tmp.path())
            .extract(&mut page, &[response_event("4", PREFIX)], &mut session)
            .await
            .unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&saved[0].path).unwrap()).unwrap();
        assert_eq!(written["text"], "héllo");
    }

    #[tokio::test]
    async fn failed_body_fetch_is_retried_on_next_batch() {
        let tmp = tempfile::tempdir().unwrap();
        let mut page = FakePage::new()
            .with_body("5", r#"{"late": true}"#)
            .with_body_failures("5", 1);
        let extractor = extractor(tmp.path());
        let mut session = CaptureSession::new();

        let first = extractor
            .extract(&mut page, &[response_event("5", PREFIX)], &mut session)
            .await
            .unwrap();
        assert!(first.is_empty());
        assert!(!session.is_seen("5"));
        assert_eq!(session.deferred_count(), 1);

        let second = extractor.extract(&mut page, &[], &mut session).await.unwrap();
        assert_eq!(second.len(), 1);
        assert!(session.is_seen("5"));
        assert_eq!(session.deferred_count(), 0);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let tmp = tempfile::tempdir().unwrap();
        let mut page = FakePage::new().with_body_failures("6", 10);
        let extractor = extractor(tmp.path());
        let mut session = CaptureSession::new();

        extractor
            .extract(&mut page, &[response_event("6", PREFIX)], &mut session)
            .await
            .unwrap();
        for _ in 1..MAX_BODY_ATTEMPTS {
            extractor.extract(&mut page, &[], &mut session).await.unwrap();
        }

        assert!(session.is_seen("6"));
        assert_eq!(session.deferred_count(), 0);
        assert_eq!(
            page.journal().lock().unwrap().body_requests.len(),
            MAX_BODY_ATTEMPTS as usize
        );
    }
}
