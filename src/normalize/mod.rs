//! Flattening of captured timeline payloads into [`NormalizedRecord`]s.
//!
//! A likes-timeline document holds its posts under
//! `data.user.result.timeline.timeline.instructions[].entries`. Content-item
//! entries are transformed; cursors and other structural entries are skipped.

mod date;
mod media;
mod raw;
mod record;

pub use date::parse_legacy_date;
pub use raw::{CONTENT_ITEM, INSTRUCTIONS_POINTER};
pub use record::NormalizedRecord;

use std::io::Write;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use raw::{ItemContent, TimelineEntry, TweetResult};

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("Invalid JSON document: {0}")]
    Document(#[source] serde_json::Error),
    #[error("No timeline entries found under {INSTRUCTIONS_POINTER}")]
    MissingTimeline,
    #[error("Unrecognized tweet shape: {0}")]
    Tweet(#[from] serde_json::Error),
    #[error("Entry {index} ({entry_id}): {source}")]
    Entry {
        index: usize,
        entry_id: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// What to do when one content entry cannot be transformed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Fail the whole run on the first bad entry.
    #[default]
    Abort,
    /// Log the entry, keep going, and report it.
    Skip,
}

/// Records produced from one batch of entries.
#[derive(Debug, Default)]
pub struct Normalized {
    pub records: Vec<NormalizedRecord>,
    /// Entries skipped under [`FailurePolicy::Skip`].
    pub errors: Vec<NormalizeError>,
    /// Cursors and other non-content entries passed over.
    pub non_content: usize,
}

/// Transform one `tweet_results.result` object.
pub fn normalize_one(result: &serde_json::Value) -> Result<NormalizedRecord, NormalizeError> {
    let tweet = TweetResult::deserialize(result)?.into_tweet();
    Ok(NormalizedRecord::from(tweet))
}

fn normalize_entry(
    entry: &serde_json::Value,
) -> Result<Option<NormalizedRecord>, serde_json::Error> {
    let entry = TimelineEntry::deserialize(entry)?;
    if entry.content.entry_type != CONTENT_ITEM {
        debug!("Skipping {} entry {}", entry.content.entry_type, entry.entry_id);
        return Ok(None);
    }

    let item = ItemContent::deserialize(entry.content.item_content.unwrap_or_default())?;
    let tweet = TweetResult::deserialize(item.tweet_results.result)?.into_tweet();
    Ok(Some(NormalizedRecord::from(tweet)))
}

/// Transform an ordered list of timeline entries.
pub fn normalize(
    entries: &[serde_json::Value],
    policy: FailurePolicy,
) -> Result<Normalized, NormalizeError> {
    let mut out = Normalized::default();

    for (index, entry) in entries.iter().enumerate() {
        match normalize_entry(entry) {
            Ok(Some(record)) => out.records.push(record),
            Ok(None) => out.non_content += 1,
            Err(source) => {
                let entry_id = entry
                    .get("entryId")
                    .and_then(|v| v.as_str())
                    .unwrap_or("?")
                    .to_string();
                let err = NormalizeError::Entry {
                    index,
                    entry_id,
                    source,
                };
                match policy {
                    FailurePolicy::Abort => return Err(err),
                    FailurePolicy::Skip => {
                        warn!("Skipping {}", err);
                        out.errors.push(err);
                    }
                }
            }
        }
    }

    debug!(
        "Normalized {} records ({} non-content entries, {} skipped)",
        out.records.len(),
        out.non_content,
        out.errors.len()
    );
    Ok(out)
}

/// Locate the entries array of a likes-timeline document.
///
/// The first instruction carrying an `entries` array is used.
pub fn timeline_entries(doc: &serde_json::Value) -> Result<&[serde_json::Value], NormalizeError> {
    doc.pointer(INSTRUCTIONS_POINTER)
        .and_then(|v| v.as_array())
        .and_then(|instructions| {
            instructions
                .iter()
                .find_map(|i| i.get("entries").and_then(|e| e.as_array()))
        })
        .map(|entries| entries.as_slice())
        .ok_or(NormalizeError::MissingTimeline)
}

/// Transform a whole captured document.
pub fn normalize_document(
    doc: &serde_json::Value,
    policy: FailurePolicy,
) -> Result<Normalized, NormalizeError> {
    normalize(timeline_entries(doc)?, policy)
}

/// Parse a document from text and transform it.
pub fn normalize_str(content: &str, policy: FailurePolicy) -> Result<Normalized, NormalizeError> {
    let doc: serde_json::Value = serde_json::from_str(content).map_err(NormalizeError::Document)?;
    normalize_document(&doc, policy)
}

/// Write records as a JSON array indented by four spaces, non-ASCII kept
/// as-is.
pub fn write_records<W: Write>(
    writer: W,
    records: &[NormalizedRecord],
) -> Result<(), NormalizeError> {
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(writer, formatter);
    records
        .serialize(&mut ser)
        .map_err(|e| NormalizeError::Io(e.into()))
}
