//! Input shapes of the timeline GraphQL payload.
//!
//! Required fields are plain types so a missing key fails deserialization of
//! the entry; optional blocks default to absent.

use serde::{Deserialize, Deserializer};

/// Entry type carrying a post; everything else (cursors, modules) is skipped.
pub const CONTENT_ITEM: &str = "TimelineTimelineItem";

/// JSON pointer to the instruction list inside a likes timeline document.
pub const INSTRUCTIONS_POINTER: &str = "/data/user/result/timeline/timeline/instructions";

/// One element of an instruction's `entries` array.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    #[serde(default)]
    pub entry_id: String,
    pub content: EntryContent,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryContent {
    pub entry_type: String,
    /// Only interpreted for content items.
    #[serde(default)]
    pub item_content: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct ItemContent {
    pub tweet_results: TweetResults,
}

#[derive(Debug, Deserialize)]
pub struct TweetResults {
    pub result: serde_json::Value,
}

/// The result wrapper, discriminated by `__typename`.
///
/// Any other tag (tombstones, unavailable posts) fails deserialization.
#[derive(Debug, Deserialize)]
#[serde(tag = "__typename")]
pub enum TweetResult {
    Tweet(RawTweet),
    TweetWithVisibilityResults { tweet: RawTweet },
}

impl TweetResult {
    pub fn into_tweet(self) -> RawTweet {
        match self {
            TweetResult::Tweet(tweet) => tweet,
            TweetResult::TweetWithVisibilityResults { tweet } => tweet,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RawTweet {
    pub rest_id: Id,
    pub core: TweetCore,
    pub legacy: Legacy,
    #[serde(default)]
    pub quoted_status_result: Option<ResultRef>,
}

#[derive(Debug, Deserialize)]
pub struct TweetCore {
    pub user_results: UserResults,
}

#[derive(Debug, Deserialize)]
pub struct UserResults {
    pub result: RawUser,
}

#[derive(Debug, Deserialize)]
pub struct RawUser {
    pub rest_id: Id,
    pub core: UserCore,
}

#[derive(Debug, Deserialize)]
pub struct UserCore {
    pub name: String,
    pub screen_name: String,
}

/// The legacy attribute block: text, counters, flags, timestamp.
#[derive(Debug, Deserialize)]
pub struct Legacy {
    pub created_at: String,
    pub full_text: String,
    #[serde(deserialize_with = "truthy")]
    pub is_quote_status: bool,
    #[serde(deserialize_with = "count")]
    pub favorite_count: u64,
    #[serde(deserialize_with = "truthy")]
    pub favorited: bool,
    #[serde(deserialize_with = "truthy")]
    pub retweeted: bool,
    pub lang: String,
    #[serde(default, deserialize_with = "truthy")]
    pub possibly_sensitive: bool,
    #[serde(default)]
    pub extended_entities: Option<ExtendedEntities>,
    #[serde(default)]
    pub retweeted_status_result: Option<ResultRef>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ExtendedEntities {
    #[serde(default)]
    pub media: Option<Vec<RawMedia>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Photo,
    Video,
    AnimatedGif,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMedia {
    #[serde(rename = "type", default, deserialize_with = "media_kind")]
    pub kind: Option<MediaKind>,
    #[serde(default)]
    pub media_url_https: Option<String>,
    #[serde(default)]
    pub video_info: Option<VideoInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoInfo {
    #[serde(default)]
    pub thumbnail_url: Option<String>,
}

/// A nested `{ "result": { "rest_id": ... } }` reference to another post.
#[derive(Debug, Default, Deserialize)]
pub struct ResultRef {
    #[serde(default)]
    pub result: Option<IdRef>,
}

#[derive(Debug, Default, Deserialize)]
pub struct IdRef {
    #[serde(default)]
    pub rest_id: Option<Id>,
}

impl ResultRef {
    pub fn rest_id(&self) -> Option<String> {
        self.result
            .as_ref()
            .and_then(|r| r.rest_id.as_ref())
            .map(|id| id.0.clone())
    }
}

/// An identifier sent either as a string or as a number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Id(pub String);

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Text(String),
            Number(u64),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Text(s) => Id(s),
            Repr::Number(n) => Id(n.to_string()),
        })
    }
}

/// Media type tag; a non-string tag is an unrecognized type, not an error.
fn media_kind<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<MediaKind>, D::Error> {
    use serde_json::Value;

    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(tag) => Some(
            MediaKind::deserialize(Value::String(tag)).unwrap_or(MediaKind::Other),
        ),
        _ => Some(MediaKind::Other),
    })
}

/// A counter sent as an integer, a float, or a numeric string.
fn count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    use serde::de::Error;
    use serde_json::Value;

    let value = Value::deserialize(deserializer)?;
    let parsed = match &value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| D::Error::custom(format!("invalid count: {}", value)))
}

/// Truthiness of an arbitrary JSON value; `null`, `false`, `0`, `""`, `[]`
/// and `{}` are false.
fn truthy<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    use serde_json::Value;

    Ok(match Value::deserialize(deserializer)? {
        Value::Null => false,
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    })
}
