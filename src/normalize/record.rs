//! The flat output record.

use serde::{Deserialize, Serialize};

use super::date::parse_legacy_date;
use super::media::{extract_media, thumbnail};
use super::raw::RawTweet;

/// One flattened post.
///
/// Flags are emitted as 0/1 integers. Optional references and the thumbnail
/// serialize as `null` when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub id: String,
    pub user_id: String,
    pub media_array: Vec<String>,
    pub tweet_url: String,
    pub name: String,
    pub created_at: Option<String>,
    pub full_text: String,
    pub is_quote_status: u8,
    pub favorite_count: u64,
    pub favorited: u8,
    pub retweeted: u8,
    pub lang: String,
    pub possibly_sensitive: u8,
    pub retweeted_status: Option<String>,
    pub quoted_status: Option<String>,
    pub thumbnail: Option<String>,
}

fn flag(value: bool) -> u8 {
    u8::from(value)
}

impl From<RawTweet> for NormalizedRecord {
    fn from(tweet: RawTweet) -> Self {
        let user = tweet.core.user_results.result;
        let legacy = tweet.legacy;
        let media = legacy
            .extended_entities
            .and_then(|e| e.media)
            .unwrap_or_default();
        let id = tweet.rest_id.0;

        Self {
            tweet_url: format!("https://twitter.com/{}/status/{}", user.core.screen_name, id),
            id,
            user_id: user.rest_id.0,
            media_array: extract_media(&media),
            name: user.core.name,
            created_at: parse_legacy_date(&legacy.created_at),
            full_text: legacy.full_text,
            is_quote_status: flag(legacy.is_quote_status),
            favorite_count: legacy.favorite_count,
            favorited: flag(legacy.favorited),
            retweeted: flag(legacy.retweeted),
            lang: legacy.lang,
            possibly_sensitive: flag(legacy.possibly_sensitive),
            retweeted_status: legacy
                .retweeted_status_result
                .as_ref()
                .and_then(|r| r.rest_id()),
            quoted_status: tweet.quoted_status_result.as_ref().and_then(|r| r.rest_id()),
            thumbnail: thumbnail(&media),
        }
    }
}
