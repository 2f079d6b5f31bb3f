//! Media URL selection.

use super::raw::{MediaKind, RawMedia};

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.is_empty())
}

/// Direct media URL, falling back to the video thumbnail for video and
/// animated GIF items.
fn video_url(media: &RawMedia) -> Option<&str> {
    non_empty(media.media_url_https.as_deref()).or_else(|| {
        media
            .video_info
            .as_ref()
            .and_then(|v| v.thumbnail_url.as_deref())
    })
}

/// Effective URL of a recognized media item; `None` for unrecognized types.
pub fn media_url(media: &RawMedia) -> Option<&str> {
    match media.kind? {
        MediaKind::Photo => media.media_url_https.as_deref(),
        MediaKind::Video | MediaKind::AnimatedGif => video_url(media),
        MediaKind::Other => None,
    }
}

/// URLs of all recognized media items, in order, without empty values.
pub fn extract_media(media: &[RawMedia]) -> Vec<String> {
    media
        .iter()
        .filter_map(|m| non_empty(media_url(m)))
        .map(str::to_string)
        .collect()
}

/// Thumbnail drawn from the first media item only.
///
/// Unlike [`extract_media`], items of any type other than video/GIF yield
/// their direct URL.
pub fn thumbnail(media: &[RawMedia]) -> Option<String> {
    let first = media.first()?;
    let url = match first.kind {
        Some(MediaKind::Video) | Some(MediaKind::AnimatedGif) => video_url(first),
        _ => first.media_url_https.as_deref(),
    };
    url.map(str::to_string)
}
