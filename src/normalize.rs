//! Normalization of upstream video records.
//!
//! The upstream search API returns loosely-typed records: field names vary
//! between responses, nested objects may be missing entirely, and numbers
//! sometimes arrive as strings. Everything in this module treats the input
//! as untrusted and maps it onto the single canonical [`VideoRecord`] shape
//! the frontend consumes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Canonical video record exposed by the API.
///
/// All fields except `id` and `create_time` are total: missing upstream data
/// is replaced with a documented default instead of being omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub video_url: String,
    pub video_url_no_wm: String,
    pub caption: String,
    pub author: AuthorInfo,
    pub cover: String,
    pub duration: i64,
    pub stats: VideoStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_time: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorInfo {
    pub username: String,
    pub nickname: String,
    pub avatar: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoStats {
    pub likes: i64,
    pub comments: i64,
    pub shares: i64,
    pub plays: i64,
}

/// Maps one raw upstream record onto the canonical schema.
///
/// Field resolution order and defaults are fixed:
/// - `id`: first of `video_id`, `id` (numbers stringified), else absent
/// - `caption`: `title`, default `""`
/// - `author.username`: `author.unique_id`, default `"unknown"`
/// - `author.nickname`: `author.nickname`, default `"Unknown User"`
/// - `author.avatar`: `author.avatar`, default `""`
/// - `cover`: `cover`, else `origin_cover`, default `""`
/// - `video_url`: `play`, else `wmplay`, default `""`
/// - `duration` and all counters: `0` when absent or non-numeric
///
/// A real upstream count of `0` is indistinguishable from an absent one;
/// that ambiguity is accepted, not special-cased.
pub fn normalize_video(raw: &Value) -> VideoRecord {
    let author = raw.get("author");

    VideoRecord {
        id: string_field(raw, "video_id").or_else(|| string_field(raw, "id")),
        video_url: string_field(raw, "play")
            .or_else(|| string_field(raw, "wmplay"))
            .unwrap_or_default(),
        video_url_no_wm: string_field(raw, "play").unwrap_or_default(),
        caption: string_field(raw, "title").unwrap_or_default(),
        author: AuthorInfo {
            username: author
                .and_then(|a| string_field(a, "unique_id"))
                .unwrap_or_else(|| "unknown".to_string()),
            nickname: author
                .and_then(|a| string_field(a, "nickname"))
                .unwrap_or_else(|| "Unknown User".to_string()),
            avatar: author
                .and_then(|a| string_field(a, "avatar"))
                .unwrap_or_default(),
        },
        cover: string_field(raw, "cover")
            .or_else(|| string_field(raw, "origin_cover"))
            .unwrap_or_default(),
        duration: count_field(raw, "duration"),
        stats: VideoStats {
            likes: count_field(raw, "digg_count"),
            comments: count_field(raw, "comment_count"),
            shares: count_field(raw, "share_count"),
            plays: count_field(raw, "play_count"),
        },
        create_time: raw.get("create_time").and_then(Value::as_i64),
    }
}

/// Normalizes a whole upstream list, then drops every record whose playable
/// URL resolved empty. The filter runs after the map step and preserves the
/// order of surviving records.
pub fn normalize_videos(raws: &[Value]) -> Vec<VideoRecord> {
    raws.iter()
        .map(normalize_video)
        .filter(|record| !record.video_url.is_empty())
        .collect()
}

/// Reads a string-ish field. Empty strings count as absent so fallbacks and
/// defaults apply to them; numeric values are stringified since the upstream
/// occasionally ships ids as numbers.
fn string_field(raw: &Value, key: &str) -> Option<String> {
    match raw.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn count_field(raw: &Value, key: &str) -> i64 {
    match raw.get(key) {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        _ => 0,
    }
}
