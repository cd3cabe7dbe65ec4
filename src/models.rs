//! Records exchanged with the video search backend

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single video returned by the backend. Identity is `id`.
///
/// Decoding goes through a wire struct, so the owner may arrive as
/// `user_name`, `streamer_name` or both. It is always written back as
/// `user_name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WireVideo")]
pub struct VideoRecord {
    pub id: String,
    pub title: String,
    #[serde(rename = "user_name")]
    pub owner_name: String,
    pub url: String,
    pub view_count: u64,
    /// Encoded as `1h2m3s`
    pub duration: String,
    /// ISO-8601 timestamp
    pub created_at: String,
    pub language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_name: Option<String>,
}

#[derive(Deserialize)]
struct WireVideo {
    id: String,
    title: String,
    #[serde(default)]
    user_name: Option<String>,
    #[serde(default)]
    streamer_name: Option<String>,
    url: String,
    #[serde(default)]
    view_count: u64,
    #[serde(default)]
    duration: String,
    created_at: String,
    #[serde(default)]
    language: String,
    #[serde(default)]
    thumbnail_url: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    game_id: Option<String>,
    #[serde(default)]
    game_name: Option<String>,
}

impl From<WireVideo> for VideoRecord {
    fn from(wire: WireVideo) -> Self {
        Self {
            id: wire.id,
            title: wire.title,
            owner_name: wire.user_name.or(wire.streamer_name).unwrap_or_default(),
            url: wire.url,
            view_count: wire.view_count,
            duration: wire.duration,
            created_at: wire.created_at,
            language: wire.language,
            thumbnail_url: wire.thumbnail_url,
            description: wire.description,
            game_id: wire.game_id,
            game_name: wire.game_name,
        }
    }
}

impl VideoRecord {
    /// Parsed creation time, `None` when the backend sent something unparseable
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.created_at)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Duration in seconds, `0` when unparseable
    pub fn duration_secs(&self) -> u64 {
        crate::duration::parse(&self.duration)
    }
}

/// Game the results belong to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameMeta {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub box_art_url: Option<String>,
}

/// One page of search results
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchResultPage {
    pub videos: Vec<VideoRecord>,
    /// `None` when no further pages exist
    pub next_cursor: Option<String>,
    pub total_count: u64,
    pub game_meta: Option<GameMeta>,
}

impl SearchResultPage {
    pub fn has_more(&self) -> bool {
        self.next_cursor.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_record_wire_names() {
        let json = serde_json::json!({
            "id": "v1",
            "title": "Speedrun",
            "user_name": "runner",
            "url": "https://example.com/v1",
            "view_count": 42,
            "duration": "1h2m3s",
            "created_at": "2024-03-01T12:00:00Z",
            "language": "en"
        });

        let video: VideoRecord = serde_json::from_value(json).unwrap();
        assert_eq!(video.owner_name, "runner");
        assert_eq!(video.duration_secs(), 3723);
        assert!(video.created_at_utc().is_some());
        assert!(video.thumbnail_url.is_none());
    }

    #[test]
    fn test_streamer_name_alias() {
        let json = serde_json::json!({
            "id": "v2",
            "title": "t",
            "streamer_name": "alias",
            "url": "u",
            "created_at": "not a date"
        });

        let video: VideoRecord = serde_json::from_value(json).unwrap();
        assert_eq!(video.owner_name, "alias");
        assert_eq!(video.view_count, 0);
        assert!(video.created_at_utc().is_none());
    }

    #[test]
    fn test_both_owner_fields_prefer_user_name() {
        let json = serde_json::json!({
            "id": "v3",
            "title": "t",
            "user_name": "primary",
            "streamer_name": "secondary",
            "url": "u",
            "created_at": "2024-03-01T12:00:00Z"
        });

        let video: VideoRecord = serde_json::from_value(json).unwrap();
        assert_eq!(video.owner_name, "primary");

        // written back under a single name
        let written = serde_json::to_value(&video).unwrap();
        assert_eq!(written["user_name"], "primary");
        assert!(written.get("streamer_name").is_none());
        let reread: VideoRecord = serde_json::from_value(written).unwrap();
        assert_eq!(reread, video);
    }
}
