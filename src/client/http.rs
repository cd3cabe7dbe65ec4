//! HTTP implementation of the search backend contract
use crate::client::{FetchError, SearchOptions, VideoSearch};
use crate::config::ApiConfig;
use crate::error::{Result, VodseekError};
use crate::models::{GameMeta, SearchResultPage, VideoRecord};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// Default request timeout when the config does not carry one
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct WireResponse {
    videos: Vec<serde_json::Value>,
    #[serde(default)]
    pagination: Option<WirePagination>,
    #[serde(default)]
    total_count: Option<u64>,
    #[serde(default)]
    game: Option<GameMeta>,
    #[serde(default)]
    #[allow(dead_code)]
    last_updated: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WirePagination {
    #[serde(default)]
    cursor: Option<String>,
}

/// Client for `GET {base_url}{search_path}?game=..&limit=..&after=..&use_cache=..`
pub struct HttpSearchClient {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpSearchClient {
    /// Build a client from the `[api]` config section
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let timeout = crate::duration::to_std(&config.timeout).unwrap_or(DEFAULT_TIMEOUT);
        Self::with_timeout(&config.base_url, &config.search_path, timeout)
    }

    pub fn with_timeout(base_url: &str, search_path: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(VodseekError::Http)?;

        let endpoint = format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            search_path.trim_start_matches('/')
        );

        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl VideoSearch for HttpSearchClient {
    async fn search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> std::result::Result<SearchResultPage, FetchError> {
        let mut params: Vec<(&str, String)> = vec![
            ("game", query.to_string()),
            ("limit", options.limit.to_string()),
        ];
        if let Some(cursor) = &options.cursor {
            params.push(("after", cursor.clone()));
        }
        params.push(("use_cache", options.use_cache.to_string()));

        tracing::debug!(
            "GET {} game={:?} cursor={:?}",
            self.endpoint,
            query,
            options.cursor
        );

        let response = self
            .http
            .get(&self.endpoint)
            .query(&params)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        parse_page(&body)
    }
}

/// Decode a backend response body into a page.
///
/// A body that is not JSON, or whose `videos` field is missing or not an
/// array, is a malformed response. Individual records that fail to decode
/// are skipped with a warning.
pub fn parse_page(body: &str) -> std::result::Result<SearchResultPage, FetchError> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| FetchError::MalformedResponse(format!("invalid JSON: {e}")))?;

    match value.get("videos") {
        Some(serde_json::Value::Array(_)) => {}
        Some(_) => {
            return Err(FetchError::MalformedResponse(
                "`videos` is not an array".to_string(),
            ))
        }
        None => {
            return Err(FetchError::MalformedResponse(
                "missing `videos` field".to_string(),
            ))
        }
    }

    let wire: WireResponse = serde_json::from_value(value)
        .map_err(|e| FetchError::MalformedResponse(e.to_string()))?;

    let videos = decode_videos(wire.videos);
    let total_count = wire.total_count.unwrap_or(videos.len() as u64);

    Ok(SearchResultPage {
        videos,
        next_cursor: wire.pagination.and_then(|p| p.cursor),
        total_count,
        game_meta: wire.game,
    })
}

fn decode_videos(raw: Vec<serde_json::Value>) -> Vec<VideoRecord> {
    let received = raw.len();
    let videos: Vec<VideoRecord> = raw
        .into_iter()
        .enumerate()
        .filter_map(|(position, value)| match serde_json::from_value(value) {
            Ok(video) => Some(video),
            Err(e) => {
                tracing::warn!("Skipping undecodable video at position {}: {}", position, e);
                None
            }
        })
        .collect();

    if videos.len() < received {
        tracing::debug!("Decoded {}/{} videos", videos.len(), received);
    }
    videos
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_page() {
        let body = serde_json::json!({
            "game_name": "Minecraft",
            "game": {"id": "27471", "name": "Minecraft", "box_art_url": "https://img/{width}x{height}.jpg"},
            "videos": [{
                "id": "1",
                "title": "Build",
                "user_name": "alice",
                "url": "https://example.com/1",
                "view_count": 10,
                "duration": "5m",
                "created_at": "2024-03-01T00:00:00Z",
                "language": "en"
            }],
            "total_count": 120,
            "pagination": {"cursor": "abc"},
            "last_updated": "2024-03-01T00:00:00Z"
        })
        .to_string();

        let page = parse_page(&body).unwrap();
        assert_eq!(page.videos.len(), 1);
        assert_eq!(page.next_cursor.as_deref(), Some("abc"));
        assert_eq!(page.total_count, 120);
        assert_eq!(page.game_meta.unwrap().name, "Minecraft");
    }

    #[test]
    fn test_parse_null_cursor_and_game() {
        let body = r#"{"videos": [], "pagination": {"cursor": null}, "game": null}"#;
        let page = parse_page(body).unwrap();
        assert!(page.videos.is_empty());
        assert!(!page.has_more());
        assert!(page.game_meta.is_none());
        assert_eq!(page.total_count, 0);
    }

    #[test]
    fn test_missing_videos_is_malformed() {
        let err = parse_page(r#"{"pagination": {"cursor": null}}"#).unwrap_err();
        assert!(err.is_malformed());

        let err = parse_page(r#"{"videos": "nope"}"#).unwrap_err();
        assert!(err.is_malformed());

        let err = parse_page("<html>").unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn test_endpoint_joining() {
        let client =
            HttpSearchClient::with_timeout("http://localhost:8000/", "/api/search/", DEFAULT_TIMEOUT)
                .unwrap();
        assert_eq!(client.endpoint(), "http://localhost:8000/api/search/");
    }

    #[test]
    fn test_video_with_both_owner_fields() {
        let body = serde_json::json!({
            "videos": [{
                "id": "1",
                "title": "Duo stream",
                "user_name": "alice",
                "streamer_name": "alice_tv",
                "url": "https://example.com/1",
                "created_at": "2024-03-01T00:00:00Z"
            }],
            "pagination": {"cursor": null}
        })
        .to_string();

        let page = parse_page(&body).unwrap();
        assert_eq!(page.videos.len(), 1);
        assert_eq!(page.videos[0].owner_name, "alice");
    }

    #[test]
    fn test_bad_record_is_skipped_not_fatal() {
        let body = serde_json::json!({
            "videos": [
                {"id": "1", "title": "Fine", "user_name": "a", "url": "u1",
                 "created_at": "2024-03-01T00:00:00Z"},
                {"id": "2", "title": null, "user_name": "b", "url": "u2",
                 "created_at": "2024-03-01T00:00:00Z"},
                "not an object"
            ],
            "pagination": {"cursor": "next"}
        })
        .to_string();

        let page = parse_page(&body).unwrap();
        let ids: Vec<&str> = page.videos.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec!["1"]);
        assert_eq!(page.next_cursor.as_deref(), Some("next"));
        assert_eq!(page.total_count, 1);
    }
}
