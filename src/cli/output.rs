//! Human-readable rendering of search results and events

use crate::models::VideoRecord;
use crate::retrieval::{SearchEvent, SearchOutcome, SearchState};

/// Compact view count: `950`, `1.2k`, `3.4M`
pub fn format_views(views: u64) -> String {
    if views >= 1_000_000 {
        format!("{:.1}M", views as f64 / 1_000_000.0)
    } else if views >= 1_000 {
        format!("{:.1}k", views as f64 / 1_000.0)
    } else {
        views.to_string()
    }
}

/// Clock-style duration: `1:02:03`, or `2:05` under an hour
pub fn format_duration(encoded: &str) -> String {
    let total = crate::duration::parse(encoded);
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

pub fn print_videos(videos: &[VideoRecord]) {
    for (i, video) in videos.iter().enumerate() {
        println!(
            "{:>3}. {} [{}] {} views, {}",
            i + 1,
            video.title,
            format_duration(&video.duration),
            format_views(video.view_count),
            video.owner_name
        );
        println!("     {}  {}  {}", video.created_at, video.language, video.url);
    }
}

/// Footer printed under the result list
pub fn summary(state: &SearchState) -> String {
    let mut line = format!(
        "Showing {} of {} videos for \"{}\"",
        state.visible_videos.len(),
        state.all_videos.len(),
        state.query
    );
    if let Some(game) = &state.game_meta {
        line.push_str(&format!(" ({})", game.name));
    }
    if state.has_more {
        line.push_str(", more available");
    }
    line
}

/// One-line status for an outcome
pub fn describe_outcome(outcome: &SearchOutcome) -> String {
    match outcome {
        SearchOutcome::Idle => "Enter a game name to search".to_string(),
        SearchOutcome::CacheHit { video_count } => {
            format!("✓ {} videos (cached)", video_count)
        }
        SearchOutcome::Loaded { video_count, .. } => format!("✓ {} videos", video_count),
        SearchOutcome::Recovered { query, video_count } => {
            format!("✓ {} videos found for \"{}\" instead", video_count, query)
        }
        SearchOutcome::Empty => "No videos found".to_string(),
        SearchOutcome::EndOfResults => "No more videos".to_string(),
        SearchOutcome::Failed { error } => format!("✗ Search failed: {}", error),
        SearchOutcome::Superseded => "Search was replaced by a newer one".to_string(),
        SearchOutcome::Skipped => "Nothing more to load".to_string(),
    }
}

/// Progress line for an event, `None` for events the summary already covers
pub fn describe_event(event: &SearchEvent) -> Option<String> {
    match event {
        SearchEvent::RetryAttempted {
            attempt,
            max_attempts,
            error,
            ..
        } => Some(format!(
            "  retrying ({}/{}) after: {}",
            attempt, max_attempts, error
        )),
        SearchEvent::FallbackAttempted {
            original,
            candidate,
            ..
        } => Some(format!(
            "  no results for \"{}\", trying \"{}\"",
            original, candidate
        )),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_views() {
        assert_eq!(format_views(0), "0");
        assert_eq!(format_views(999), "999");
        assert_eq!(format_views(1_000), "1.0k");
        assert_eq!(format_views(1_240), "1.2k");
        assert_eq!(format_views(3_400_000), "3.4M");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration("1h2m3s"), "1:02:03");
        assert_eq!(format_duration("2m5s"), "2:05");
        assert_eq!(format_duration("45s"), "0:45");
        assert_eq!(format_duration("garbage"), "0:00");
    }

    #[test]
    fn test_describe_event() {
        let event = SearchEvent::FallbackAttempted {
            original: "Xyzzy123!!".to_string(),
            candidate: "xyzzy123".to_string(),
            strategy: "strip_non_alphanumeric".to_string(),
            position: 3,
        };
        assert_eq!(
            describe_event(&event).as_deref(),
            Some("  no results for \"Xyzzy123!!\", trying \"xyzzy123\"")
        );
        assert!(describe_event(&SearchEvent::EmptyQuery).is_none());
    }
}
