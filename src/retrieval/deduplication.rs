//! Result deduplication by video ID

use crate::models::VideoRecord;
use ahash::AHashSet;

/// Append `incoming` to `accumulated`, skipping every video whose id is
/// already present (in `accumulated` or earlier in `incoming`).
///
/// # Returns
/// Number of videos actually appended
pub fn merge_unique(accumulated: &mut Vec<VideoRecord>, incoming: Vec<VideoRecord>) -> usize {
    let mut seen: AHashSet<String> = accumulated.iter().map(|v| v.id.clone()).collect();
    let before = accumulated.len();

    accumulated.extend(
        incoming
            .into_iter()
            .filter(|video| seen.insert(video.id.clone())),
    );

    accumulated.len() - before
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(id: &str, title: &str) -> VideoRecord {
        VideoRecord {
            id: id.to_string(),
            title: title.to_string(),
            owner_name: "owner".to_string(),
            url: String::new(),
            view_count: 0,
            duration: "1m".to_string(),
            created_at: "2024-01-01T00:00:00Z".to_string(),
            language: "en".to_string(),
            thumbnail_url: None,
            description: None,
            game_id: None,
            game_name: None,
        }
    }

    #[test]
    fn test_deduplication() {
        let videos = vec![video("1", "first"), video("2", "second"), video("1", "again")];

        let mut deduped = Vec::new();
        assert_eq!(merge_unique(&mut deduped, videos), 2);

        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].id, "1");
        assert_eq!(deduped[0].title, "first"); // keeps first occurrence
    }

    #[test]
    fn test_merge_pages_never_repeats_ids() {
        let mut all = vec![video("1", "a"), video("2", "b")];

        let added = merge_unique(&mut all, vec![video("2", "dup"), video("3", "c"), video("3", "dup")]);
        assert_eq!(added, 1);

        let added = merge_unique(&mut all, vec![video("1", "dup"), video("4", "d")]);
        assert_eq!(added, 1);

        let ids: Vec<&str> = all.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3", "4"]);
    }
}
