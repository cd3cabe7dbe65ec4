// Client-side filter and sort view over accumulated search results
//
// Predicates are conjunctive; sorting is stable and descending on every key.

mod types;

pub use types::{
    DateFilter, DurationFilter, FilterChange, FilterSet, LanguageFilter, SortKey, ViewsFilter,
};

use crate::models::VideoRecord;
use chrono::{DateTime, Duration, Months, Utc};
use std::cmp::Reverse;

/// Upper bound of the `short` bucket in seconds
pub const SHORT_MAX_SECS: u64 = 15 * 60;
/// Upper bound of the `medium` bucket in seconds
pub const MEDIUM_MAX_SECS: u64 = 60 * 60;

/// Filter then sort `videos`.
///
/// Pure: the result depends only on the arguments, and applying the same
/// settings to an already processed list returns it unchanged.
pub fn apply(
    videos: &[VideoRecord],
    filters: &FilterSet,
    sort: SortKey,
    now: DateTime<Utc>,
) -> Vec<VideoRecord> {
    let cutoff = date_cutoff(filters.date, now);

    let mut visible: Vec<VideoRecord> = videos
        .iter()
        .filter(|video| matches_date(video, cutoff))
        .filter(|video| matches_duration(video, filters.duration))
        .filter(|video| matches_views(video, filters.views))
        .filter(|video| matches_language(video, &filters.language))
        .cloned()
        .collect();

    // sort_by_key is stable, equal keys keep their input order
    match sort {
        SortKey::Date => visible.sort_by_key(|video| Reverse(video.created_at_utc())),
        SortKey::Views => visible.sort_by_key(|video| Reverse(video.view_count)),
        SortKey::Duration => visible.sort_by_key(|video| Reverse(video.duration_secs())),
    }

    visible
}

/// Earliest creation time admitted by a date filter
fn date_cutoff(filter: DateFilter, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    match filter {
        DateFilter::All => None,
        DateFilter::Today => Some(now - Duration::hours(24)),
        DateFilter::ThisWeek => Some(now - Duration::days(7)),
        DateFilter::ThisMonth => Some(
            now.checked_sub_months(Months::new(1))
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
        ),
    }
}

fn matches_date(video: &VideoRecord, cutoff: Option<DateTime<Utc>>) -> bool {
    match cutoff {
        None => true,
        Some(cutoff) => video
            .created_at_utc()
            .is_some_and(|created| created >= cutoff),
    }
}

fn matches_duration(video: &VideoRecord, filter: DurationFilter) -> bool {
    let secs = video.duration_secs();
    match filter {
        DurationFilter::All => true,
        DurationFilter::Short => secs <= SHORT_MAX_SECS,
        DurationFilter::Medium => secs > SHORT_MAX_SECS && secs <= MEDIUM_MAX_SECS,
        DurationFilter::Long => secs > MEDIUM_MAX_SECS,
    }
}

fn matches_views(video: &VideoRecord, filter: ViewsFilter) -> bool {
    let views = video.view_count;
    match filter {
        ViewsFilter::All => true,
        ViewsFilter::Less100 => views < 100,
        ViewsFilter::From100To1000 => (100..1000).contains(&views),
        ViewsFilter::More1000 => views >= 1000,
    }
}

fn matches_language(video: &VideoRecord, filter: &LanguageFilter) -> bool {
    match filter {
        LanguageFilter::All => true,
        LanguageFilter::Code(code) => video.language == *code,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap()
    }

    fn video(id: &str, age: Duration, duration: &str, views: u64, lang: &str) -> VideoRecord {
        VideoRecord {
            id: id.to_string(),
            title: format!("Video {id}"),
            owner_name: "owner".to_string(),
            url: format!("https://example.com/{id}"),
            view_count: views,
            duration: duration.to_string(),
            created_at: (now() - age).to_rfc3339(),
            language: lang.to_string(),
            thumbnail_url: None,
            description: None,
            game_id: None,
            game_name: None,
        }
    }

    fn sample() -> Vec<VideoRecord> {
        vec![
            video("a", Duration::hours(2), "10m", 50, "en"),
            video("b", Duration::days(3), "30m", 500, "fr"),
            video("c", Duration::days(20), "2h", 5000, "en"),
            video("d", Duration::days(60), "15m", 100, "de"),
        ]
    }

    fn ids(videos: &[VideoRecord]) -> Vec<&str> {
        videos.iter().map(|v| v.id.as_str()).collect()
    }

    #[test]
    fn test_unfiltered_keeps_membership() {
        let videos = sample();
        let out = apply(&videos, &FilterSet::default(), SortKey::Date, now());
        assert_eq!(ids(&out), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_date_windows() {
        let videos = sample();
        let mut filters = FilterSet::default();

        filters.date = DateFilter::Today;
        assert_eq!(ids(&apply(&videos, &filters, SortKey::Date, now())), vec!["a"]);

        filters.date = DateFilter::ThisWeek;
        assert_eq!(
            ids(&apply(&videos, &filters, SortKey::Date, now())),
            vec!["a", "b"]
        );

        filters.date = DateFilter::ThisMonth;
        assert_eq!(
            ids(&apply(&videos, &filters, SortKey::Date, now())),
            vec!["a", "b", "c"]
        );
    }

    #[test]
    fn test_unparseable_date_fails_date_filter() {
        let mut broken = video("x", Duration::zero(), "1m", 1, "en");
        broken.created_at = "yesterday".to_string();
        let filters = FilterSet {
            date: DateFilter::ThisMonth,
            ..FilterSet::default()
        };
        assert!(apply(&[broken.clone()], &filters, SortKey::Date, now()).is_empty());
        assert_eq!(
            apply(&[broken], &FilterSet::default(), SortKey::Date, now()).len(),
            1
        );
    }

    #[test]
    fn test_duration_buckets() {
        let videos = sample();
        let with = |duration| FilterSet {
            duration,
            ..FilterSet::default()
        };

        // 15m sits exactly on the short boundary
        assert_eq!(
            ids(&apply(&videos, &with(DurationFilter::Short), SortKey::Date, now())),
            vec!["a", "d"]
        );
        assert_eq!(
            ids(&apply(&videos, &with(DurationFilter::Medium), SortKey::Date, now())),
            vec!["b"]
        );
        assert_eq!(
            ids(&apply(&videos, &with(DurationFilter::Long), SortKey::Date, now())),
            vec!["c"]
        );
    }

    #[test]
    fn test_view_buckets() {
        let videos = sample();
        let with = |views| FilterSet {
            views,
            ..FilterSet::default()
        };

        assert_eq!(
            ids(&apply(&videos, &with(ViewsFilter::Less100), SortKey::Date, now())),
            vec!["a"]
        );
        assert_eq!(
            ids(&apply(&videos, &with(ViewsFilter::From100To1000), SortKey::Date, now())),
            vec!["b", "d"]
        );
        assert_eq!(
            ids(&apply(&videos, &with(ViewsFilter::More1000), SortKey::Date, now())),
            vec!["c"]
        );
    }

    #[test]
    fn test_filters_are_conjunctive() {
        let videos = sample();
        let filters = FilterSet {
            date: DateFilter::ThisMonth,
            duration: DurationFilter::All,
            views: ViewsFilter::All,
            language: LanguageFilter::Code("en".to_string()),
        };
        let out = apply(&videos, &filters, SortKey::Views, now());
        assert_eq!(ids(&out), vec!["c", "a"]);
        assert!(out.iter().all(|v| videos.contains(v)));
    }

    #[test]
    fn test_sort_keys() {
        let videos = sample();
        let all = FilterSet::default();
        assert_eq!(
            ids(&apply(&videos, &all, SortKey::Views, now())),
            vec!["c", "b", "d", "a"]
        );
        assert_eq!(
            ids(&apply(&videos, &all, SortKey::Duration, now())),
            vec!["c", "b", "d", "a"]
        );
    }

    #[test]
    fn test_sort_is_stable() {
        let videos = vec![
            video("first", Duration::hours(1), "10m", 7, "en"),
            video("second", Duration::hours(5), "10m", 7, "en"),
            video("third", Duration::hours(3), "10m", 7, "en"),
        ];
        let out = apply(&videos, &FilterSet::default(), SortKey::Views, now());
        assert_eq!(ids(&out), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_idempotent() {
        let videos = sample();
        let filters = FilterSet {
            views: ViewsFilter::More1000,
            ..FilterSet::default()
        };
        let once = apply(&videos, &filters, SortKey::Duration, now());
        let twice = apply(&once, &filters, SortKey::Duration, now());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_filter_change() {
        let filters = FilterSet::default().with_change(FilterChange::Date(DateFilter::Today));
        assert_eq!(filters.date, DateFilter::Today);
        assert_eq!(filters.views, ViewsFilter::All);
        assert!(!filters.is_unfiltered());
    }

    #[test]
    fn test_filter_serde_names() {
        let filters = FilterSet {
            date: DateFilter::ThisWeek,
            duration: DurationFilter::Long,
            views: ViewsFilter::From100To1000,
            language: LanguageFilter::Code("fr".to_string()),
        };
        let json = serde_json::to_value(&filters).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "date": "this_week",
                "duration": "long",
                "views": "100_1000",
                "language": "fr"
            })
        );
        assert_eq!("more_1000".parse::<ViewsFilter>(), Ok(ViewsFilter::More1000));
        assert!("sometimes".parse::<SortKey>().is_err());
    }
}
