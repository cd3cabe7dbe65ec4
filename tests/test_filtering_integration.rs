// Integration test for the filter/sort view with realistic backend data
use chrono::TimeZone;
use vodseek::client::parse_page;
use vodseek::filtering::{
    apply, DateFilter, DurationFilter, FilterSet, LanguageFilter, SortKey, ViewsFilter,
};
use vodseek::models::VideoRecord;

fn now() -> chrono::DateTime<chrono::Utc> {
    chrono::Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
}

fn catalog() -> Vec<VideoRecord> {
    let body = r#"{
        "videos": [
            {"id": "1", "title": "Any% world record", "user_name": "runner", "url": "u1",
             "view_count": 25000, "duration": "14m59s", "created_at": "2024-06-15T08:00:00Z", "language": "en"},
            {"id": "2", "title": "Hardcore day 100", "user_name": "builder", "url": "u2",
             "view_count": 850, "duration": "1h5m", "created_at": "2024-06-12T08:00:00Z", "language": "en"},
            {"id": "3", "title": "Redstone tutoriel", "user_name": "ingenieur", "url": "u3",
             "view_count": 40, "duration": "32m10s", "created_at": "2024-05-20T08:00:00Z", "language": "fr"},
            {"id": "4", "title": "Stream highlights", "user_name": "streamer", "url": "u4",
             "view_count": 850, "duration": "15m1s", "created_at": "2024-06-14T20:00:00Z", "language": "en"},
            {"id": "5", "title": "Old upload", "user_name": "archive", "url": "u5",
             "view_count": 5, "duration": "", "created_at": "yesterday-ish", "language": "de"},
            {"id": "6", "title": "Speedrun commentary", "user_name": "runner", "url": "u6",
             "view_count": 1000, "duration": "2h", "created_at": "2024-04-01T00:00:00Z", "language": "en"}
        ],
        "pagination": {"cursor": "page-2"},
        "total_count": 240,
        "game": {"id": "27471", "name": "Minecraft", "box_art_url": null},
        "last_updated": "2024-06-15T11:59:00Z"
    }"#;

    parse_page(body).unwrap().videos
}

fn ids(videos: &[VideoRecord]) -> Vec<&str> {
    videos.iter().map(|v| v.id.as_str()).collect()
}

#[test]
fn test_every_filter_combination_is_a_subset() {
    let videos = catalog();
    let all_ids: Vec<&str> = ids(&videos);

    let dates = [
        DateFilter::All,
        DateFilter::Today,
        DateFilter::ThisWeek,
        DateFilter::ThisMonth,
    ];
    let durations = [
        DurationFilter::All,
        DurationFilter::Short,
        DurationFilter::Medium,
        DurationFilter::Long,
    ];
    let views = [
        ViewsFilter::All,
        ViewsFilter::Less100,
        ViewsFilter::From100To1000,
        ViewsFilter::More1000,
    ];
    let languages = [LanguageFilter::All, LanguageFilter::Code("en".to_string())];

    for date in dates {
        for duration in durations {
            for view in views {
                for language in &languages {
                    let filters = FilterSet {
                        date,
                        duration,
                        views: view,
                        language: language.clone(),
                    };
                    for sort in [SortKey::Date, SortKey::Views, SortKey::Duration] {
                        let visible = apply(&videos, &filters, sort, now());
                        assert!(
                            ids(&visible).iter().all(|id| all_ids.contains(id)),
                            "{:?} / {} produced unknown ids",
                            filters,
                            sort
                        );
                        assert_eq!(apply(&visible, &filters, sort, now()), visible);
                    }
                }
            }
        }
    }
}

#[test]
fn test_settings_from_presentation_layer() {
    let videos = catalog();

    let filters: FilterSet = serde_json::from_str(
        r#"{"date": "this_week", "duration": "all", "views": "100_1000", "language": "en"}"#,
    )
    .unwrap();

    let visible = apply(&videos, &filters, SortKey::Views, now());
    // equal view counts keep backend order
    assert_eq!(ids(&visible), vec!["2", "4"]);
}

#[test]
fn test_default_view_sorts_newest_first() {
    let videos = catalog();
    let visible = apply(&videos, &FilterSet::default(), SortKey::Date, now());

    assert_eq!(visible.len(), videos.len());
    // unparseable dates sort last
    assert_eq!(ids(&visible), vec!["1", "4", "2", "3", "6", "5"]);
}

#[test]
fn test_duration_buckets_on_boundaries() {
    let videos = catalog();

    let short = FilterSet {
        duration: DurationFilter::Short,
        ..FilterSet::default()
    };
    // "" decodes to zero seconds and counts as short
    assert_eq!(ids(&apply(&videos, &short, SortKey::Date, now())), vec!["1", "5"]);

    let long = FilterSet {
        duration: DurationFilter::Long,
        ..FilterSet::default()
    };
    assert_eq!(ids(&apply(&videos, &long, SortKey::Duration, now())), vec!["6", "2"]);
}
