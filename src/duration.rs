//! Duration strings in the `1h23m45s` form used by video records and config

use regex::Regex;
use std::sync::OnceLock;

fn pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?:(\d+)h)?(?:(\d+)m)?(?:(\d+)s)?$").expect("duration pattern compiles")
    })
}

/// Parse a duration string into seconds.
///
/// Each of the `h`, `m` and `s` groups is optional but they must appear in
/// that order. Anything that does not match, including values that overflow,
/// decodes to `0`.
pub fn parse(text: &str) -> u64 {
    try_parse(text.trim()).unwrap_or(0)
}

/// Whether `text` is a non-empty, well-formed duration string
pub fn is_valid(text: &str) -> bool {
    let text = text.trim();
    !text.is_empty() && try_parse(text).is_some()
}

/// Convert a well-formed duration string into a [`std::time::Duration`]
pub fn to_std(text: &str) -> Option<std::time::Duration> {
    if !is_valid(text) {
        return None;
    }
    try_parse(text.trim()).map(std::time::Duration::from_secs)
}

fn try_parse(text: &str) -> Option<u64> {
    let caps = pattern().captures(text)?;

    let group = |idx: usize| -> Option<u64> {
        match caps.get(idx) {
            Some(m) => m.as_str().parse::<u64>().ok(),
            None => Some(0),
        }
    };

    let hours = group(1)?;
    let minutes = group(2)?;
    let seconds = group(3)?;

    hours
        .checked_mul(3600)?
        .checked_add(minutes.checked_mul(60)?)?
        .checked_add(seconds)
}
