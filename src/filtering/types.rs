// Filter and sort settings for the result view
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Upload date window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateFilter {
    #[default]
    All,
    Today,
    ThisWeek,
    ThisMonth,
}

/// Duration bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationFilter {
    #[default]
    All,
    /// Up to 15 minutes
    Short,
    /// Over 15 minutes, up to an hour
    Medium,
    /// Over an hour
    Long,
}

/// View count bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ViewsFilter {
    #[default]
    #[serde(rename = "all")]
    All,
    #[serde(rename = "less_100")]
    Less100,
    #[serde(rename = "100_1000")]
    From100To1000,
    #[serde(rename = "more_1000")]
    More1000,
}

/// Language restriction
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LanguageFilter {
    #[default]
    All,
    Code(String),
}

impl From<String> for LanguageFilter {
    fn from(value: String) -> Self {
        if value.is_empty() || value == "all" {
            LanguageFilter::All
        } else {
            LanguageFilter::Code(value)
        }
    }
}

impl From<LanguageFilter> for String {
    fn from(value: LanguageFilter) -> Self {
        match value {
            LanguageFilter::All => "all".to_string(),
            LanguageFilter::Code(code) => code,
        }
    }
}

/// Complete filter selection. Every field is always set; `Default` is all-`all`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FilterSet {
    pub date: DateFilter,
    pub duration: DurationFilter,
    pub views: ViewsFilter,
    pub language: LanguageFilter,
}

impl FilterSet {
    /// Return a copy with one field replaced
    pub fn with_change(&self, change: FilterChange) -> Self {
        let mut next = self.clone();
        match change {
            FilterChange::Date(value) => next.date = value,
            FilterChange::Duration(value) => next.duration = value,
            FilterChange::Views(value) => next.views = value,
            FilterChange::Language(value) => next.language = value,
        }
        next
    }

    pub fn is_unfiltered(&self) -> bool {
        *self == FilterSet::default()
    }
}

/// A single control change coming from the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FilterChange {
    Date(DateFilter),
    Duration(DurationFilter),
    Views(ViewsFilter),
    Language(LanguageFilter),
}

/// Sort order for the view; every key sorts descending
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Date,
    Views,
    Duration,
}

fn unknown(kind: &str, value: &str, expected: &[&str]) -> String {
    format!("unknown {kind} '{value}', expected one of {expected:?}")
}

impl FromStr for DateFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "today" => Ok(Self::Today),
            "this_week" => Ok(Self::ThisWeek),
            "this_month" => Ok(Self::ThisMonth),
            other => Err(unknown(
                "date filter",
                other,
                &["all", "today", "this_week", "this_month"],
            )),
        }
    }
}

impl FromStr for DurationFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "short" => Ok(Self::Short),
            "medium" => Ok(Self::Medium),
            "long" => Ok(Self::Long),
            other => Err(unknown(
                "duration filter",
                other,
                &["all", "short", "medium", "long"],
            )),
        }
    }
}

impl FromStr for ViewsFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "less_100" => Ok(Self::Less100),
            "100_1000" => Ok(Self::From100To1000),
            "more_1000" => Ok(Self::More1000),
            other => Err(unknown(
                "views filter",
                other,
                &["all", "less_100", "100_1000", "more_1000"],
            )),
        }
    }
}

impl FromStr for LanguageFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.chars().any(char::is_whitespace) {
            return Err(format!("language code '{s}' must not contain whitespace"));
        }
        Ok(LanguageFilter::from(s.to_string()))
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "date" => Ok(Self::Date),
            "views" => Ok(Self::Views),
            "duration" => Ok(Self::Duration),
            other => Err(unknown("sort key", other, &["date", "views", "duration"])),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SortKey::Date => "date",
            SortKey::Views => "views",
            SortKey::Duration => "duration",
        };
        f.write_str(name)
    }
}
