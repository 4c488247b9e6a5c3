//! Temporal indexing: ISO weeks, period keys, and the created/updated log.
//!
//! Every dated note lands in four buckets (day, ISO week, month, year).
//! Period keys look like `2024-03-05`, `2024-w10`, `2024-03`, and `2024`.

use crate::models::{ChildPeriod, Note, NoteRef, PeriodLink};
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

static DATE_REGEX: OnceLock<Regex> = OnceLock::new();
static MONTH_REGEX: OnceLock<Regex> = OnceLock::new();
static WEEK_REGEX: OnceLock<Regex> = OnceLock::new();
static YEAR_REGEX: OnceLock<Regex> = OnceLock::new();

fn date_regex() -> &'static Regex {
    DATE_REGEX.get_or_init(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").unwrap())
}

fn month_regex() -> &'static Regex {
    MONTH_REGEX.get_or_init(|| Regex::new(r"^([0-9]{4})-(0[1-9]|1[0-2])$").unwrap())
}

fn week_regex() -> &'static Regex {
    WEEK_REGEX.get_or_init(|| Regex::new(r"^([0-9]{4})-w([0-9]{2})$").unwrap())
}

fn year_regex() -> &'static Regex {
    YEAR_REGEX.get_or_init(|| Regex::new(r"^[0-9]{4}$").unwrap())
}

/// Granularity of a log page
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogPeriod {
    Day,
    Week,
    Month,
    Year,
}

impl LogPeriod {
    pub fn label(&self) -> &'static str {
        match self {
            LogPeriod::Day => "Day",
            LogPeriod::Week => "Week",
            LogPeriod::Month => "Month",
            LogPeriod::Year => "Year",
        }
    }
}

/// Period keys derived from one calendar date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateInfo {
    /// YYYY-MM-DD
    pub date: String,
    /// YYYY
    pub year: String,
    /// YYYY-MM
    pub month: String,
    /// YYYY-wWW
    pub week: String,
}

impl DateInfo {
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            date: date.format("%Y-%m-%d").to_string(),
            year: format!("{:04}", date.year()),
            month: format!("{:04}-{:02}", date.year(), date.month()),
            week: week_key(date),
        }
    }

    /// All four period keys, finest first
    pub fn keys(&self) -> [&str; 4] {
        [&self.date, &self.week, &self.month, &self.year]
    }
}

/// Parse a strict `YYYY-MM-DD` string into a calendar date
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    if !date_regex().is_match(s) {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Period keys for a date string, or `None` when it is not a strict date
pub fn date_info(s: &str) -> Option<DateInfo> {
    parse_date(s).map(DateInfo::from_date)
}

/// ISO-8601 week-numbering year and week of `date`.
///
/// The week is located through its Thursday (Monday = 1 .. Sunday = 7):
/// week 1 is the week holding the year's first Thursday.
pub fn iso_week(date: NaiveDate) -> (i32, u32) {
    let dow = date.weekday().number_from_monday() as i64;
    let thursday = date + Duration::days(4 - dow);
    let days_since_jan1 = thursday.ordinal0();
    let week = (days_since_jan1 + 1).div_ceil(7);
    (thursday.year(), week)
}

/// `YYYY-wWW` key of the ISO week containing `date`
pub fn week_key(date: NaiveDate) -> String {
    let (year, week) = iso_week(date);
    format!("{:04}-w{:02}", year, week)
}

/// Linear week-number-to-month estimate used for week page navigation.
///
/// This is not a calendar lookup: weeks near a month edge may map to the
/// neighbouring month.
pub fn approx_month_for_week(week: u32) -> u32 {
    (week.saturating_sub(1) * 12 / 52 + 1).min(12)
}

/// Monday of an ISO week, found by walking back from Jan 4 + 7·(w−1)
fn week_start(year: i32, week: u32) -> Option<NaiveDate> {
    let jan4 = NaiveDate::from_ymd_opt(year, 1, 4)?;
    let mut day = jan4 + Duration::days(7 * (week as i64 - 1));
    while day.weekday() != Weekday::Mon {
        day = day.pred_opt()?;
    }
    Some(day)
}

/// A period key broken into its navigational parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodInfo {
    pub period: LogPeriod,
    pub key: String,
    pub year: String,
    pub month: Option<String>,
    pub week: Option<String>,
    pub day: Option<String>,
}

impl PeriodInfo {
    /// Interpret a period key; `None` when it matches no granularity
    pub fn parse(key: &str) -> Option<Self> {
        if let Some(date) = parse_date(key) {
            let info = DateInfo::from_date(date);
            return Some(Self {
                period: LogPeriod::Day,
                key: key.to_string(),
                year: info.year,
                month: Some(info.month),
                week: Some(info.week),
                day: Some(info.date),
            });
        }
        if let Some(caps) = week_regex().captures(key) {
            let week: u32 = caps[2].parse().ok()?;
            // Week 53 exists only in long ISO years
            NaiveDate::from_isoywd_opt(caps[1].parse().ok()?, week, Weekday::Mon)?;
            let year = caps[1].to_string();
            return Some(Self {
                period: LogPeriod::Week,
                key: key.to_string(),
                month: Some(format!("{}-{:02}", year, approx_month_for_week(week))),
                year,
                week: Some(key.to_string()),
                day: None,
            });
        }
        if let Some(caps) = month_regex().captures(key) {
            return Some(Self {
                period: LogPeriod::Month,
                key: key.to_string(),
                year: caps[1].to_string(),
                month: Some(key.to_string()),
                week: None,
                day: None,
            });
        }
        if year_regex().is_match(key) {
            return Some(Self {
                period: LogPeriod::Year,
                key: key.to_string(),
                year: key.to_string(),
                month: None,
                week: None,
                day: None,
            });
        }
        None
    }

    pub fn title(&self) -> String {
        period_title(self.period, &self.key)
    }

    /// Enclosing periods, finest first
    pub fn parents(&self, log_prefix: &str) -> Vec<PeriodLink> {
        let mut keys: Vec<(LogPeriod, &str)> = Vec::new();
        if self.period == LogPeriod::Day {
            if let Some(week) = &self.week {
                keys.push((LogPeriod::Week, week));
            }
        }
        if matches!(self.period, LogPeriod::Day | LogPeriod::Week) {
            if let Some(month) = &self.month {
                keys.push((LogPeriod::Month, month));
            }
        }
        if self.period != LogPeriod::Year {
            keys.push((LogPeriod::Year, &self.year));
        }
        keys.into_iter()
            .map(|(period, key)| PeriodLink {
                slug: log_slug(log_prefix, key),
                title: period_title(period, key),
            })
            .collect()
    }
}

/// Human-readable title for a period key
pub fn period_title(period: LogPeriod, key: &str) -> String {
    match period {
        LogPeriod::Day | LogPeriod::Year => key.to_string(),
        LogPeriod::Week => match key.split_once("-w") {
            Some((year, week)) => format!("Week {} of {}", week, year),
            None => key.to_string(),
        },
        LogPeriod::Month => {
            let name = key
                .split_once('-')
                .and_then(|(_, m)| m.parse::<usize>().ok())
                .and_then(|m| MONTH_NAMES.get(m.wrapping_sub(1)));
            match (name, key.split_once('-')) {
                (Some(name), Some((year, _))) => format!("{} {}", name, year),
                _ => key.to_string(),
            }
        }
    }
}

/// Slug of the log page for `key`
pub fn log_slug(log_prefix: &str, key: &str) -> String {
    format!("{}/{}", log_prefix, key)
}

/// Notes created and updated per period
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogIndex {
    pub created: BTreeMap<String, Vec<NoteRef>>,
    pub updated: BTreeMap<String, Vec<NoteRef>>,
    /// Every period key with any activity
    pub periods: BTreeSet<String>,
}

impl LogIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index the created/updated dates of `notes`.
    ///
    /// An updated date equal to the created date is not counted twice.
    pub fn build<'a>(notes: impl IntoIterator<Item = &'a Note>) -> Self {
        let mut index = Self::new();
        for note in notes {
            let created = note.metadata.created();
            let note_ref = NoteRef {
                slug: note.slug.clone(),
                title: note.title(),
            };

            if let Some(info) = created.and_then(date_info) {
                index.record(true, &info, &note_ref);
            }

            if let Some(updated) = note.metadata.updated() {
                if Some(updated) != created {
                    if let Some(info) = date_info(updated) {
                        index.record(false, &info, &note_ref);
                    }
                }
            }
        }
        index
    }

    fn record(&mut self, created: bool, info: &DateInfo, note_ref: &NoteRef) {
        let map = if created {
            &mut self.created
        } else {
            &mut self.updated
        };
        for key in info.keys() {
            map.entry(key.to_string()).or_default().push(note_ref.clone());
            self.periods.insert(key.to_string());
        }
    }

    pub fn created_in(&self, key: &str) -> &[NoteRef] {
        self.created.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn updated_in(&self, key: &str) -> &[NoteRef] {
        self.updated.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Created plus updated entries for a period
    pub fn activity(&self, key: &str) -> usize {
        self.created_in(key).len() + self.updated_in(key).len()
    }

    /// Active sub-periods: months of a year, days of a month, days of a week
    pub fn children(&self, info: &PeriodInfo, log_prefix: &str) -> Vec<ChildPeriod> {
        let candidates: Vec<(LogPeriod, String)> = match info.period {
            LogPeriod::Year => (1..=12)
                .map(|m| (LogPeriod::Month, format!("{}-{:02}", info.year, m)))
                .collect(),
            LogPeriod::Month => month_days(&info.key)
                .into_iter()
                .map(|d| (LogPeriod::Day, d.format("%Y-%m-%d").to_string()))
                .collect(),
            LogPeriod::Week => week_days(&info.key)
                .into_iter()
                .map(|d| (LogPeriod::Day, d.format("%Y-%m-%d").to_string()))
                .collect(),
            LogPeriod::Day => Vec::new(),
        };

        candidates
            .into_iter()
            .filter_map(|(period, key)| {
                let count = self.activity(&key);
                (count > 0).then(|| ChildPeriod {
                    slug: log_slug(log_prefix, &key),
                    title: period_title(period, &key),
                    count,
                })
            })
            .collect()
    }
}

fn month_days(key: &str) -> Vec<NaiveDate> {
    let Some(caps) = month_regex().captures(key) else {
        return Vec::new();
    };
    let (Ok(year), Ok(month)) = (caps[1].parse::<i32>(), caps[2].parse::<u32>()) else {
        return Vec::new();
    };
    (1..=31)
        .filter_map(|day| NaiveDate::from_ymd_opt(year, month, day))
        .collect()
}

fn week_days(key: &str) -> Vec<NaiveDate> {
    let Some(caps) = week_regex().captures(key) else {
        return Vec::new();
    };
    let (Ok(year), Ok(week)) = (caps[1].parse::<i32>(), caps[2].parse::<u32>()) else {
        return Vec::new();
    };
    let Some(start) = week_start(year, week) else {
        return Vec::new();
    };
    (0..7).map(|offset| start + Duration::days(offset)).collect()
}
