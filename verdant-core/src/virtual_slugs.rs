//! Symbolic link targets resolved to concrete slugs at build time.
//!
//! `[[today]]` becomes `log/2024-03-05`, `[[last-week]]` the previous ISO
//! week page, and so on. Generated-list keywords resolve to themselves.

use crate::temporal::{log_slug, week_key};
use chrono::{Datelike, Duration, NaiveDate};

/// Generated-list pages that always exist
pub const RESERVED_SLUGS: [&str; 3] = ["recent", "random", "missing"];

#[derive(Debug, Clone, Copy)]
enum Unit {
    Day,
    Week,
    Month,
    Year,
}

fn keyword(target: &str) -> Option<(Unit, i64)> {
    let lowered = target.to_ascii_lowercase();
    let parsed = match lowered.as_str() {
        "today" => (Unit::Day, 0),
        "yesterday" => (Unit::Day, -1),
        "tomorrow" => (Unit::Day, 1),
        other => {
            let (offset, unit) = other.split_once('-')?;
            let offset = match offset {
                "this" => 0,
                "last" => -1,
                "next" => 1,
                _ => return None,
            };
            let unit = match unit {
                "week" => Unit::Week,
                "month" => Unit::Month,
                "year" => Unit::Year,
                _ => return None,
            };
            (unit, offset)
        }
    };
    Some(parsed)
}

/// Maps relative-date and generated-list keywords to slugs
#[derive(Debug, Clone)]
pub struct VirtualSlugResolver {
    today: NaiveDate,
    log_prefix: String,
}

impl VirtualSlugResolver {
    pub fn new(today: NaiveDate, log_prefix: impl Into<String>) -> Self {
        Self {
            today,
            log_prefix: log_prefix.into(),
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn log_prefix(&self) -> &str {
        &self.log_prefix
    }

    /// Resolve a link target. Keywords match case-insensitively; anything
    /// else is returned unchanged.
    pub fn resolve(&self, target: &str) -> String {
        if let Some(reserved) = RESERVED_SLUGS
            .iter()
            .find(|r| r.eq_ignore_ascii_case(target))
        {
            return (*reserved).to_string();
        }

        let Some((unit, offset)) = keyword(target) else {
            return target.to_string();
        };

        let key = match unit {
            Unit::Day => (self.today + Duration::days(offset))
                .format("%Y-%m-%d")
                .to_string(),
            Unit::Week => week_key(self.today + Duration::days(7 * offset)),
            Unit::Month => {
                let months = self.today.year() as i64 * 12 + self.today.month0() as i64 + offset;
                format!("{:04}-{:02}", months.div_euclid(12), months.rem_euclid(12) + 1)
            }
            Unit::Year => format!("{:04}", self.today.year() as i64 + offset),
        };
        log_slug(&self.log_prefix, &key)
    }

    /// True for slugs inside the log namespace
    pub fn is_log_slug(&self, slug: &str) -> bool {
        slug.strip_prefix(self.log_prefix.as_str())
            .is_some_and(|rest| rest.starts_with('/'))
    }

    pub fn is_reserved(slug: &str) -> bool {
        RESERVED_SLUGS.contains(&slug)
    }

    /// Targets that count as existing without a note behind them
    pub fn is_satisfiable(&self, slug: &str) -> bool {
        Self::is_reserved(slug) || self.is_log_slug(slug)
    }
}
