// SPDX-FileCopyrightText: 2026 Kompas Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Calendar windows and bucket keys.
//!
//! A [`Window`] covers whole calendar days, first and last day inclusive.
//! Ledger queries translate it to the half-open instant range
//! `[first_day 00:00:00, last_day + 1 00:00:00)`, which includes every
//! instant of the last day (`23:59:59.999` included) and nothing after it.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, Months, NaiveDate, NaiveDateTime, NaiveTime};
use kompas_core::KompasError;
use serde::{Deserialize, Serialize};

/// Format of the instant bounds handed to SQLite's `datetime()` comparison.
pub const SQL_INSTANT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// An inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Window {
    first_day: NaiveDate,
    last_day: NaiveDate,
}

impl Window {
    /// Build a window; the bounds are swapped if given in reverse.
    pub fn days(first_day: NaiveDate, last_day: NaiveDate) -> Self {
        if first_day <= last_day {
            Self { first_day, last_day }
        } else {
            Self {
                first_day: last_day,
                last_day: first_day,
            }
        }
    }

    /// The `count` days ending with `today`, today included.
    pub fn trailing_days(today: NaiveDate, count: u32) -> Self {
        let back = u64::from(count.max(1) - 1);
        let first = today.checked_sub_days(Days::new(back)).unwrap_or(NaiveDate::MIN);
        Self::days(first, today)
    }

    /// The `count` ISO weeks ending with the week containing `today`.
    pub fn trailing_weeks(today: NaiveDate, count: u32) -> Self {
        let monday = week_start(today);
        let back = u64::from(count.max(1) - 1) * 7;
        let first = monday.checked_sub_days(Days::new(back)).unwrap_or(NaiveDate::MIN);
        let last = monday.checked_add_days(Days::new(6)).unwrap_or(NaiveDate::MAX);
        Self::days(first, last)
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first_day
    }

    pub fn last_day(&self) -> NaiveDate {
        self.last_day
    }

    /// First instant inside the window.
    pub fn start(&self) -> NaiveDateTime {
        self.first_day.and_time(NaiveTime::MIN)
    }

    /// First instant after the window.
    pub fn end_exclusive(&self) -> NaiveDateTime {
        self.last_day
            .succ_opt()
            .map(|d| d.and_time(NaiveTime::MIN))
            .unwrap_or(NaiveDateTime::MAX)
    }

    pub fn contains(&self, instant: NaiveDateTime) -> bool {
        instant >= self.start() && instant < self.end_exclusive()
    }

    /// `(start, end_exclusive)` formatted for SQL binding.
    pub fn sql_bounds(&self) -> (String, String) {
        (
            self.start().format(SQL_INSTANT_FORMAT).to_string(),
            self.end_exclusive().format(SQL_INSTANT_FORMAT).to_string(),
        )
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.first_day, self.last_day)
    }
}

/// A calendar month, the unit of budget evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthPeriod {
    year: i32,
    month: u32,
}

impl MonthPeriod {
    pub fn new(year: i32, month: u32) -> Result<Self, KompasError> {
        if !(1..=12).contains(&month) {
            return Err(KompasError::Config(format!(
                "month must be between 1 and 12, got {month}"
            )));
        }
        if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(KompasError::Config(format!("year {year} is out of range")));
        }
        Ok(Self { year, month })
    }

    /// The month `date` falls in.
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// One day before the first day of the following month.
    ///
    /// December rolls over to January of `year + 1`.
    pub fn last_day(&self) -> NaiveDate {
        let (year, month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(year, month, 1)
            .and_then(|next| next.pred_opt())
            .unwrap_or(NaiveDate::MAX)
    }

    pub fn window(&self) -> Window {
        Window::days(self.first_day(), self.last_day())
    }

    /// The month before this one.
    pub fn previous(&self) -> Self {
        self.first_day()
            .checked_sub_months(Months::new(1))
            .map(Self::containing)
            .unwrap_or(*self)
    }

    /// The `count` months ending with this one, oldest first.
    pub fn trailing(&self, count: u32) -> Vec<MonthPeriod> {
        let mut months = Vec::with_capacity(count as usize);
        let mut current = *self;
        for _ in 0..count.max(1) {
            months.push(current);
            current = current.previous();
        }
        months.reverse();
        months
    }

    /// `YYYY-MM`, the month bucket key.
    pub fn label(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }
}

impl fmt::Display for MonthPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl FromStr for MonthPeriod {
    type Err = KompasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || KompasError::Config(format!("expected a month as YYYY-MM, got `{s}`"));
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let month = month.parse::<u32>().map_err(|_| invalid())?;
        Self::new(year, month)
    }
}

impl TryFrom<String> for MonthPeriod {
    type Error = KompasError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MonthPeriod> for String {
    fn from(value: MonthPeriod) -> Self {
        value.label()
    }
}

/// Monday of the ISO week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let offset = u64::from(date.weekday().num_days_from_monday());
    date.checked_sub_days(Days::new(offset)).unwrap_or(NaiveDate::MIN)
}

/// ISO year-week bucket key, e.g. `2026-W07`.
///
/// Uses the ISO week-numbering year, so 2027-01-01 (a Friday) is `2026-W53`.
pub fn week_key(date: NaiveDate) -> String {
    let week = date.iso_week();
    format!("{:04}-W{:02}", week.year(), week.week())
}

/// Calendar day bucket key, e.g. `2026-02-15`.
pub fn day_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
