//! A year/month pair and month arithmetic.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Month, Months, NaiveDate};

use crate::error::ClanCalError;

/// Direction of a one-month step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonthStep {
    Prev,
    Next,
}

/// A calendar month. `month` is 1-based (January = 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        // Reject years chrono can't build a date for
        NaiveDate::from_ymd_opt(year, month, 1)?;
        Some(YearMonth { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        YearMonth {
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

    /// One month forward or back, wrapping across year boundaries. Stays put
    /// at the edges of the representable date range.
    pub fn step(self, step: MonthStep) -> Self {
        let (year, month) = match (step, self.month) {
            (MonthStep::Next, 12) => (self.year.checked_add(1), 1),
            (MonthStep::Next, m) => (Some(self.year), m + 1),
            (MonthStep::Prev, 1) => (self.year.checked_sub(1), 12),
            (MonthStep::Prev, m) => (Some(self.year), m - 1),
        };
        year.and_then(|year| YearMonth::new(year, month))
            .unwrap_or(self)
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .unwrap_or(NaiveDate::MIN)
    }

    pub fn days_in_month(&self) -> u32 {
        let first = self.first_day();
        first
            .checked_add_months(Months::new(1))
            .and_then(|next| u32::try_from(next.signed_duration_since(first).num_days()).ok())
            // Only December of the last representable year has no successor
            .unwrap_or(31)
    }

    /// Weekday of the 1st, counted from Sunday = 0.
    pub fn first_weekday_index(&self) -> u32 {
        self.first_day().weekday().num_days_from_sunday()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    pub fn name(&self) -> &'static str {
        Month::try_from(self.month as u8)
            .map(|m| m.name())
            .unwrap_or("")
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name(), self.year)
    }
}

impl FromStr for YearMonth {
    type Err = ClanCalError;

    /// Parse `YYYY-MM`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid =
            || ClanCalError::Validation(format!("Invalid month '{s}'. Expected YYYY-MM"));

        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        YearMonth::new(year, month).ok_or_else(invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ym(year: i32, month: u32) -> YearMonth {
        YearMonth::new(year, month).unwrap()
    }

    #[test]
    fn next_wraps_december_to_january() {
        assert_eq!(ym(2024, 12).step(MonthStep::Next), ym(2025, 1));
        assert_eq!(ym(2024, 5).step(MonthStep::Next), ym(2024, 6));
    }

    #[test]
    fn prev_wraps_january_to_december() {
        assert_eq!(ym(2024, 1).step(MonthStep::Prev), ym(2023, 12));
        assert_eq!(ym(2024, 5).step(MonthStep::Prev), ym(2024, 4));
    }

    #[test]
    fn twelve_steps_forward_is_one_year() {
        for month in 1..=12 {
            let start = ym(2024, month);
            let end = (0..12).fold(start, |acc, _| acc.step(MonthStep::Next));
            assert_eq!(end, ym(2025, month));
        }
    }

    #[test]
    fn days_in_month_handles_leap_years() {
        assert_eq!(ym(2024, 2).days_in_month(), 29);
        assert_eq!(ym(2023, 2).days_in_month(), 28);
        assert_eq!(ym(1900, 2).days_in_month(), 28);
        assert_eq!(ym(2000, 2).days_in_month(), 29);
        assert_eq!(ym(2024, 4).days_in_month(), 30);
        assert_eq!(ym(2024, 12).days_in_month(), 31);
    }

    #[test]
    fn first_weekday_counts_from_sunday() {
        // September 2024 starts on a Sunday, March 2024 on a Friday
        assert_eq!(ym(2024, 9).first_weekday_index(), 0);
        assert_eq!(ym(2024, 3).first_weekday_index(), 5);
        // June 2024 starts on a Saturday
        assert_eq!(ym(2024, 6).first_weekday_index(), 6);
    }

    #[test]
    fn parses_and_displays() {
        assert_eq!("2024-03".parse::<YearMonth>().unwrap(), ym(2024, 3));
        assert!("2024-13".parse::<YearMonth>().is_err());
        assert!("March".parse::<YearMonth>().is_err());
        assert_eq!(ym(2024, 3).to_string(), "March 2024");
    }

    #[test]
    fn last_representable_month_is_bounded() {
        let last = "262142-12".parse::<YearMonth>().unwrap();
        assert_eq!(last.days_in_month(), 31);
        assert_eq!(last.step(MonthStep::Next), last);
        assert_eq!(last.step(MonthStep::Prev), ym(262142, 11));

        let first = ym(NaiveDate::MIN.year(), 1);
        assert_eq!(first.step(MonthStep::Prev), first);
        assert_eq!(first.days_in_month(), 31);
    }
}
