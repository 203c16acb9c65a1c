use crate::error::{ApiError, ApiResult};
use chrono::{Datelike, Local, NaiveDate};
use std::fmt;

/// Inclusive date range covering one calendar month
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl MonthRange {
    /// Parse a `YYYY-MM` month into its first and last day
    pub fn parse(month: &str) -> ApiResult<Self> {
        let invalid = || ApiError::Validation(format!("month must be YYYY-MM, got {:?}", month));

        let (year, mon) = month.split_once('-').ok_or_else(invalid)?;
        let digits = |s: &str, len: usize| s.len() == len && s.bytes().all(|b| b.is_ascii_digit());
        if !digits(year, 4) || !digits(mon, 2) {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let mon: u32 = mon.parse().map_err(|_| invalid())?;

        let from = NaiveDate::from_ymd_opt(year, mon, 1).ok_or_else(invalid)?;
        let next_month = if mon == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(year, mon + 1, 1)
        }
        .ok_or_else(invalid)?;
        let to = next_month.pred_opt().ok_or_else(invalid)?;

        Ok(Self { from, to })
    }

    /// Current month in local time
    pub fn current() -> Self {
        let today = Local::now().date_naive();
        let from = today.with_day(1).unwrap_or(today);
        // parse never fails for a month built from a real date
        Self::parse(&month_key(from)).unwrap_or(Self { from, to: today })
    }

    /// `YYYY-MM` key of the month
    pub fn month(&self) -> String {
        month_key(self.from)
    }

    /// `from` / `to` query pairs as the reports endpoints expect them
    pub fn query_pairs(&self) -> [(&'static str, String); 2] {
        [
            ("from", self.from.format("%Y-%m-%d").to_string()),
            ("to", self.to.format("%Y-%m-%d").to_string()),
        ]
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }
}

impl fmt::Display for MonthRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {}", self.from.format("%Y-%m-%d"), self.to.format("%Y-%m-%d"))
    }
}

fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_leap_february() {
        let range = MonthRange::parse("2024-02").unwrap();
        assert_eq!(range.from, ymd(2024, 2, 1));
        assert_eq!(range.to, ymd(2024, 2, 29));
    }

    #[test]
    fn test_thirty_day_month() {
        assert_eq!(MonthRange::parse("2024-04").unwrap().to, ymd(2024, 4, 30));
    }

    #[test]
    fn test_non_leap_february_and_december() {
        assert_eq!(MonthRange::parse("2023-02").unwrap().to, ymd(2023, 2, 28));
        assert_eq!(MonthRange::parse("2024-12").unwrap().to, ymd(2024, 12, 31));
    }

    #[test]
    fn test_invalid_months_rejected() {
        for bad in ["2024-13", "2024-00", "2024-2", "202402", "abcd-ef", "", "+202-02", "2024-+2", "-024-02"] {
            assert!(MonthRange::parse(bad).is_err(), "{} should be rejected", bad);
        }
    }

    #[test]
    fn test_query_pairs_and_month_key() {
        let range = MonthRange::parse("2024-02").unwrap();
        assert_eq!(range.month(), "2024-02");
        assert_eq!(range.query_pairs()[1], ("to", "2024-02-29".to_string()));
        assert!(range.contains(ymd(2024, 2, 29)));
        assert!(!range.contains(ymd(2024, 3, 1)));
    }

    #[test]
    fn test_current_month_is_well_formed() {
        let range = MonthRange::current();
        assert_eq!(range.from.day(), 1);
        assert!(range.to >= range.from);
    }
}
