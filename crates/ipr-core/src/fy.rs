//! # Financial Year Clock
//!
//! Indian-style financial years run April 1 through March 31 and are
//! identified by their starting calendar year: 15 May 2026 and 10 February
//! 2027 both fall in FY 2026, short form `"26"`, counter key `"fy_26"`.
//!
//! The rule is applied to a *local* calendar date. [`FinancialYearClock`]
//! carries the fixed UTC offset used to turn a UTC instant into that date,
//! IST (+05:30) by default, so an entry created at 20:00 UTC on 31 March
//! already belongs to the next financial year.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Offset, Utc};
use serde::{Deserialize, Serialize};

/// IST offset from UTC in minutes.
pub const IST_OFFSET_MINUTES: i32 = 330;

/// First month of the financial year.
const FY_START_MONTH: u32 = 4;

/// A financial year, identified by its starting calendar year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FinancialYear(i32);

impl FinancialYear {
    /// The financial year starting in April of `start_year`.
    pub fn new(start_year: i32) -> Self {
        Self(start_year)
    }

    /// The financial year containing `date`.
    pub fn for_date(date: NaiveDate) -> Self {
        if date.month() >= FY_START_MONTH {
            Self(date.year())
        } else {
            Self(date.year() - 1)
        }
    }

    /// Starting calendar year.
    pub fn start_year(&self) -> i32 {
        self.0
    }

    /// Two-digit zero-padded form (`2026` → `"26"`, `2005` → `"05"`).
    pub fn short(&self) -> String {
        format!("{:02}", self.0.rem_euclid(100))
    }

    /// Key of this year's incremental counter, e.g. `"fy_26"`.
    pub fn counter_key(&self) -> String {
        format!("fy_{}", self.short())
    }

    /// First and last day, inclusive.
    ///
    /// `None` only for years outside chrono's representable range.
    pub fn range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let start = NaiveDate::from_ymd_opt(self.0, FY_START_MONTH, 1)?;
        let end = NaiveDate::from_ymd_opt(self.0 + 1, FY_START_MONTH - 1, 31)?;
        Some((start, end))
    }

    /// Whether `date` falls inside this financial year.
    pub fn contains(&self, date: NaiveDate) -> bool {
        Self::for_date(date) == *self
    }
}

impl std::fmt::Display for FinancialYear {
    /// `FY2026-27`
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FY{}-{:02}", self.0, (self.0 + 1).rem_euclid(100))
    }
}

/// The financial year containing `date`.
pub fn financial_year_for(date: NaiveDate) -> FinancialYear {
    FinancialYear::for_date(date)
}

/// Starting year of the financial year in effect at `now`, judged on the
/// IST calendar.
pub fn current_financial_year(now: DateTime<Utc>) -> i32 {
    FinancialYearClock::default()
        .financial_year_at(now)
        .start_year()
}

/// Converts UTC instants into financial years using a fixed local offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinancialYearClock {
    offset: FixedOffset,
}

impl FinancialYearClock {
    /// A clock for the given offset.
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// A clock for an offset in minutes east of UTC.
    ///
    /// Returns `None` when the offset is outside ±24h.
    pub fn from_offset_minutes(minutes: i32) -> Option<Self> {
        FixedOffset::east_opt(minutes.checked_mul(60)?).map(Self::new)
    }

    /// The configured offset.
    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Local calendar date at `now`.
    pub fn local_date(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.offset).date_naive()
    }

    /// Financial year in effect at `now`.
    pub fn financial_year_at(&self, now: DateTime<Utc>) -> FinancialYear {
        FinancialYear::for_date(self.local_date(now))
    }

    /// Financial year in effect right now.
    pub fn current(&self) -> FinancialYear {
        self.financial_year_at(Utc::now())
    }
}

impl Default for FinancialYearClock {
    fn default() -> Self {
        Self::from_offset_minutes(IST_OFFSET_MINUTES).unwrap_or(Self { offset: Utc.fix() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_boundary_march_31_april_1() {
        let march = financial_year_for(date(2026, 3, 31));
        let april = financial_year_for(date(2026, 4, 1));
        assert_eq!(march.start_year(), 2025);
        assert_eq!(april.start_year(), 2026);
        assert_eq!(april.start_year() - march.start_year(), 1);
    }

    #[test]
    fn test_january_belongs_to_previous_year() {
        assert_eq!(financial_year_for(date(2027, 1, 15)).start_year(), 2026);
        assert_eq!(financial_year_for(date(2026, 12, 31)).start_year(), 2026);
    }

    #[test]
    fn test_short_is_zero_padded() {
        assert_eq!(FinancialYear::new(2026).short(), "26");
        assert_eq!(FinancialYear::new(2005).short(), "05");
        assert_eq!(FinancialYear::new(2000).short(), "00");
        assert_eq!(FinancialYear::new(2026).counter_key(), "fy_26");
    }

    #[test]
    fn test_range_and_contains() {
        let fy = FinancialYear::new(2026);
        let (start, end) = fy.range().unwrap();
        assert_eq!(start, date(2026, 4, 1));
        assert_eq!(end, date(2027, 3, 31));
        assert!(fy.contains(start));
        assert!(fy.contains(end));
        assert!(!fy.contains(date(2026, 3, 31)));
        assert!(!fy.contains(date(2027, 4, 1)));
    }

    #[test]
    fn test_display() {
        assert_eq!(FinancialYear::new(2026).to_string(), "FY2026-27");
        assert_eq!(FinancialYear::new(2099).to_string(), "FY2099-00");
    }

    #[test]
    fn test_clock_uses_local_date() {
        // 20:00 UTC on 31 March is 01:30 IST on 1 April.
        let now = Utc.with_ymd_and_hms(2026, 3, 31, 20, 0, 0).unwrap();
        assert_eq!(FinancialYearClock::default().financial_year_at(now).start_year(), 2026);
        let utc = FinancialYearClock::from_offset_minutes(0).unwrap();
        assert_eq!(utc.financial_year_at(now).start_year(), 2025);
        assert_eq!(current_financial_year(now), 2026);
    }

    #[test]
    fn test_offset_out_of_range() {
        assert!(FinancialYearClock::from_offset_minutes(24 * 60).is_none());
        assert!(FinancialYearClock::from_offset_minutes(-330).is_some());
    }
}
