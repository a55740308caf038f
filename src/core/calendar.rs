//! Trading day arithmetic for the CN mutual fund market.
//!
//! A day is a trading day when it is a weekday and not a member of the
//! holiday set compiled into the calendar. The holiday table is bounded to
//! a few known years; dates past that horizon are treated as plain
//! weekday/weekend days, which is less accurate. The walk helpers emit a
//! warning when they cross the horizon.

use anyhow::{Result, bail};
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use std::collections::HashSet;
use tracing::warn;

/// Upper bound on the calendar-day scan for a single trading-day step. A
/// finite holiday set can never produce a gap this long, so hitting the cap
/// means the calendar was constructed with a pathological holiday set.
const MAX_WALK_DAYS: u32 = 365;

/// CN market closures (beyond weekends) for 2024-2026. The 2026 dates are
/// estimates until the official schedule is published.
const CN_HOLIDAYS: &[&str] = &[
    // 2024
    "2024-01-01",
    "2024-02-10",
    "2024-02-11",
    "2024-02-12",
    "2024-02-13",
    "2024-02-14",
    "2024-02-15",
    "2024-02-16",
    "2024-02-17",
    "2024-04-04",
    "2024-04-05",
    "2024-04-06",
    "2024-05-01",
    "2024-05-02",
    "2024-05-03",
    "2024-05-04",
    "2024-05-05",
    "2024-06-10",
    "2024-09-15",
    "2024-09-16",
    "2024-09-17",
    "2024-10-01",
    "2024-10-02",
    "2024-10-03",
    "2024-10-04",
    "2024-10-05",
    "2024-10-06",
    "2024-10-07",
    // 2025
    "2025-01-01",
    "2025-01-28",
    "2025-01-29",
    "2025-01-30",
    "2025-01-31",
    "2025-02-01",
    "2025-02-02",
    "2025-02-03",
    "2025-02-04",
    "2025-04-04",
    "2025-04-05",
    "2025-04-06",
    "2025-05-01",
    "2025-05-02",
    "2025-05-03",
    "2025-05-04",
    "2025-05-05",
    "2025-05-31",
    "2025-06-01",
    "2025-06-02",
    "2025-10-01",
    "2025-10-02",
    "2025-10-03",
    "2025-10-04",
    "2025-10-05",
    "2025-10-06",
    "2025-10-07",
    "2025-10-08",
    // 2026
    "2026-01-01",
    "2026-01-02",
    "2026-01-03",
    "2026-02-17",
    "2026-02-18",
    "2026-02-19",
    "2026-02-20",
    "2026-02-21",
    "2026-02-22",
    "2026-02-23",
    "2026-04-04",
    "2026-04-05",
    "2026-04-06",
    "2026-05-01",
    "2026-05-02",
    "2026-05-03",
    "2026-05-04",
    "2026-05-05",
    "2026-06-19",
    "2026-06-20",
    "2026-06-21",
    "2026-10-01",
    "2026-10-02",
    "2026-10-03",
    "2026-10-04",
    "2026-10-05",
    "2026-10-06",
    "2026-10-07",
];

/// Decides trading days from an immutable holiday set.
#[derive(Debug, Clone)]
pub struct TradingCalendar {
    holidays: HashSet<NaiveDate>,
    horizon_year: Option<i32>,
}

impl TradingCalendar {
    pub fn new(holidays: HashSet<NaiveDate>) -> Self {
        let horizon_year = holidays.iter().map(|d| d.year()).max();
        Self {
            holidays,
            horizon_year,
        }
    }

    /// Calendar with the compiled CN market closure table.
    pub fn cn_market() -> Self {
        Self::new(
            CN_HOLIDAYS
                .iter()
                .filter_map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
                .collect(),
        )
    }

    /// Calendar with the compiled table plus user-supplied closures.
    pub fn cn_market_with_extra(extra: &[NaiveDate]) -> Self {
        let mut calendar = Self::cn_market();
        calendar.holidays.extend(extra.iter().copied());
        calendar.horizon_year = calendar.holidays.iter().map(|d| d.year()).max();
        calendar
    }

    pub fn is_trading_day(&self, date: NaiveDate) -> bool {
        if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            return false;
        }
        !self.holidays.contains(&date)
    }

    /// Walks forward to the `offset`-th trading day after `date`.
    /// `offset == 0` returns `date` unchanged.
    pub fn next_trading_day(&self, date: NaiveDate, offset: u32) -> Result<NaiveDate> {
        self.walk(date, offset, Duration::days(1))
    }

    /// Walks backward to the `count`-th trading day before `date`.
    /// `count == 0` returns `date` unchanged.
    pub fn previous_trading_day(&self, date: NaiveDate, count: u32) -> Result<NaiveDate> {
        self.walk(date, count, Duration::days(-1))
    }

    fn walk(&self, date: NaiveDate, offset: u32, step: Duration) -> Result<NaiveDate> {
        if offset == 0 {
            return Ok(date);
        }
        self.check_horizon(date);

        let mut current = date;
        let mut counted = 0;
        while counted < offset {
            let mut scanned = 0;
            loop {
                current = current + step;
                scanned += 1;
                if self.is_trading_day(current) {
                    break;
                }
                if scanned > MAX_WALK_DAYS {
                    bail!(
                        "no trading day found within {} days of {}",
                        MAX_WALK_DAYS,
                        date
                    );
                }
            }
            counted += 1;
        }
        Ok(current)
    }

    fn check_horizon(&self, date: NaiveDate) {
        if let Some(horizon) = self.horizon_year
            && date.year() > horizon
        {
            warn!(
                "{} is past the compiled holiday table (ends {}); only weekends are excluded",
                date, horizon
            );
        }
    }
}

impl Default for TradingCalendar {
    fn default() -> Self {
        Self::cn_market()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_weekends_are_not_trading_days() {
        let calendar = TradingCalendar::cn_market();
        assert!(!calendar.is_trading_day(date("2024-01-06"))); // Saturday
        assert!(!calendar.is_trading_day(date("2024-01-07"))); // Sunday
        assert!(calendar.is_trading_day(date("2024-01-08"))); // Monday
    }

    #[test]
    fn test_holidays_are_not_trading_days() {
        let calendar = TradingCalendar::cn_market();
        // New Year's Day 2024 falls on a Monday
        assert!(!calendar.is_trading_day(date("2024-01-01")));
        // Labour Day week
        assert!(!calendar.is_trading_day(date("2024-05-01")));
        assert!(calendar.is_trading_day(date("2024-05-06")));
    }

    #[test]
    fn test_next_trading_day_zero_offset_is_identity() {
        let calendar = TradingCalendar::cn_market();
        for day in ["2024-01-01", "2024-01-06", "2024-01-08"] {
            assert_eq!(calendar.next_trading_day(date(day), 0).unwrap(), date(day));
        }
    }

    #[test]
    fn test_next_trading_day_skips_weekend_and_holiday() {
        let calendar = TradingCalendar::cn_market();
        // Friday before a regular weekend
        assert_eq!(
            calendar.next_trading_day(date("2024-01-05"), 1).unwrap(),
            date("2024-01-08")
        );
        // 2023-12-29 (Fri) -> weekend -> 2024-01-01 holiday -> 2024-01-02
        assert_eq!(
            calendar.next_trading_day(date("2023-12-29"), 1).unwrap(),
            date("2024-01-02")
        );
    }

    #[test]
    fn test_previous_trading_day() {
        let calendar = TradingCalendar::cn_market();
        assert_eq!(
            calendar.previous_trading_day(date("2024-01-08"), 1).unwrap(),
            date("2024-01-05")
        );
        assert_eq!(
            calendar.previous_trading_day(date("2024-01-02"), 1).unwrap(),
            date("2023-12-29")
        );
    }

    #[test]
    fn test_round_trip_over_trading_days() {
        let calendar = TradingCalendar::cn_market();
        // Wednesday in an ordinary week
        let day = date("2024-03-13");
        for k in 1..=5 {
            let back = calendar.previous_trading_day(day, k).unwrap();
            assert_eq!(calendar.next_trading_day(back, k).unwrap(), day);
        }
    }

    #[test]
    fn test_extra_holidays_are_respected() {
        let extra = vec![date("2024-03-13")];
        let calendar = TradingCalendar::cn_market_with_extra(&extra);
        assert!(!calendar.is_trading_day(date("2024-03-13")));
        assert_eq!(
            calendar.next_trading_day(date("2024-03-12"), 1).unwrap(),
            date("2024-03-14")
        );
    }

    #[test]
    fn test_pathological_holiday_set_fails_instead_of_looping() {
        // Every day of 2030-2032 marked as a holiday
        let mut holidays = HashSet::new();
        let mut day = date("2030-01-01");
        while day < date("2033-01-01") {
            holidays.insert(day);
            day = day + Duration::days(1);
        }
        let calendar = TradingCalendar::new(holidays);
        assert!(calendar.next_trading_day(date("2030-06-01"), 1).is_err());
    }
}
