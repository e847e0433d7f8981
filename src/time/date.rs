use std::fmt::Display;
use std::ops::{Add, Sub};

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::time::period::{Period, TimeUnit};

/// Serial day 0. Matches the whole-day convention used for all date
/// arithmetic in the engine.
const EPOCH_YEAR: i32 = 2000;

/// # Date
/// A calendar date with whole-day arithmetic. Dates are plain values: the
/// difference of two dates is a number of calendar days, and conversions to
/// and from a day count are explicit (`serial`/`from_serial`), never
/// implicit.
///
/// ## Example
/// ```
/// use pathwise::prelude::*;
/// let d1 = Date::new(2016, 9, 17);
/// let d2 = d1.add_months(3);
/// assert_eq!(d2, Date::new(2016, 12, 17));
/// assert_eq!(d2 - d1, 91);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Date(NaiveDate);

impl Date {
    /// Panics on an invalid calendar date, the same way an invalid literal
    /// would fail; use `try_new` for runtime-supplied components.
    pub fn new(year: i32, month: u32, day: u32) -> Date {
        Date(
            NaiveDate::from_ymd_opt(year, month, day)
                .unwrap_or_else(|| panic!("invalid date {}-{}-{}", year, month, day)),
        )
    }

    pub fn try_new(year: i32, month: u32, day: u32) -> Option<Date> {
        NaiveDate::from_ymd_opt(year, month, day).map(Date)
    }

    /// Whole days since the engine epoch (2000-01-01).
    pub fn serial(&self) -> i64 {
        let epoch = NaiveDate::from_ymd_opt(EPOCH_YEAR, 1, 1).unwrap();
        (self.0 - epoch).num_days()
    }

    pub fn from_serial(serial: i64) -> Date {
        let epoch = NaiveDate::from_ymd_opt(EPOCH_YEAR, 1, 1).unwrap();
        Date(epoch + chrono::Duration::days(serial))
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }

    pub fn add_days(&self, days: i64) -> Date {
        Date(self.0 + chrono::Duration::days(days))
    }

    /// End-of-month days clamp, e.g. Jan 31 + 1M = Feb 28/29.
    pub fn add_months(&self, months: i32) -> Date {
        if months >= 0 {
            Date(self.0 + Months::new(months as u32))
        } else {
            Date(self.0 - Months::new((-months) as u32))
        }
    }

    pub fn add_years(&self, years: i32) -> Date {
        self.add_months(12 * years)
    }

    pub fn add_period(&self, period: Period) -> Date {
        match period.units() {
            TimeUnit::Days => self.add_days(period.length() as i64),
            TimeUnit::Weeks => self.add_days(7 * period.length() as i64),
            TimeUnit::Months => self.add_months(period.length()),
            TimeUnit::Years => self.add_years(period.length()),
        }
    }
}

impl Sub for Date {
    type Output = i64;

    /// Whole calendar days from `rhs` to `self`.
    fn sub(self, rhs: Date) -> i64 {
        (self.0 - rhs.0).num_days()
    }
}

impl Add<Period> for Date {
    type Output = Date;

    fn add(self, rhs: Period) -> Date {
        self.add_period(rhs)
    }
}

impl Display for Date {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::period::{Period, TimeUnit};

    #[test]
    fn test_day_arithmetic() {
        let d1 = Date::new(2016, 9, 23);
        let d2 = Date::new(2016, 12, 23);
        assert_eq!(d2 - d1, 91);
        assert_eq!(d1.add_days(91), d2);
    }

    #[test]
    fn test_serial_round_trip() {
        let d = Date::new(2024, 2, 29);
        assert_eq!(Date::from_serial(d.serial()), d);
        assert_eq!(Date::new(2000, 1, 1).serial(), 0);
    }

    #[test]
    fn test_month_clamp() {
        let d = Date::new(2023, 1, 31);
        assert_eq!(d.add_months(1), Date::new(2023, 2, 28));
        assert_eq!(d.add_months(-2), Date::new(2022, 11, 30));
    }

    #[test]
    fn test_add_period() {
        let d = Date::new(2016, 9, 17);
        assert_eq!(d + Period::new(3, TimeUnit::Months), Date::new(2016, 12, 17));
        assert_eq!(d + Period::new(10, TimeUnit::Days), Date::new(2016, 9, 27));
        assert_eq!(d + Period::new(5, TimeUnit::Years), Date::new(2021, 9, 17));
    }
}
