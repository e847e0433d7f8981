use serde::{Deserialize, Serialize};

use crate::time::date::Date;

/// # DayCounter
/// Day count conventions used for accrual fractions and curve times.
/// `day_count` returns whole days; `year_fraction` is the explicit
/// conversion from a date pair to a time measure.
///
/// ## Example
/// ```
/// use pathwise::prelude::*;
/// let start = Date::new(2020, 1, 1);
/// let end = Date::new(2020, 2, 1);
/// assert_eq!(DayCounter::Actual365.day_count(start, end), 31);
/// assert_eq!(DayCounter::Actual365.year_fraction(start, end), 31.0 / 365.0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DayCounter {
    Actual365,
    Actual360,
}

impl DayCounter {
    pub fn day_count(&self, start: Date, end: Date) -> i64 {
        end - start
    }

    pub fn year_fraction(&self, start: Date, end: Date) -> f64 {
        let days = self.day_count(start, end) as f64;
        match self {
            DayCounter::Actual365 => days / 365.0,
            DayCounter::Actual360 => days / 360.0,
        }
    }
}
