use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeUnit {
    Days,
    Weeks,
    Months,
    Years,
}

/// # Period
/// A calendar tenor such as `3M` or `5Y`.
///
/// ## Example
/// ```
/// use pathwise::prelude::*;
/// let tenor = Period::new(3, TimeUnit::Months);
/// assert_eq!(tenor.to_string(), "3M");
/// assert_eq!(Period::years(5), Period::new(5, TimeUnit::Years));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Period {
    length: i32,
    units: TimeUnit,
}

impl Period {
    pub fn new(length: i32, units: TimeUnit) -> Period {
        Period { length, units }
    }

    pub fn days(length: i32) -> Period {
        Period::new(length, TimeUnit::Days)
    }

    pub fn months(length: i32) -> Period {
        Period::new(length, TimeUnit::Months)
    }

    pub fn years(length: i32) -> Period {
        Period::new(length, TimeUnit::Years)
    }

    pub fn length(&self) -> i32 {
        self.length
    }

    pub fn units(&self) -> TimeUnit {
        self.units
    }

    /// Number of whole months, if this tenor is expressible in months.
    pub fn in_months(&self) -> Option<i32> {
        match self.units {
            TimeUnit::Months => Some(self.length),
            TimeUnit::Years => Some(12 * self.length),
            _ => None,
        }
    }
}

impl Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let unit = match self.units {
            TimeUnit::Days => "D",
            TimeUnit::Weeks => "W",
            TimeUnit::Months => "M",
            TimeUnit::Years => "Y",
        };
        write!(f, "{}{}", self.length, unit)
    }
}
