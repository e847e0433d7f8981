use std::collections::HashMap;

use crate::time::date::Date;
use crate::utils::errors::{PathwiseError, Result};

/// Simulator lifecycle phase. Registration calls are only valid in
/// `Registering`, queries only after `run_simulation` has produced a path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SimulatorState {
    Registering,
    Prepared,
    PathReady,
}

/// Per-observable registered date sets, keyed by canonical observable key.
/// Dates are kept sorted and unique; repeated registrations merge by
/// union.
#[derive(Clone, Debug, Default)]
pub(crate) struct RegistrationSet {
    dates: HashMap<String, Vec<Date>>,
}

impl RegistrationSet {
    pub fn new() -> RegistrationSet {
        RegistrationSet {
            dates: HashMap::new(),
        }
    }

    pub fn clear(&mut self) {
        self.dates.clear();
    }

    pub fn merge(&mut self, key: &str, dates: &[Date]) {
        let entry = self.dates.entry(key.to_string()).or_default();
        entry.extend_from_slice(dates);
        entry.sort();
        entry.dedup();
    }

    pub fn dates(&self, key: &str) -> &[Date] {
        self.dates.get(key).map(|d| d.as_slice()).unwrap_or(&[])
    }

    pub fn contains(&self, key: &str, date: Date) -> bool {
        self.dates(key).binary_search(&date).is_ok()
    }

    /// Union of every registered date across all observables.
    pub fn all_dates(&self) -> Vec<Date> {
        let mut all: Vec<Date> = self.dates.values().flatten().copied().collect();
        all.sort();
        all.dedup();
        all
    }

    /// Checks that every requested date was registered for `key`; used by
    /// simulators to reject queries outside the prepared grid.
    pub fn check_subset(&self, simulator: &str, key: &str, dates: &[Date]) -> Result<()> {
        for date in dates {
            if !self.contains(key, *date) {
                return Err(PathwiseError::NotFoundErr(format!(
                    "{}: date {} was not registered for {}",
                    simulator, date, key
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_is_union() {
        let mut set = RegistrationSet::new();
        let d1 = Date::new(2020, 1, 1);
        let d2 = Date::new(2020, 6, 1);
        let d3 = Date::new(2020, 3, 1);
        set.merge("A", &[d1, d2]);
        set.merge("A", &[d3, d1]);
        assert_eq!(set.dates("A"), &[d1, d3, d2]);
    }

    #[test]
    fn test_subset_check() {
        let mut set = RegistrationSet::new();
        let d1 = Date::new(2020, 1, 1);
        set.merge("A", &[d1]);
        assert!(set.check_subset("sim", "A", &[d1]).is_ok());
        assert!(set
            .check_subset("sim", "A", &[Date::new(2021, 1, 1)])
            .is_err());
        assert!(set.check_subset("sim", "B", &[d1]).is_err());
    }
}
