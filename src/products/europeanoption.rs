use serde::{Deserialize, Serialize};

use crate::core::cashflow::Cashflow;
use crate::core::observables::{MarketObservable, Share};
use crate::core::traits::Product;
use crate::currencies::enums::Currency;
use crate::time::date::Date;
use crate::utils::errors::{PathwiseError, Result};

/// # EuropeanOption
/// A cash-settled European call on a share: pays `max(S - K, 0)` in the
/// share's currency on the exercise date.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EuropeanOption {
    share: Share,
    strike: f64,
    exercise_date: Date,
    value_date: Option<Date>,
    share_price: Option<f64>,
}

impl EuropeanOption {
    pub fn new(share: Share, strike: f64, exercise_date: Date) -> EuropeanOption {
        EuropeanOption {
            share,
            strike,
            exercise_date,
            value_date: None,
            share_price: None,
        }
    }

    fn check_observable(&self, observable: &MarketObservable) -> Result<()> {
        if *observable != MarketObservable::Share(self.share.clone()) {
            return Err(PathwiseError::NotFoundErr(format!(
                "{} did not request {}",
                self.name(),
                observable
            )));
        }
        Ok(())
    }

    fn is_live(&self) -> Result<bool> {
        let value_date = self.value_date.ok_or_else(|| {
            PathwiseError::LifecycleErr(format!("{}: value date has not been set", self.name()))
        })?;
        Ok(self.exercise_date > value_date)
    }
}

impl Product for EuropeanOption {
    fn name(&self) -> String {
        format!(
            "EuropeanOption({}:{}, {})",
            self.share.currency(),
            self.share.ticker(),
            self.exercise_date
        )
    }

    fn set_value_date(&mut self, value_date: Date) {
        self.value_date = Some(value_date);
    }

    fn reset(&mut self) {
        self.share_price = None;
    }

    fn required_indices(&self) -> Vec<MarketObservable> {
        vec![MarketObservable::Share(self.share.clone())]
    }

    fn required_index_dates(&self, observable: &MarketObservable) -> Result<Vec<Date>> {
        self.check_observable(observable)?;
        if self.is_live()? {
            Ok(vec![self.exercise_date])
        } else {
            Ok(Vec::new())
        }
    }

    fn set_index_values(&mut self, observable: &MarketObservable, values: &[f64]) -> Result<()> {
        self.check_observable(observable)?;
        let expected = if self.is_live()? { 1 } else { 0 };
        if values.len() != expected {
            return Err(PathwiseError::SizeMismatchErr(format!(
                "{}: {} values supplied for {} required dates",
                self.name(),
                values.len(),
                expected
            )));
        }
        if expected == 1 {
            self.share_price = Some(values[0]);
        }
        Ok(())
    }

    fn cashflows(&self) -> Result<Vec<Cashflow>> {
        if !self.is_live()? {
            return Ok(Vec::new());
        }
        let price = self.share_price.ok_or_else(|| {
            PathwiseError::ValueNotSetErr(format!(
                "{}: no share price set for {}",
                self.name(),
                self.exercise_date
            ))
        })?;
        Ok(vec![Cashflow::new(
            self.exercise_date,
            (price - self.strike).max(0.0),
            self.share.currency(),
        )])
    }

    fn cashflow_currencies(&self) -> Vec<Currency> {
        vec![self.share.currency()]
    }

    fn cashflow_dates(&self, currency: Currency) -> Vec<Date> {
        if currency == self.share.currency() {
            vec![self.exercise_date]
        } else {
            Vec::new()
        }
    }

    fn box_clone(&self) -> Box<dyn Product> {
        Box::new(self.clone())
    }
}
