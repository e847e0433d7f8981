use serde::{Deserialize, Serialize};

use crate::core::cashflow::Cashflow;
use crate::core::observables::MarketObservable;
use crate::core::traits::Product;
use crate::currencies::enums::Currency;
use crate::time::date::Date;
use crate::utils::errors::{PathwiseError, Result};

/// # FixedLeg
/// A strip of fixed cashflows: `notional * rate * accrual` on each payment
/// date. Needs no market observables, so `reset` and `set_index_values`
/// are degenerate; it mainly exercises discounting and currency
/// conversion.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FixedLeg {
    currency: Currency,
    pay_dates: Vec<Date>,
    notionals: Vec<f64>,
    rates: Vec<f64>,
    accrual_fractions: Vec<f64>,
    value_date: Option<Date>,
}

impl FixedLeg {
    pub fn new(
        currency: Currency,
        pay_dates: Vec<Date>,
        notionals: Vec<f64>,
        rates: Vec<f64>,
        accrual_fractions: Vec<f64>,
    ) -> Result<FixedLeg> {
        let n = pay_dates.len();
        if notionals.len() != n || rates.len() != n || accrual_fractions.len() != n {
            return Err(PathwiseError::SizeMismatchErr(format!(
                "fixed leg arrays must all have length {}",
                n
            )));
        }
        Ok(FixedLeg {
            currency,
            pay_dates,
            notionals,
            rates,
            accrual_fractions,
            value_date: None,
        })
    }
}

impl Product for FixedLeg {
    fn name(&self) -> String {
        format!("FixedLeg({})", self.currency)
    }

    fn set_value_date(&mut self, value_date: Date) {
        self.value_date = Some(value_date);
    }

    fn reset(&mut self) {
        // no path state
    }

    fn required_indices(&self) -> Vec<MarketObservable> {
        Vec::new()
    }

    fn required_index_dates(&self, observable: &MarketObservable) -> Result<Vec<Date>> {
        Err(PathwiseError::NotFoundErr(format!(
            "{} did not request {}",
            self.name(),
            observable
        )))
    }

    fn set_index_values(&mut self, observable: &MarketObservable, _values: &[f64]) -> Result<()> {
        Err(PathwiseError::NotFoundErr(format!(
            "{} did not request {}",
            self.name(),
            observable
        )))
    }

    fn cashflows(&self) -> Result<Vec<Cashflow>> {
        let value_date = self.value_date.ok_or_else(|| {
            PathwiseError::LifecycleErr(format!("{}: value date has not been set", self.name()))
        })?;
        Ok(self
            .pay_dates
            .iter()
            .enumerate()
            .filter(|(_, date)| **date > value_date)
            .map(|(i, date)| {
                Cashflow::new(
                    *date,
                    self.notionals[i] * self.rates[i] * self.accrual_fractions[i],
                    self.currency,
                )
            })
            .collect())
    }

    fn cashflow_currencies(&self) -> Vec<Currency> {
        vec![self.currency]
    }

    fn cashflow_dates(&self, currency: Currency) -> Vec<Date> {
        if currency == self.currency {
            self.pay_dates.clone()
        } else {
            Vec::new()
        }
    }

    fn box_clone(&self) -> Box<dyn Product> {
        Box::new(self.clone())
    }
}
