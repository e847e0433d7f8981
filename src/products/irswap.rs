use serde::{Deserialize, Serialize};

use crate::core::cashflow::{Cashflow, Side};
use crate::core::observables::{FloatRateIndex, MarketObservable};
use crate::core::traits::Product;
use crate::currencies::enums::Currency;
use crate::time::date::Date;
use crate::time::daycounter::DayCounter;
use crate::time::period::Period;
use crate::utils::errors::{PathwiseError, Result};

/// # InterestRateSwap
/// A fixed-for-floating interest rate swap. Periods are generated by
/// walking from the start date in payment-tenor steps until maturity;
/// each period pays `sign * notional * accrual * fixed_rate` on the fixed
/// leg and the opposite sign on `notional * accrual * (float + spread)`,
/// both on the period end date. Accrual fractions are actual/365.
///
/// The floating fixings are path-scoped state: `reset` clears them, and
/// `cashflows` fails if any fixing for a live period was never injected.
///
/// ## Example
/// ```
/// use pathwise::prelude::*;
/// let jibar = FloatRateIndex::new(Currency::ZAR, "Jibar", Period::months(3));
/// let swap = InterestRateSwap::fixed_for_float(
///     0.07,
///     Side::Pay,
///     1_000_000.0,
///     Date::new(2016, 9, 17),
///     Period::years(5),
///     Period::months(3),
///     jibar,
/// ).unwrap();
/// assert_eq!(swap.required_indices().len(), 1);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InterestRateSwap {
    // contractual terms, fixed at construction
    fixed_side: Side,
    index: FloatRateIndex,
    index_dates: Vec<Date>,
    pay_dates: Vec<Date>,
    spreads: Vec<f64>,
    accrual_fractions: Vec<f64>,
    notionals: Vec<f64>,
    fixed_rate: f64,
    currency: Currency,
    // path-scoped state
    value_date: Option<Date>,
    index_values: Vec<Option<f64>>,
}

impl InterestRateSwap {
    /// Standard fixed-for-floating swap with a flat notional and no
    /// floating spread. `fixed_side` is the direction of the fixed leg.
    pub fn fixed_for_float(
        fixed_rate: f64,
        fixed_side: Side,
        notional: f64,
        start_date: Date,
        maturity: Period,
        payment_tenor: Period,
        index: FloatRateIndex,
    ) -> Result<InterestRateSwap> {
        let payment_months = payment_tenor.in_months().ok_or_else(|| {
            PathwiseError::InvalidValueErr(format!(
                "swap payment tenor {} must be a whole number of months",
                payment_tenor
            ))
        })?;
        let maturity_months = maturity.in_months().ok_or_else(|| {
            PathwiseError::InvalidValueErr(format!(
                "swap maturity {} must be a whole number of months",
                maturity
            ))
        })?;
        if payment_months <= 0 || maturity_months % payment_months != 0 {
            return Err(PathwiseError::InvalidValueErr(format!(
                "swap maturity {} is not a whole number of {} periods",
                maturity, payment_tenor
            )));
        }
        if index.tenor() != payment_tenor {
            return Err(PathwiseError::InvalidValueErr(format!(
                "index {} does not match the payment tenor {}",
                index, payment_tenor
            )));
        }

        let n_periods = (maturity_months / payment_months) as usize;
        let mut index_dates = Vec::with_capacity(n_periods);
        let mut pay_dates = Vec::with_capacity(n_periods);
        let mut accrual_fractions = Vec::with_capacity(n_periods);
        let mut period_start = start_date;
        for i in 0..n_periods {
            let period_end = start_date.add_months(payment_months * (i as i32 + 1));
            index_dates.push(period_start);
            pay_dates.push(period_end);
            accrual_fractions.push(DayCounter::Actual365.year_fraction(period_start, period_end));
            period_start = period_end;
        }

        let currency = index.currency();
        Ok(InterestRateSwap {
            fixed_side,
            index,
            index_dates,
            pay_dates,
            spreads: vec![0.0; n_periods],
            accrual_fractions,
            notionals: vec![notional; n_periods],
            fixed_rate,
            currency,
            value_date: None,
            index_values: vec![None; n_periods],
        })
    }

    pub fn index(&self) -> &FloatRateIndex {
        &self.index
    }

    pub fn maturity_date(&self) -> Date {
        self.pay_dates[self.pay_dates.len() - 1]
    }

    fn value_date(&self) -> Result<Date> {
        self.value_date.ok_or_else(|| {
            PathwiseError::LifecycleErr(format!("{}: value date has not been set", self.name()))
        })
    }

    fn check_observable(&self, observable: &MarketObservable) -> Result<()> {
        let own = MarketObservable::RateIndex(self.index.clone());
        if *observable != own {
            return Err(PathwiseError::NotFoundErr(format!(
                "{} did not request {}",
                self.name(),
                observable
            )));
        }
        Ok(())
    }
}

impl Product for InterestRateSwap {
    fn name(&self) -> String {
        format!("IRSwap({}, {})", self.index, self.maturity_date())
    }

    fn set_value_date(&mut self, value_date: Date) {
        self.value_date = Some(value_date);
    }

    fn reset(&mut self) {
        self.index_values = vec![None; self.index_values.len()];
    }

    fn required_indices(&self) -> Vec<MarketObservable> {
        vec![MarketObservable::RateIndex(self.index.clone())]
    }

    fn required_index_dates(&self, observable: &MarketObservable) -> Result<Vec<Date>> {
        self.check_observable(observable)?;
        let value_date = self.value_date()?;
        Ok(self
            .pay_dates
            .iter()
            .zip(self.index_dates.iter())
            .filter(|(pay, _)| **pay > value_date)
            .map(|(_, fix)| *fix)
            .collect())
    }

    fn set_index_values(&mut self, observable: &MarketObservable, values: &[f64]) -> Result<()> {
        self.check_observable(observable)?;
        let value_date = self.value_date()?;
        let live: Vec<usize> = (0..self.pay_dates.len())
            .filter(|i| self.pay_dates[*i] > value_date)
            .collect();
        if live.len() != values.len() {
            return Err(PathwiseError::SizeMismatchErr(format!(
                "{}: {} values supplied for {} required dates of {}",
                self.name(),
                values.len(),
                live.len(),
                observable
            )));
        }
        for (slot, value) in live.into_iter().zip(values.iter()) {
            self.index_values[slot] = Some(*value);
        }
        Ok(())
    }

    fn cashflows(&self) -> Result<Vec<Cashflow>> {
        let value_date = self.value_date()?;
        let sign = self.fixed_side.sign();
        let mut cfs = Vec::new();
        for i in 0..self.pay_dates.len() {
            if self.pay_dates[i] <= value_date {
                continue;
            }
            let floating = self.index_values[i].ok_or_else(|| {
                PathwiseError::ValueNotSetErr(format!(
                    "{}: no value set for {} at {}",
                    self.name(),
                    self.index,
                    self.index_dates[i]
                ))
            })?;
            let base = self.notionals[i] * self.accrual_fractions[i];
            cfs.push(Cashflow::new(
                self.pay_dates[i],
                sign * base * self.fixed_rate,
                self.currency,
            ));
            cfs.push(Cashflow::new(
                self.pay_dates[i],
                -sign * base * (floating + self.spreads[i]),
                self.currency,
            ));
        }
        Ok(cfs)
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
