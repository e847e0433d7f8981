use serde::{Deserialize, Serialize};

use crate::core::cashflow::Cashflow;
use crate::core::observables::{MarketObservable, RefEntity};
use crate::core::traits::Product;
use crate::currencies::enums::Currency;
use crate::time::date::Date;
use crate::utils::errors::{PathwiseError, Result};

/// # Cds
/// A single-name credit default swap. While the reference entity is
/// alive, each period pays `notional * accrual * spread` on its end date
/// (paid by the protection buyer). On the first payment date on or after
/// the path's default time the protection amount
/// `notional * (1 - recovery)` is received instead, and the contract
/// terminates.
///
/// The default time and recovery rate are path-scoped state realized by a
/// credit-capable simulator: `reset` clears them, and `cashflows` fails
/// if they were never injected while any period is live.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Cds {
    // contractual terms, fixed at construction
    ref_entity: RefEntity,
    currency: Currency,
    pay_dates: Vec<Date>,
    notionals: Vec<f64>,
    spreads: Vec<f64>,
    accrual_fractions: Vec<f64>,
    bought_protection: bool,
    // path-scoped state
    value_date: Option<Date>,
    default_date: Option<Date>,
    recovery: Option<f64>,
}

impl Cds {
    pub fn new(
        ref_entity: RefEntity,
        currency: Currency,
        pay_dates: Vec<Date>,
        notionals: Vec<f64>,
        spreads: Vec<f64>,
        accrual_fractions: Vec<f64>,
        bought_protection: bool,
    ) -> Result<Cds> {
        let n = pay_dates.len();
        if n == 0 {
            return Err(PathwiseError::InvalidValueErr(
                "CDS must have at least one payment date".to_string(),
            ));
        }
        if notionals.len() != n || spreads.len() != n || accrual_fractions.len() != n {
            return Err(PathwiseError::SizeMismatchErr(format!(
                "CDS: {} payment dates but {} notionals, {} spreads, {} accrual fractions",
                n,
                notionals.len(),
                spreads.len(),
                accrual_fractions.len()
            )));
        }
        if pay_dates.windows(2).any(|w| w[0] >= w[1]) {
            return Err(PathwiseError::InvalidValueErr(
                "CDS payment dates must be strictly increasing".to_string(),
            ));
        }
        Ok(Cds {
            ref_entity,
            currency,
            pay_dates,
            notionals,
            spreads,
            accrual_fractions,
            bought_protection,
            value_date: None,
            default_date: None,
            recovery: None,
        })
    }

    pub fn reference_entity(&self) -> &RefEntity {
        &self.ref_entity
    }

    pub fn maturity_date(&self) -> Date {
        self.pay_dates[self.pay_dates.len() - 1]
    }

    fn value_date(&self) -> Result<Date> {
        self.value_date.ok_or_else(|| {
            PathwiseError::LifecycleErr(format!("{}: value date has not been set", self.name()))
        })
    }

    fn is_live(&self, value_date: Date) -> bool {
        self.maturity_date() > value_date
    }

    fn check_observable(&self, observable: &MarketObservable) -> Result<()> {
        match observable {
            MarketObservable::DefaultTime(entity) | MarketObservable::DefaultRecovery(entity)
                if *entity == self.ref_entity =>
            {
                Ok(())
            }
            _ => Err(PathwiseError::NotFoundErr(format!(
                "{} did not request {}",
                self.name(),
                observable
            ))),
        }
    }
}

impl Product for Cds {
    fn name(&self) -> String {
        format!("CDS({}, {})", self.ref_entity, self.maturity_date())
    }

    fn set_value_date(&mut self, value_date: Date) {
        self.value_date = Some(value_date);
    }

    fn reset(&mut self) {
        self.default_date = None;
        self.recovery = None;
    }

    fn required_indices(&self) -> Vec<MarketObservable> {
        vec![
            MarketObservable::DefaultTime(self.ref_entity.clone()),
            MarketObservable::DefaultRecovery(self.ref_entity.clone()),
        ]
    }

    fn required_index_dates(&self, observable: &MarketObservable) -> Result<Vec<Date>> {
        self.check_observable(observable)?;
        let value_date = self.value_date()?;
        if self.is_live(value_date) {
            Ok(vec![self.maturity_date()])
        } else {
            Ok(Vec::new())
        }
    }

    fn set_index_values(&mut self, observable: &MarketObservable, values: &[f64]) -> Result<()> {
        self.check_observable(observable)?;
        let value_date = self.value_date()?;
        let expected = if self.is_live(value_date) { 1 } else { 0 };
        if values.len() != expected {
            return Err(PathwiseError::SizeMismatchErr(format!(
                "{}: {} values supplied for {} required dates of {}",
                self.name(),
                values.len(),
                expected,
                observable
            )));
        }
        if let Some(value) = values.first() {
            match observable {
                MarketObservable::DefaultTime(_) => {
                    self.default_date = Some(Date::from_serial(value.round() as i64));
                }
                MarketObservable::DefaultRecovery(_) => {
                    self.recovery = Some(*value);
                }
                _ => unreachable!(),
            }
        }
        Ok(())
    }

    fn cashflows(&self) -> Result<Vec<Cashflow>> {
        let value_date = self.value_date()?;
        let mut cfs = Vec::new();
        if !self.is_live(value_date) {
            return Ok(cfs);
        }
        let default_date = self.default_date.ok_or_else(|| {
            PathwiseError::ValueNotSetErr(format!(
                "{}: no default time set for {}",
                self.name(),
                self.ref_entity
            ))
        })?;
        let recovery = self.recovery.ok_or_else(|| {
            PathwiseError::ValueNotSetErr(format!(
                "{}: no recovery rate set for {}",
                self.name(),
                self.ref_entity
            ))
        })?;
        let sign = if self.bought_protection { 1.0 } else { -1.0 };
        for i in 0..self.pay_dates.len() {
            if self.pay_dates[i] <= value_date {
                continue;
            }
            if default_date > self.pay_dates[i] {
                cfs.push(Cashflow::new(
                    self.pay_dates[i],
                    -sign * self.notionals[i] * self.accrual_fractions[i] * self.spreads[i],
                    self.currency,
                ));
            } else {
                // protection settles on the first payment date at or
                // after default, then the contract is over
                cfs.push(Cashflow::new(
                    self.pay_dates[i],
                    sign * self.notionals[i] * (1.0 - recovery),
                    self.currency,
                ));
                break;
            }
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
