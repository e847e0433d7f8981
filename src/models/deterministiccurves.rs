use std::collections::HashMap;
use std::sync::Arc;

use crate::core::observables::MarketObservable;
use crate::core::traits::{NumeraireSimulator, Simulator};
use crate::currencies::enums::Currency;
use crate::models::registration::{RegistrationSet, SimulatorState};
use crate::rates::traits::{DiscountingSource, FloatingRateSource, FxSource};
use crate::time::date::Date;
use crate::utils::errors::{PathwiseError, Result};

/// # DeterministicCurves
/// A degenerate simulator whose "paths" are all identical: floating rates
/// and FX rates are read off deterministic forecast curves, and the
/// numeraire is the inverse discount factor of the wrapped curve. With one
/// path this reduces the coordinator to a plain discounted cashflow
/// calculation.
///
/// Curve sources are shared read-only (`Arc`), so per-path clones are
/// cheap.
#[derive(Clone)]
pub struct DeterministicCurves {
    discount_curve: Arc<dyn DiscountingSource>,
    rate_forecasts: HashMap<String, Arc<dyn FloatingRateSource>>,
    fx_forecasts: HashMap<String, Arc<dyn FxSource>>,
    registrations: RegistrationSet,
    state: SimulatorState,
}

impl DeterministicCurves {
    pub fn new(discount_curve: Arc<dyn DiscountingSource>) -> DeterministicCurves {
        DeterministicCurves {
            discount_curve,
            rate_forecasts: HashMap::new(),
            fx_forecasts: HashMap::new(),
            registrations: RegistrationSet::new(),
            state: SimulatorState::Registering,
        }
    }

    pub fn add_rate_forecast(&mut self, forecast: Arc<dyn FloatingRateSource>) {
        let key = MarketObservable::RateIndex(forecast.index().clone()).key();
        self.rate_forecasts.insert(key, forecast);
    }

    pub fn add_fx_forecast(&mut self, forecast: Arc<dyn FxSource>) {
        let key = MarketObservable::CurrencyPair(forecast.currency_pair()).key();
        self.fx_forecasts.insert(key, forecast);
    }
}

impl Simulator for DeterministicCurves {
    fn name(&self) -> String {
        format!("DeterministicCurves({})", self.discount_curve.currency())
    }

    fn reset(&mut self) {
        self.registrations.clear();
        self.state = SimulatorState::Registering;
    }

    fn provides_index(&self, observable: &MarketObservable) -> bool {
        let key = observable.key();
        self.rate_forecasts.contains_key(&key) || self.fx_forecasts.contains_key(&key)
    }

    fn set_required_dates(&mut self, observable: &MarketObservable, dates: &[Date]) -> Result<()> {
        if self.state != SimulatorState::Registering {
            return Err(PathwiseError::LifecycleErr(format!(
                "{}: set_required_dates after prepare",
                self.name()
            )));
        }
        if !self.provides_index(observable) {
            return Err(PathwiseError::NotFoundErr(format!(
                "{} does not provide {}",
                self.name(),
                observable
            )));
        }
        self.registrations.merge(&observable.key(), dates);
        Ok(())
    }

    fn prepare(&mut self, _anchor_date: Date) -> Result<()> {
        if self.state != SimulatorState::Registering {
            return Err(PathwiseError::LifecycleErr(format!(
                "{}: prepare called twice",
                self.name()
            )));
        }
        self.state = SimulatorState::Prepared;
        Ok(())
    }

    fn run_simulation(&mut self, _path_index: usize) -> Result<()> {
        if self.state == SimulatorState::Registering {
            return Err(PathwiseError::LifecycleErr(format!(
                "{}: run_simulation before prepare",
                self.name()
            )));
        }
        // nothing is random here; the call only advances the lifecycle
        self.state = SimulatorState::PathReady;
        Ok(())
    }

    fn indices(&self, observable: &MarketObservable, dates: &[Date]) -> Result<Vec<f64>> {
        if self.state != SimulatorState::PathReady {
            return Err(PathwiseError::LifecycleErr(format!(
                "{}: indices before run_simulation",
                self.name()
            )));
        }
        let key = observable.key();
        self.registrations.check_subset(&self.name(), &key, dates)?;
        if let Some(forecast) = self.rate_forecasts.get(&key) {
            return dates.iter().map(|d| forecast.forward_rate(*d)).collect();
        }
        if let Some(forecast) = self.fx_forecasts.get(&key) {
            return dates.iter().map(|d| forecast.fx_rate(*d)).collect();
        }
        Err(PathwiseError::NotFoundErr(format!(
            "{} does not provide {}",
            self.name(),
            observable
        )))
    }

    fn underlying_factors(&self, _date: Date) -> Result<Vec<f64>> {
        // every path is the same, there is nothing to condition on
        Ok(Vec::new())
    }

    fn box_clone(&self) -> Box<dyn Simulator> {
        Box::new(self.clone())
    }
}

impl NumeraireSimulator for DeterministicCurves {
    fn numeraire_currency(&self) -> Currency {
        self.discount_curve.currency()
    }

    fn set_numeraire_dates(&mut self, _dates: &[Date]) -> Result<()> {
        // the curve can discount any date at or after its anchor
        Ok(())
    }

    fn numeraire(&self, date: Date) -> Result<f64> {
        Ok(1.0 / self.discount_curve.discount_factor(date)?)
    }

    fn box_clone_numeraire(&self) -> Box<dyn NumeraireSimulator> {
        Box::new(self.clone())
    }
}
