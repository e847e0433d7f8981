use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::StandardNormal;

use crate::core::observables::{FloatRateIndex, MarketObservable};
use crate::core::traits::{NumeraireSimulator, Simulator};
use crate::currencies::enums::Currency;
use crate::models::registration::{RegistrationSet, SimulatorState};
use crate::time::date::Date;
use crate::time::daycounter::DayCounter;
use crate::utils::errors::{PathwiseError, Result};

/// # HullWhite1F
/// One-factor Hull-White short rate simulator on a flat continuously
/// compounded initial curve:
///
/// $$ dr = (\theta(t) - a r)\,dt + \sigma\,dW $$
///
/// The short rate is simulated with the exact Gaussian transition on the
/// union of all registered dates, the numeraire is the bank account
/// integrated along the path, and forward rates for registered forecast
/// indices come from the closed-form Hull-White bond price at the
/// simulated short rate. Draws for path `i` are generated from a stream
/// seeded by `i`, so rerunning a path reproduces it bit for bit.
#[derive(Clone)]
pub struct HullWhite1F {
    currency: Currency,
    mean_reversion: f64,
    vol: f64,
    r0: f64,
    curve_rate: f64,
    seed: u64,
    forecast_indices: Vec<FloatRateIndex>,
    // registration state
    registrations: RegistrationSet,
    numeraire_dates: Vec<Date>,
    state: SimulatorState,
    anchor_date: Option<Date>,
    grid_dates: Vec<Date>,
    grid_times: Vec<f64>,
    // path state, overwritten by each run_simulation
    short_rate: Vec<f64>,
    bank_account: Vec<f64>,
}

impl HullWhite1F {
    /// `curve_rate` is the flat NACC rate of the initial curve and `r0`
    /// the short rate at the anchor date (equal for a curve-consistent
    /// start).
    pub fn new(
        currency: Currency,
        mean_reversion: f64,
        vol: f64,
        r0: f64,
        curve_rate: f64,
    ) -> HullWhite1F {
        HullWhite1F {
            currency,
            mean_reversion,
            vol,
            r0,
            curve_rate,
            seed: 0,
            forecast_indices: Vec::new(),
            registrations: RegistrationSet::new(),
            numeraire_dates: Vec::new(),
            state: SimulatorState::Registering,
            anchor_date: None,
            grid_dates: Vec::new(),
            grid_times: Vec::new(),
            short_rate: Vec::new(),
            bank_account: Vec::new(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> HullWhite1F {
        self.seed = seed;
        self
    }

    /// Declares a floating index this model will forecast. The index must
    /// be in the model's currency.
    pub fn add_forecast(&mut self, index: FloatRateIndex) -> Result<()> {
        if index.currency() != self.currency {
            return Err(PathwiseError::InvalidValueErr(format!(
                "{} cannot forecast {}: wrong currency",
                self.name(),
                index
            )));
        }
        if !self.forecast_indices.contains(&index) {
            self.forecast_indices.push(index);
        }
        Ok(())
    }

    fn anchor_date(&self) -> Result<Date> {
        self.anchor_date.ok_or_else(|| {
            PathwiseError::LifecycleErr(format!("{}: prepare has not been called", self.name()))
        })
    }

    fn grid_position(&self, date: Date) -> Result<usize> {
        self.grid_dates.binary_search(&date).map_err(|_| {
            PathwiseError::NotFoundErr(format!(
                "{}: date {} is not on the simulation grid",
                self.name(),
                date
            ))
        })
    }

    /// E[r(t)] offset for the flat initial curve,
    /// `alpha(t) = f(0,t) + sigma^2/(2 a^2) (1 - e^{-a t})^2`.
    fn alpha(&self, t: f64) -> f64 {
        let a = self.mean_reversion;
        let b = 1.0 - (-a * t).exp();
        self.curve_rate + self.vol * self.vol / (2.0 * a * a) * b * b
    }

    /// Zero coupon bond price `P(t, t + tau)` given the short rate at `t`,
    /// from the affine Hull-White formula on the flat initial curve.
    fn bond_price(&self, t: f64, tau: f64, short_rate: f64) -> f64 {
        let a = self.mean_reversion;
        let b = (1.0 - (-a * tau).exp()) / a;
        let ln_a = -self.curve_rate * tau + b * self.curve_rate
            - self.vol * self.vol / (4.0 * a) * (1.0 - (-2.0 * a * t).exp()) * b * b;
        (ln_a - b * short_rate).exp()
    }

    fn check_path_ready(&self) -> Result<()> {
        if self.state != SimulatorState::PathReady {
            return Err(PathwiseError::LifecycleErr(format!(
                "{}: no simulated path available",
                self.name()
            )));
        }
        Ok(())
    }
}

impl Simulator for HullWhite1F {
    fn name(&self) -> String {
        format!("HullWhite1F({})", self.currency)
    }

    fn reset(&mut self) {
        self.registrations.clear();
        self.numeraire_dates.clear();
        self.grid_dates.clear();
        self.grid_times.clear();
        self.short_rate.clear();
        self.bank_account.clear();
        self.anchor_date = None;
        self.state = SimulatorState::Registering;
    }

    fn provides_index(&self, observable: &MarketObservable) -> bool {
        match observable {
            MarketObservable::RateIndex(index) => self.forecast_indices.contains(index),
            _ => false,
        }
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

    fn prepare(&mut self, anchor_date: Date) -> Result<()> {
        if self.state != SimulatorState::Registering {
            return Err(PathwiseError::LifecycleErr(format!(
                "{}: prepare called twice",
                self.name()
            )));
        }
        let mut grid = self.registrations.all_dates();
        grid.extend_from_slice(&self.numeraire_dates);
        grid.push(anchor_date);
        grid.sort();
        grid.dedup();
        if grid[0] < anchor_date {
            return Err(PathwiseError::InvalidValueErr(format!(
                "{}: registered date {} is before the anchor {}",
                self.name(),
                grid[0],
                anchor_date
            )));
        }
        self.grid_times = grid
            .iter()
            .map(|d| DayCounter::Actual365.year_fraction(anchor_date, *d))
            .collect();
        self.short_rate = vec![0.0; grid.len()];
        self.bank_account = vec![1.0; grid.len()];
        self.grid_dates = grid;
        self.anchor_date = Some(anchor_date);
        self.state = SimulatorState::Prepared;
        Ok(())
    }

    fn run_simulation(&mut self, path_index: usize) -> Result<()> {
        if self.state == SimulatorState::Registering {
            return Err(PathwiseError::LifecycleErr(format!(
                "{}: run_simulation before prepare",
                self.name()
            )));
        }
        let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(path_index as u64));
        let a = self.mean_reversion;
        self.short_rate[0] = self.r0;
        self.bank_account[0] = 1.0;
        for k in 0..self.grid_dates.len() - 1 {
            let dt = self.grid_times[k + 1] - self.grid_times[k];
            let decay = (-a * dt).exp();
            let mean = self.short_rate[k] * decay + self.alpha(self.grid_times[k + 1])
                - self.alpha(self.grid_times[k]) * decay;
            let sd = self.vol * ((1.0 - (-2.0 * a * dt).exp()) / (2.0 * a)).sqrt();
            let z: f64 = rng.sample(StandardNormal);
            self.short_rate[k + 1] = mean + sd * z;
            // trapezoidal integration of the short rate path
            self.bank_account[k + 1] = self.bank_account[k]
                * (0.5 * (self.short_rate[k] + self.short_rate[k + 1]) * dt).exp();
        }
        self.state = SimulatorState::PathReady;
        Ok(())
    }

    fn indices(&self, observable: &MarketObservable, dates: &[Date]) -> Result<Vec<f64>> {
        self.check_path_ready()?;
        if !self.provides_index(observable) {
            return Err(PathwiseError::NotFoundErr(format!(
                "{} does not provide {}",
                self.name(),
                observable
            )));
        }
        let key = observable.key();
        self.registrations.check_subset(&self.name(), &key, dates)?;
        let index = match observable {
            MarketObservable::RateIndex(index) => index,
            _ => unreachable!(),
        };
        dates
            .iter()
            .map(|date| {
                let pos = self.grid_position(*date)?;
                let end = *date + index.tenor();
                let accrual = DayCounter::Actual365.year_fraction(*date, end);
                let df = self.bond_price(self.grid_times[pos], accrual, self.short_rate[pos]);
                Ok((1.0 / df - 1.0) / accrual)
            })
            .collect()
    }

    fn underlying_factors(&self, date: Date) -> Result<Vec<f64>> {
        self.check_path_ready()?;
        Ok(vec![self.short_rate[self.grid_position(date)?]])
    }

    fn box_clone(&self) -> Box<dyn Simulator> {
        Box::new(self.clone())
    }
}

impl NumeraireSimulator for HullWhite1F {
    fn numeraire_currency(&self) -> Currency {
        self.currency
    }

    fn set_numeraire_dates(&mut self, dates: &[Date]) -> Result<()> {
        if self.state != SimulatorState::Registering {
            return Err(PathwiseError::LifecycleErr(format!(
                "{}: set_numeraire_dates after prepare",
                self.name()
            )));
        }
        self.numeraire_dates.extend_from_slice(dates);
        self.numeraire_dates.sort();
        self.numeraire_dates.dedup();
        Ok(())
    }

    fn numeraire(&self, date: Date) -> Result<f64> {
        self.check_path_ready()?;
        let _ = self.anchor_date()?;
        Ok(self.bank_account[self.grid_position(date)?])
    }

    fn box_clone_numeraire(&self) -> Box<dyn NumeraireSimulator> {
        Box::new(self.clone())
    }
}
