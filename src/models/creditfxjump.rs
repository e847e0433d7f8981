use std::sync::Arc;

use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::StandardNormal;

use crate::core::observables::{CurrencyPair, MarketObservable};
use crate::core::traits::{NumeraireSimulator, Simulator};
use crate::currencies::enums::Currency;
use crate::models::registration::{RegistrationSet, SimulatorState};
use crate::rates::traits::{DiscountingSource, FxSource, SurvivalProbabilitySource};
use crate::time::date::Date;
use crate::time::daycounter::DayCounter;
use crate::utils::errors::{PathwiseError, Result};

/// # DeterministicCreditWithFxJump
/// Default times drawn from a survival curve together with a lognormal
/// exchange rate that jumps by a fixed relative amount when the reference
/// entity defaults. Discounting is deterministic off the counter currency
/// curve, so the numeraire carries no path state.
///
/// The default time is sampled by inverse transform on the survival
/// curve: one uniform per path, and the default date is the first date
/// whose survival probability falls to or below it. Paths whose uniform
/// is never reached within the modeling horizon realize a default date a
/// hundred years out. The exchange rate follows the forward FX curve with
/// lognormal noise, multiplied by `1 + jump_in_default` from the default
/// date onward. The default draw is independent of the FX noise.
#[derive(Clone)]
pub struct DeterministicCreditWithFxJump {
    hazard_curve: Arc<dyn SurvivalProbabilitySource>,
    pair: CurrencyPair,
    fx_forecast: Arc<dyn FxSource>,
    discount_curve: Arc<dyn DiscountingSource>,
    fx_vol: f64,
    jump_in_default: f64,
    expected_recovery: f64,
    seed: u64,
    // registration state
    registrations: RegistrationSet,
    numeraire_dates: Vec<Date>,
    state: SimulatorState,
    anchor_date: Option<Date>,
    grid_dates: Vec<Date>,
    grid_times: Vec<f64>,
    forward_fx: Vec<f64>,
    // path state, overwritten by each run_simulation
    fx: Vec<f64>,
    default_date: Option<Date>,
}

impl DeterministicCreditWithFxJump {
    pub fn new(
        hazard_curve: Arc<dyn SurvivalProbabilitySource>,
        pair: CurrencyPair,
        fx_forecast: Arc<dyn FxSource>,
        discount_curve: Arc<dyn DiscountingSource>,
        fx_vol: f64,
        jump_in_default: f64,
        expected_recovery: f64,
    ) -> Result<DeterministicCreditWithFxJump> {
        if discount_curve.currency() != pair.counter() {
            return Err(PathwiseError::InvalidValueErr(format!(
                "discount curve is in {} but the pair counter currency is {}",
                discount_curve.currency(),
                pair.counter()
            )));
        }
        if fx_forecast.currency_pair() != pair {
            return Err(PathwiseError::InvalidValueErr(format!(
                "FX forecast is for {}{} but the model pair is {}{}",
                fx_forecast.currency_pair().base(),
                fx_forecast.currency_pair().counter(),
                pair.base(),
                pair.counter()
            )));
        }
        if jump_in_default <= -1.0 {
            return Err(PathwiseError::InvalidValueErr(format!(
                "relative FX jump {} would make the rate non positive",
                jump_in_default
            )));
        }
        if !(0.0..=1.0).contains(&expected_recovery) {
            return Err(PathwiseError::InvalidValueErr(format!(
                "expected recovery {} is outside [0, 1]",
                expected_recovery
            )));
        }
        Ok(DeterministicCreditWithFxJump {
            hazard_curve,
            pair,
            fx_forecast,
            discount_curve,
            fx_vol,
            jump_in_default,
            expected_recovery,
            seed: 0,
            registrations: RegistrationSet::new(),
            numeraire_dates: Vec::new(),
            state: SimulatorState::Registering,
            anchor_date: None,
            grid_dates: Vec::new(),
            grid_times: Vec::new(),
            forward_fx: Vec::new(),
            fx: Vec::new(),
            default_date: None,
        })
    }

    pub fn with_seed(mut self, seed: u64) -> DeterministicCreditWithFxJump {
        self.seed = seed;
        self
    }

    fn anchor_date(&self) -> Result<Date> {
        self.anchor_date.ok_or_else(|| {
            PathwiseError::LifecycleErr(format!("{}: prepare has not been called", self.name()))
        })
    }

    fn default_date(&self) -> Result<Date> {
        self.default_date.ok_or_else(|| {
            PathwiseError::LifecycleErr(format!(
                "{}: no simulated path available",
                self.name()
            ))
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

    /// First date whose survival probability is at or below the uniform
    /// draw, by bisection on the day count.
    fn sample_default_date(&self, uniform: f64) -> Result<Date> {
        let anchor = self.anchor_date()?;
        let horizon = anchor.add_years(100);
        if self.hazard_curve.survival_probability(horizon)? > uniform {
            return Ok(horizon);
        }
        let mut lo = anchor.serial();
        let mut hi = horizon.serial();
        while hi - lo > 1 {
            let mid = (lo + hi) / 2;
            if self
                .hazard_curve
                .survival_probability(Date::from_serial(mid))?
                > uniform
            {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        Ok(Date::from_serial(hi))
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

impl Simulator for DeterministicCreditWithFxJump {
    fn name(&self) -> String {
        format!(
            "DeterministicCreditWithFxJump({}, {}{})",
            self.hazard_curve.reference_entity(),
            self.pair.base(),
            self.pair.counter()
        )
    }

    fn reset(&mut self) {
        self.registrations.clear();
        self.numeraire_dates.clear();
        self.grid_dates.clear();
        self.grid_times.clear();
        self.forward_fx.clear();
        self.fx.clear();
        self.default_date = None;
        self.anchor_date = None;
        self.state = SimulatorState::Registering;
    }

    fn provides_index(&self, observable: &MarketObservable) -> bool {
        match observable {
            MarketObservable::DefaultTime(entity) | MarketObservable::DefaultRecovery(entity) => {
                entity == self.hazard_curve.reference_entity()
            }
            MarketObservable::CurrencyPair(pair) => *pair == self.pair,
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
        self.forward_fx = grid
            .iter()
            .map(|d| self.fx_forecast.fx_rate(*d))
            .collect::<Result<Vec<f64>>>()?;
        self.fx = vec![0.0; grid.len()];
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
        let uniform: f64 = rng.gen();
        let default_date = self.sample_default_date(uniform)?;
        let vol = self.fx_vol;
        let mut w = 0.0;
        self.fx[0] = self.forward_fx[0];
        for k in 0..self.grid_dates.len() - 1 {
            let dt = self.grid_times[k + 1] - self.grid_times[k];
            let z: f64 = rng.sample(StandardNormal);
            w += dt.sqrt() * z;
            self.fx[k + 1] = self.forward_fx[k + 1]
                * (vol * w - 0.5 * vol * vol * self.grid_times[k + 1]).exp();
        }
        for k in 0..self.grid_dates.len() {
            if self.grid_dates[k] >= default_date {
                self.fx[k] *= 1.0 + self.jump_in_default;
            }
        }
        self.default_date = Some(default_date);
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
        self.registrations
            .check_subset(&self.name(), &observable.key(), dates)?;
        match observable {
            MarketObservable::DefaultTime(_) => {
                let serial = self.default_date()?.serial() as f64;
                Ok(vec![serial; dates.len()])
            }
            MarketObservable::DefaultRecovery(_) => {
                Ok(vec![self.expected_recovery; dates.len()])
            }
            MarketObservable::CurrencyPair(_) => dates
                .iter()
                .map(|date| Ok(self.fx[self.grid_position(*date)?]))
                .collect(),
            _ => unreachable!(),
        }
    }

    fn underlying_factors(&self, date: Date) -> Result<Vec<f64>> {
        self.check_path_ready()?;
        let pos = self.grid_position(date)?;
        let defaulted = if self.default_date()? <= date { 1.0 } else { 0.0 };
        Ok(vec![self.fx[pos], defaulted])
    }

    fn box_clone(&self) -> Box<dyn Simulator> {
        Box::new(self.clone())
    }
}

impl NumeraireSimulator for DeterministicCreditWithFxJump {
    fn numeraire_currency(&self) -> Currency {
        self.discount_curve.currency()
    }

    fn set_numeraire_dates(&mut self, dates: &[Date]) -> Result<()> {
        if self.state != SimulatorState::Registering {
            return Err(PathwiseError::LifecycleErr(format!(
                "{}: set_numeraire_dates after prepare",
                self.name()
            )));
        }
        // discounting itself is curve based, but the dates join the grid
        // so the exchange rate can be observed at exposure horizons
        self.numeraire_dates.extend_from_slice(dates);
        self.numeraire_dates.sort();
        self.numeraire_dates.dedup();
        Ok(())
    }

    fn numeraire(&self, date: Date) -> Result<f64> {
        Ok(1.0 / self.discount_curve.discount_factor(date)?)
    }

    fn box_clone_numeraire(&self) -> Box<dyn NumeraireSimulator> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::observables::RefEntity;
    use crate::rates::curves::{DatesAndRates, FxForecastCurve, HazardCurve};

    fn anchor() -> Date {
        Date::new(2016, 11, 25)
    }

    fn entity() -> RefEntity {
        RefEntity::new("ABC")
    }

    fn hazard_rate() -> f64 {
        0.025 / 0.6
    }

    fn model(fx_vol: f64) -> DeterministicCreditWithFxJump {
        let far = anchor().add_years(10);
        let usd = Arc::new(
            DatesAndRates::new(
                Currency::USD,
                anchor(),
                vec![(anchor(), 0.01), (far, 0.02)],
            )
            .unwrap(),
        );
        let zar = Arc::new(
            DatesAndRates::new(
                Currency::ZAR,
                anchor(),
                vec![(anchor(), 0.07), (far, 0.08)],
            )
            .unwrap(),
        );
        let pair = CurrencyPair::new(Currency::USD, Currency::ZAR);
        let hazard = Arc::new(
            HazardCurve::new(
                entity(),
                anchor(),
                vec![(anchor(), hazard_rate()), (far, hazard_rate())],
            )
            .unwrap(),
        );
        let fx = Arc::new(FxForecastCurve::new(pair, 1.0, usd, zar.clone()).unwrap());
        DeterministicCreditWithFxJump::new(hazard, pair, fx, zar, fx_vol, -0.2, 0.4).unwrap()
    }

    #[test]
    fn test_curve_and_pair_mismatches_rejected() {
        let far = anchor().add_years(10);
        let usd = Arc::new(DatesAndRates::flat(Currency::USD, anchor(), 0.01).unwrap());
        let zar = Arc::new(DatesAndRates::flat(Currency::ZAR, anchor(), 0.07).unwrap());
        let pair = CurrencyPair::new(Currency::USD, Currency::ZAR);
        let hazard = Arc::new(
            HazardCurve::new(entity(), anchor(), vec![(anchor(), 0.04), (far, 0.04)]).unwrap(),
        );
        let fx =
            Arc::new(FxForecastCurve::new(pair, 1.0, usd.clone(), zar.clone()).unwrap());

        // discount curve must be in the counter currency
        assert!(DeterministicCreditWithFxJump::new(
            hazard.clone(),
            pair,
            fx.clone(),
            usd,
            0.15,
            -0.2,
            0.4,
        )
        .is_err());
        // a jump at or below -100% is not a rate
        assert!(
            DeterministicCreditWithFxJump::new(hazard, pair, fx, zar, 0.15, -1.0, 0.4).is_err()
        );
    }

    #[test]
    fn test_default_frequency_matches_hazard() {
        let mut sim = model(0.15);
        let observable = MarketObservable::DefaultTime(entity());
        let date = anchor().add_years(5);
        sim.reset();
        sim.set_required_dates(&observable, &[date]).unwrap();
        sim.prepare(anchor()).unwrap();

        let horizon = anchor().add_years(2);
        let n = 20000;
        let mut defaulted = 0;
        for i in 0..n {
            sim.run_simulation(i).unwrap();
            let serial = sim.indices(&observable, &[date]).unwrap()[0];
            if Date::from_serial(serial as i64) <= horizon {
                defaulted += 1;
            }
        }
        let frac = defaulted as f64 / n as f64;
        let t = (horizon - anchor()) as f64 / 365.0;
        let expected = 1.0 - (-hazard_rate() * t).exp();
        assert!(
            (frac - expected).abs() < 0.01,
            "default fraction {} vs {}",
            frac,
            expected
        );
    }

    #[test]
    fn test_fx_jumps_at_default() {
        // with no diffusion the rate sits on the forward curve until
        // default and drops by the jump from then on
        let mut sim = model(0.0);
        let time_obs = MarketObservable::DefaultTime(entity());
        let fx_obs =
            MarketObservable::CurrencyPair(CurrencyPair::new(Currency::USD, Currency::ZAR));
        let date = anchor().add_years(4);
        sim.reset();
        sim.set_required_dates(&time_obs, &[date]).unwrap();
        sim.set_required_dates(&fx_obs, &[date]).unwrap();
        sim.prepare(anchor()).unwrap();

        let mut seen_defaulted = false;
        let mut seen_alive = false;
        for i in 0..500 {
            sim.run_simulation(i).unwrap();
            let default_serial = sim.indices(&time_obs, &[date]).unwrap()[0];
            let fx = sim.indices(&fx_obs, &[date]).unwrap()[0];
            let expected = sim.forward_fx[sim.grid_position(date).unwrap()];
            if Date::from_serial(default_serial as i64) <= date {
                assert!((fx - expected * 0.8).abs() < 1e-12);
                seen_defaulted = true;
            } else {
                assert!((fx - expected).abs() < 1e-12);
                seen_alive = true;
            }
            if seen_defaulted && seen_alive {
                break;
            }
        }
        assert!(seen_defaulted && seen_alive);
    }

    #[test]
    fn test_expected_fx_includes_jump_probability() {
        // E[fx(t)] = F(t) * (1 + J * (1 - S(t))) since the diffusion is
        // driftless and independent of the default draw
        let mut sim = model(0.15);
        let fx_obs =
            MarketObservable::CurrencyPair(CurrencyPair::new(Currency::USD, Currency::ZAR));
        let date = anchor().add_years(2);
        sim.reset();
        sim.set_required_dates(&fx_obs, &[date]).unwrap();
        sim.prepare(anchor()).unwrap();

        let n = 20000;
        let mut sum = 0.0;
        for i in 0..n {
            sim.run_simulation(i).unwrap();
            sum += sim.indices(&fx_obs, &[date]).unwrap()[0];
        }
        let mean = sum / n as f64;
        let t = (date - anchor()) as f64 / 365.0;
        let forward = sim.forward_fx[sim.grid_position(date).unwrap()];
        let survival = (-hazard_rate() * t).exp();
        let expected = forward * (1.0 - 0.2 * (1.0 - survival));
        assert!(
            (mean - expected).abs() < expected * 0.01,
            "mean {} vs {}",
            mean,
            expected
        );
    }

    #[test]
    fn test_recovery_and_reproducibility() {
        let mut sim = model(0.15);
        let time_obs = MarketObservable::DefaultTime(entity());
        let recovery_obs = MarketObservable::DefaultRecovery(entity());
        let fx_obs =
            MarketObservable::CurrencyPair(CurrencyPair::new(Currency::USD, Currency::ZAR));
        let date = anchor().add_years(1);
        sim.reset();
        sim.set_required_dates(&time_obs, &[date]).unwrap();
        sim.set_required_dates(&recovery_obs, &[date]).unwrap();
        sim.set_required_dates(&fx_obs, &[date]).unwrap();
        sim.prepare(anchor()).unwrap();

        sim.run_simulation(3).unwrap();
        assert_eq!(sim.indices(&recovery_obs, &[date]).unwrap(), vec![0.4]);
        let first_time = sim.indices(&time_obs, &[date]).unwrap();
        let first_fx = sim.indices(&fx_obs, &[date]).unwrap();
        sim.run_simulation(4).unwrap();
        sim.run_simulation(3).unwrap();
        assert_eq!(sim.indices(&time_obs, &[date]).unwrap(), first_time);
        assert_eq!(sim.indices(&fx_obs, &[date]).unwrap(), first_fx);
    }

    #[test]
    fn test_lifecycle_and_registration_errors() {
        let mut sim = model(0.15);
        let fx_obs =
            MarketObservable::CurrencyPair(CurrencyPair::new(Currency::USD, Currency::ZAR));
        let date = anchor().add_years(1);
        assert!(sim.run_simulation(0).is_err());
        sim.reset();
        sim.set_required_dates(&fx_obs, &[date]).unwrap();
        assert!(sim
            .set_required_dates(
                &MarketObservable::DefaultTime(RefEntity::new("XYZ")),
                &[date]
            )
            .is_err());
        sim.prepare(anchor()).unwrap();
        assert!(sim.indices(&fx_obs, &[date]).is_err());
        sim.run_simulation(0).unwrap();
        assert!(matches!(
            sim.indices(&fx_obs, &[anchor().add_years(2)]),
            Err(PathwiseError::NotFoundErr(_))
        ));
    }
}
