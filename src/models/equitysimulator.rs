use std::collections::HashMap;
use std::sync::Arc;

use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::StandardNormal;

use crate::core::observables::{MarketObservable, Share};
use crate::core::traits::{NumeraireSimulator, Simulator};
use crate::currencies::enums::Currency;
use crate::math::cholesky::cholesky;
use crate::models::registration::{RegistrationSet, SimulatorState};
use crate::rates::traits::{DiscountingSource, FloatingRateSource};
use crate::time::date::Date;
use crate::time::daycounter::DayCounter;
use crate::utils::errors::{PathwiseError, Result};

/// # EquitySimulator
/// Correlated lognormal share prices under the risk neutral measure of the
/// wrapped discount curve. For each share the drift is the curve forward
/// rate less a continuous dividend yield, so the expected forward price is
/// `spot * exp(-q T) / df(T)`.
///
/// Besides share prices the model realizes dividend amounts, accrued from
/// the previous grid date as `S(prev) * q * dt`, and passes floating rate
/// queries through to deterministic forecast curves. The numeraire is the
/// inverse curve discount factor.
#[derive(Clone)]
pub struct EquitySimulator {
    shares: Vec<Share>,
    spot_prices: Vec<f64>,
    vols: Vec<f64>,
    div_yields: Vec<f64>,
    correlations: Vec<Vec<f64>>,
    discount_curve: Arc<dyn DiscountingSource>,
    rate_forecasts: HashMap<String, Arc<dyn FloatingRateSource>>,
    seed: u64,
    // set up by prepare
    registrations: RegistrationSet,
    numeraire_dates: Vec<Date>,
    state: SimulatorState,
    chol: Vec<Vec<f64>>,
    grid_dates: Vec<Date>,
    grid_times: Vec<f64>,
    grid_dfs: Vec<f64>,
    // per-path share prices, one row per share along the grid
    paths: Vec<Vec<f64>>,
}

impl EquitySimulator {
    pub fn new(
        shares: Vec<Share>,
        spot_prices: Vec<f64>,
        vols: Vec<f64>,
        div_yields: Vec<f64>,
        correlations: Vec<Vec<f64>>,
        discount_curve: Arc<dyn DiscountingSource>,
        rate_forecasts: Vec<Arc<dyn FloatingRateSource>>,
    ) -> Result<EquitySimulator> {
        let n = shares.len();
        if spot_prices.len() != n || vols.len() != n || div_yields.len() != n {
            return Err(PathwiseError::SizeMismatchErr(format!(
                "EquitySimulator: {} shares but {} prices, {} vols, {} dividend yields",
                n,
                spot_prices.len(),
                vols.len(),
                div_yields.len()
            )));
        }
        if correlations.len() != n || correlations.iter().any(|row| row.len() != n) {
            return Err(PathwiseError::SizeMismatchErr(format!(
                "EquitySimulator: correlation matrix must be {}x{}",
                n, n
            )));
        }
        for share in &shares {
            if share.currency() != discount_curve.currency() {
                return Err(PathwiseError::InvalidValueErr(format!(
                    "EquitySimulator: share {} is not in the curve currency {}",
                    share.ticker(),
                    discount_curve.currency()
                )));
            }
        }
        let rate_forecasts = rate_forecasts
            .into_iter()
            .map(|f| {
                let key = MarketObservable::RateIndex(f.index().clone()).key();
                (key, f)
            })
            .collect();
        Ok(EquitySimulator {
            shares,
            spot_prices,
            vols,
            div_yields,
            correlations,
            discount_curve,
            rate_forecasts,
            seed: 0,
            registrations: RegistrationSet::new(),
            numeraire_dates: Vec::new(),
            state: SimulatorState::Registering,
            chol: Vec::new(),
            grid_dates: Vec::new(),
            grid_times: Vec::new(),
            grid_dfs: Vec::new(),
            paths: Vec::new(),
        })
    }

    pub fn with_seed(mut self, seed: u64) -> EquitySimulator {
        self.seed = seed;
        self
    }

    fn share_position(&self, share: &Share) -> Option<usize> {
        self.shares.iter().position(|s| s == share)
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

impl Simulator for EquitySimulator {
    fn name(&self) -> String {
        format!("EquitySimulator({})", self.discount_curve.currency())
    }

    fn reset(&mut self) {
        self.registrations.clear();
        self.numeraire_dates.clear();
        self.chol.clear();
        self.grid_dates.clear();
        self.grid_times.clear();
        self.grid_dfs.clear();
        self.paths.clear();
        self.state = SimulatorState::Registering;
    }

    fn provides_index(&self, observable: &MarketObservable) -> bool {
        match observable {
            MarketObservable::Share(share) => self.share_position(share).is_some(),
            MarketObservable::Dividend(share) => self.share_position(share).is_some(),
            MarketObservable::RateIndex(_) => self.rate_forecasts.contains_key(&observable.key()),
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
        self.chol = cholesky(&self.correlations)?;
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
        self.grid_dfs = grid
            .iter()
            .map(|d| self.discount_curve.discount_factor(*d))
            .collect::<Result<Vec<f64>>>()?;
        self.paths = vec![vec![0.0; grid.len()]; self.shares.len()];
        self.grid_dates = grid;
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
        let n = self.shares.len();
        for (s, path) in self.paths.iter_mut().enumerate() {
            path[0] = self.spot_prices[s];
        }
        for k in 0..self.grid_dates.len() - 1 {
            let dt = self.grid_times[k + 1] - self.grid_times[k];
            let sdt = dt.sqrt();
            let df_ratio = self.grid_dfs[k] / self.grid_dfs[k + 1];
            let z: Vec<f64> = (0..n).map(|_| rng.sample(StandardNormal)).collect();
            for s in 0..n {
                let w: f64 = (0..=s).map(|j| self.chol[s][j] * z[j]).sum();
                let drift = (-self.div_yields[s] - 0.5 * self.vols[s] * self.vols[s]) * dt;
                self.paths[s][k + 1] =
                    self.paths[s][k] * (drift + self.vols[s] * sdt * w).exp() * df_ratio;
            }
        }
        self.state = SimulatorState::PathReady;
        Ok(())
    }

    fn indices(&self, observable: &MarketObservable, dates: &[Date]) -> Result<Vec<f64>> {
        self.check_path_ready()?;
        self.registrations
            .check_subset(&self.name(), &observable.key(), dates)?;
        match observable {
            MarketObservable::Share(share) => {
                let s = self.share_position(share).ok_or_else(|| {
                    PathwiseError::NotFoundErr(format!(
                        "{} does not provide {}",
                        self.name(),
                        observable
                    ))
                })?;
                dates
                    .iter()
                    .map(|date| Ok(self.paths[s][self.grid_position(*date)?]))
                    .collect()
            }
            MarketObservable::Dividend(share) => {
                let s = self.share_position(share).ok_or_else(|| {
                    PathwiseError::NotFoundErr(format!(
                        "{} does not provide {}",
                        self.name(),
                        observable
                    ))
                })?;
                dates
                    .iter()
                    .map(|date| {
                        let pos = self.grid_position(*date)?;
                        if pos == 0 {
                            return Ok(0.0);
                        }
                        let dt = self.grid_times[pos] - self.grid_times[pos - 1];
                        Ok(self.paths[s][pos - 1] * self.div_yields[s] * dt)
                    })
                    .collect()
            }
            MarketObservable::RateIndex(_) => {
                let forecast = self.rate_forecasts.get(&observable.key()).ok_or_else(|| {
                    PathwiseError::NotFoundErr(format!(
                        "{} does not provide {}",
                        self.name(),
                        observable
                    ))
                })?;
                dates.iter().map(|d| forecast.forward_rate(*d)).collect()
            }
            _ => Err(PathwiseError::NotFoundErr(format!(
                "{} does not provide {}",
                self.name(),
                observable
            ))),
        }
    }

    fn underlying_factors(&self, date: Date) -> Result<Vec<f64>> {
        self.check_path_ready()?;
        let pos = self.grid_position(date)?;
        Ok(self.paths.iter().map(|path| path[pos]).collect())
    }

    fn box_clone(&self) -> Box<dyn Simulator> {
        Box::new(self.clone())
    }
}

impl NumeraireSimulator for EquitySimulator {
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
        // so the share path can be observed at exposure horizons
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
