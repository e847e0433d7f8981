use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{debug, info};

use crate::core::observables::{CurrencyPair, MarketObservable};
use crate::core::traits::{NumeraireSimulator, Product, Simulator};
use crate::currencies::enums::Currency;
use crate::math::regression::fitted_values;
use crate::time::date::Date;
use crate::utils::errors::{PathwiseError, Result};

/// # Coordinator
/// Orchestrates a Monte Carlo valuation run: collects every product's
/// observable requirements, registers them with the owning simulators,
/// then evaluates N independent paths and reduces them into a present
/// value or an expected positive exposure profile.
///
/// One `NumeraireSimulator` defines the reporting currency and the
/// per-path discounting; further simulators can own other observables.
/// Each observable must be owned by exactly one simulator. Paths run on
/// the rayon pool in contiguous chunks, each chunk with its own clones of
/// the prepared simulators and products, and the reduction is a plain sum
/// so path order cannot affect the result beyond rounding.
pub struct Coordinator {
    numeraire_simulator: Box<dyn NumeraireSimulator>,
    other_simulators: Vec<Box<dyn Simulator>>,
    path_count: usize,
}

/// Everything one chunk of paths needs: private clones of the prepared
/// simulators and the products, so no path shares mutable state with
/// another.
#[derive(Clone)]
struct PathWorker {
    numeraire_simulator: Box<dyn NumeraireSimulator>,
    other_simulators: Vec<Box<dyn Simulator>>,
    products: Vec<Box<dyn Product>>,
}

impl PathWorker {
    fn owner(&self, observable: &MarketObservable) -> Result<&dyn Simulator> {
        if self.numeraire_simulator.provides_index(observable) {
            return Ok(self.numeraire_simulator.as_ref());
        }
        for simulator in &self.other_simulators {
            if simulator.provides_index(observable) {
                return Ok(simulator.as_ref());
            }
        }
        Err(PathwiseError::NotFoundErr(format!(
            "no simulator provides {}",
            observable
        )))
    }

    /// Evaluates one path: realizes observables, feeds every product,
    /// and returns each resulting cashflow as (pay date, amount in the
    /// reporting currency discounted to the value date).
    fn run_path(&mut self, path_index: usize, value_date: Date) -> Result<Vec<(Date, f64)>> {
        let reporting = self.numeraire_simulator.numeraire_currency();
        self.numeraire_simulator.run_simulation(path_index)?;
        for simulator in &mut self.other_simulators {
            simulator.run_simulation(path_index)?;
        }
        let mut discounted = Vec::new();
        for p in 0..self.products.len() {
            self.products[p].reset();
            for observable in self.products[p].required_indices() {
                let dates = self.products[p].required_index_dates(&observable)?;
                let values = self.owner(&observable)?.indices(&observable, &dates)?;
                self.products[p].set_index_values(&observable, &values)?;
            }
            for cashflow in self.products[p].cashflows()? {
                let amount = if cashflow.currency() == reporting {
                    cashflow.amount()
                } else {
                    let pair = MarketObservable::CurrencyPair(CurrencyPair::new(
                        cashflow.currency(),
                        reporting,
                    ));
                    let fx = self.owner(&pair)?.indices(&pair, &[cashflow.date()])?[0];
                    cashflow.amount() * fx
                };
                let df = self
                    .numeraire_simulator
                    .path_discount_factor(value_date, cashflow.date())?;
                discounted.push((cashflow.date(), amount * df));
            }
        }
        Ok(discounted)
    }

    /// Concatenated underlying factors of every simulator at `date`, for
    /// the current path.
    fn factors(&self, date: Date) -> Result<Vec<f64>> {
        let mut factors = self.numeraire_simulator.underlying_factors(date)?;
        for simulator in &self.other_simulators {
            factors.extend(simulator.underlying_factors(date)?);
        }
        Ok(factors)
    }
}

impl Coordinator {
    pub fn new(
        numeraire_simulator: Box<dyn NumeraireSimulator>,
        other_simulators: Vec<Box<dyn Simulator>>,
        path_count: usize,
    ) -> Result<Coordinator> {
        if path_count == 0 {
            return Err(PathwiseError::InvalidValueErr(
                "Coordinator: path count must be at least 1".to_string(),
            ));
        }
        Ok(Coordinator {
            numeraire_simulator,
            other_simulators,
            path_count,
        })
    }

    pub fn reporting_currency(&self) -> Currency {
        self.numeraire_simulator.numeraire_currency()
    }

    /// Risk neutral present value in the reporting currency: the mean over
    /// N paths of the discounted, converted cashflow total.
    pub fn value(&mut self, products: &[Box<dyn Product>], value_date: Date) -> Result<f64> {
        let mut products = products.to_vec();
        self.register(&mut products, value_date, &[])?;
        info!(
            products = products.len(),
            paths = self.path_count,
            "valuing as of {}",
            value_date
        );
        let chunk_totals = self
            .chunks(products)
            .into_par_iter()
            .map(|(range, mut worker)| {
                let mut total = 0.0;
                for path_index in range {
                    for (_, amount) in worker.run_path(path_index, value_date)? {
                        total += amount;
                    }
                }
                Ok(total)
            })
            .collect::<Result<Vec<f64>>>()?;
        Ok(chunk_totals.iter().sum::<f64>() / self.path_count as f64)
    }

    /// Expected positive exposure profile: for each forward date, the mean
    /// over paths of the positive part of the portfolio's forward value,
    /// discounted to the value date with the path's own numeraire.
    ///
    /// The forward value on a path is not the path's own realized suffix
    /// of cashflows (that would mix in randomness the forward date has not
    /// revealed yet) but the conditional expectation of that suffix given
    /// the model state at the horizon, estimated across paths by least
    /// squares on the simulators' underlying factors. For a deterministic
    /// model the factors are empty and this collapses to the plain
    /// remaining discounted cashflow total.
    pub fn epe(
        &mut self,
        products: &[Box<dyn Product>],
        value_date: Date,
        forward_dates: &[Date],
    ) -> Result<Vec<f64>> {
        if forward_dates.windows(2).any(|w| w[0] >= w[1]) {
            return Err(PathwiseError::InvalidValueErr(
                "Coordinator: forward dates must be strictly increasing".to_string(),
            ));
        }
        if forward_dates.is_empty() {
            return Ok(Vec::new());
        }
        let mut products = products.to_vec();
        self.register(&mut products, value_date, forward_dates)?;
        info!(
            products = products.len(),
            paths = self.path_count,
            horizons = forward_dates.len(),
            "exposure profile as of {}",
            value_date
        );
        // per path: one remaining-value suffix per horizon, plus the
        // factors of every horizon concatenated into one flat row
        let chunk_samples = self
            .chunks(products)
            .into_par_iter()
            .map(|(range, mut worker)| {
                let mut samples = Vec::with_capacity(range.len());
                for path_index in range {
                    let mut cashflows = worker.run_path(path_index, value_date)?;
                    cashflows.sort_by_key(|(date, _)| *date);
                    let mut suffixes = vec![0.0; forward_dates.len()];
                    let mut remaining = 0.0;
                    let mut next = cashflows.len();
                    for (j, forward_date) in forward_dates.iter().enumerate().rev() {
                        while next > 0 && cashflows[next - 1].0 > *forward_date {
                            remaining += cashflows[next - 1].1;
                            next -= 1;
                        }
                        suffixes[j] = remaining;
                    }
                    let mut factors = Vec::with_capacity(forward_dates.len());
                    for forward_date in forward_dates {
                        factors.extend(worker.factors(*forward_date)?);
                    }
                    samples.push((suffixes, factors));
                }
                Ok(samples)
            })
            .collect::<Result<Vec<_>>>()?;
        let samples: Vec<(Vec<f64>, Vec<f64>)> = chunk_samples.into_iter().flatten().collect();
        let factor_count = samples
            .first()
            .map(|(_, f)| f.len() / forward_dates.len())
            .unwrap_or(0);
        let path_count = self.path_count as f64;

        // one regression per horizon, estimating E[remaining value | state]
        (0..forward_dates.len())
            .into_par_iter()
            .map(|j| {
                let targets: Vec<f64> = samples.iter().map(|(s, _)| s[j]).collect();
                let factors: Vec<Vec<f64>> = samples
                    .iter()
                    .map(|(_, f)| f[j * factor_count..(j + 1) * factor_count].to_vec())
                    .collect();
                let fitted = fitted_values(&factors, &targets)?;
                Ok(fitted.iter().map(|v| v.max(0.0)).sum::<f64>() / path_count)
            })
            .collect()
    }

    /// Registration phase: resets every simulator, forwards each product's
    /// observable dates to its owner, pre-registers FX pairs for foreign
    /// cashflow currencies and numeraire dates for all cashflow dates,
    /// then prepares every simulator exactly once.
    fn register(
        &mut self,
        products: &mut [Box<dyn Product>],
        value_date: Date,
        forward_dates: &[Date],
    ) -> Result<()> {
        self.numeraire_simulator.reset();
        for simulator in &mut self.other_simulators {
            simulator.reset();
        }
        let reporting = self.numeraire_simulator.numeraire_currency();
        let mut numeraire_dates = vec![value_date];
        numeraire_dates.extend_from_slice(forward_dates);
        for product in products.iter_mut() {
            product.set_value_date(value_date);
            for observable in product.required_indices() {
                let dates = product.required_index_dates(&observable)?;
                debug!(
                    product = %product.name(),
                    observable = %observable.key(),
                    dates = dates.len(),
                    "registering"
                );
                self.register_with_owner(&observable, &dates)?;
            }
            for currency in product.cashflow_currencies() {
                let dates = product.cashflow_dates(currency);
                if currency != reporting {
                    let pair =
                        MarketObservable::CurrencyPair(CurrencyPair::new(currency, reporting));
                    self.register_with_owner(&pair, &dates)?;
                }
                numeraire_dates.extend_from_slice(&dates);
            }
        }
        self.numeraire_simulator
            .set_numeraire_dates(&numeraire_dates)?;
        self.numeraire_simulator.prepare(value_date)?;
        for simulator in &mut self.other_simulators {
            simulator.prepare(value_date)?;
        }
        Ok(())
    }

    fn register_with_owner(&mut self, observable: &MarketObservable, dates: &[Date]) -> Result<()> {
        let mut owners: Vec<&mut dyn Simulator> = Vec::new();
        if self.numeraire_simulator.provides_index(observable) {
            owners.push(self.numeraire_simulator.as_mut());
        }
        for simulator in &mut self.other_simulators {
            if simulator.provides_index(observable) {
                owners.push(simulator.as_mut());
            }
        }
        match owners.len() {
            0 => Err(PathwiseError::NotFoundErr(format!(
                "no simulator provides {}",
                observable
            ))),
            1 => owners[0].set_required_dates(observable, dates),
            n => Err(PathwiseError::InvalidValueErr(format!(
                "{} is provided by {} simulators, it must have exactly one owner",
                observable, n
            ))),
        }
    }

    /// Splits the path range into one contiguous chunk per rayon thread,
    /// each with its own worker clone. Clones are taken here, serially,
    /// after `prepare`, so every chunk starts from identical state.
    fn chunks(&self, products: Vec<Box<dyn Product>>) -> Vec<(std::ops::Range<usize>, PathWorker)> {
        let worker = PathWorker {
            numeraire_simulator: self.numeraire_simulator.clone(),
            other_simulators: self.other_simulators.clone(),
            products,
        };
        let n_chunks = rayon::current_num_threads().max(1).min(self.path_count);
        let chunk_size = self.path_count.div_ceil(n_chunks);
        let mut chunks = Vec::with_capacity(n_chunks);
        let mut start = 0;
        while start < self.path_count {
            let end = (start + chunk_size).min(self.path_count);
            chunks.push((start..end, worker.clone()));
            start = end;
        }
        chunks
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::core::cashflow::Side;
    use crate::core::observables::{FloatRateIndex, RefEntity, Share};
    use crate::math::black_scholes::black_scholes_call;
    use crate::models::creditfxjump::DeterministicCreditWithFxJump;
    use crate::models::deterministiccurves::DeterministicCurves;
    use crate::models::equitysimulator::EquitySimulator;
    use crate::models::hullwhite::HullWhite1F;
    use crate::products::cds::Cds;
    use crate::products::europeanoption::EuropeanOption;
    use crate::products::fixedleg::FixedLeg;
    use crate::products::irswap::InterestRateSwap;
    use crate::rates::curves::{DatesAndRates, ForecastCurve, FxForecastCurve, HazardCurve};
    use crate::rates::traits::DiscountingSource;
    use crate::time::daycounter::DayCounter;
    use crate::time::period::Period;

    fn anchor() -> Date {
        Date::new(2016, 9, 23)
    }

    fn jibar3m() -> FloatRateIndex {
        FloatRateIndex::new(Currency::ZAR, "Jibar", Period::months(3))
    }

    fn zar_curve() -> Arc<DatesAndRates> {
        Arc::new(DatesAndRates::flat(Currency::ZAR, anchor(), 0.07).unwrap())
    }

    fn deterministic_model() -> Box<dyn NumeraireSimulator> {
        let mut model = DeterministicCurves::new(zar_curve());
        model.add_rate_forecast(Arc::new(
            ForecastCurve::new(
                anchor(),
                jibar3m(),
                vec![(anchor(), 0.07), (anchor().add_years(10), 0.07)],
            )
            .unwrap(),
        ));
        Box::new(model)
    }

    fn quarterly_leg(currency: Currency, notional: f64, rate: f64) -> Box<dyn Product> {
        let pay_dates = vec![anchor().add_months(3), anchor().add_months(6)];
        Box::new(
            FixedLeg::new(
                currency,
                pay_dates,
                vec![notional, notional],
                vec![rate, rate],
                vec![0.25, 0.25],
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_single_path_matches_hand_discounting() {
        let mut coordinator = Coordinator::new(deterministic_model(), Vec::new(), 1).unwrap();
        let leg = quarterly_leg(Currency::ZAR, 1_000_000.0, 0.07);
        let value = coordinator.value(&[leg], anchor()).unwrap();

        let curve = zar_curve();
        let expected: f64 = [anchor().add_months(3), anchor().add_months(6)]
            .iter()
            .map(|d| 1_000_000.0 * 0.07 * 0.25 * curve.discount_factor(*d).unwrap())
            .sum();
        assert!((value - expected).abs() < 1e-6);
    }

    #[test]
    fn test_swap_value_on_deterministic_model() {
        // floating forecasts equal the fixed rate, so the swap is worth 0
        let mut coordinator = Coordinator::new(deterministic_model(), Vec::new(), 3).unwrap();
        let swap: Box<dyn Product> = Box::new(
            InterestRateSwap::fixed_for_float(
                0.07,
                Side::Pay,
                1_000_000.0,
                anchor(),
                Period::years(2),
                Period::months(3),
                jibar3m(),
            )
            .unwrap(),
        );
        let value = coordinator.value(&[swap], anchor()).unwrap();
        assert!(value.abs() < 1e-6, "par swap valued at {}", value);
    }

    #[test]
    fn test_foreign_cashflow_is_converted() {
        let usd_curve = Arc::new(DatesAndRates::flat(Currency::USD, anchor(), 0.01).unwrap());
        let mut model = DeterministicCurves::new(zar_curve());
        model.add_fx_forecast(Arc::new(
            FxForecastCurve::new(
                CurrencyPair::new(Currency::USD, Currency::ZAR),
                13.66,
                usd_curve.clone(),
                zar_curve(),
            )
            .unwrap(),
        ));
        let mut coordinator = Coordinator::new(Box::new(model), Vec::new(), 1).unwrap();
        let leg = quarterly_leg(Currency::USD, 1_000_000.0, 0.01);
        let value = coordinator.value(&[leg], anchor()).unwrap();

        let zar = zar_curve();
        let expected: f64 = [anchor().add_months(3), anchor().add_months(6)]
            .iter()
            .map(|d| {
                let fx = 13.66 * usd_curve.discount_factor(*d).unwrap()
                    / zar.discount_factor(*d).unwrap();
                1_000_000.0 * 0.01 * 0.25 * fx * zar.discount_factor(*d).unwrap()
            })
            .sum();
        assert!((value - expected).abs() < 1e-6);
    }

    #[test]
    fn test_unowned_observable_fails_registration() {
        let mut coordinator = Coordinator::new(deterministic_model(), Vec::new(), 1).unwrap();
        let swap: Box<dyn Product> = Box::new(
            InterestRateSwap::fixed_for_float(
                0.07,
                Side::Pay,
                1_000_000.0,
                anchor(),
                Period::years(1),
                Period::months(6),
                FloatRateIndex::new(Currency::ZAR, "Jibar", Period::months(6)),
            )
            .unwrap(),
        );
        assert!(matches!(
            coordinator.value(&[swap], anchor()),
            Err(PathwiseError::NotFoundErr(_))
        ));
    }

    #[test]
    fn test_ambiguous_owner_fails_registration() {
        let extra: Box<dyn Simulator> = deterministic_model().box_clone();
        let mut coordinator = Coordinator::new(deterministic_model(), vec![extra], 1).unwrap();
        let swap: Box<dyn Product> = Box::new(
            InterestRateSwap::fixed_for_float(
                0.07,
                Side::Pay,
                1_000_000.0,
                anchor(),
                Period::years(1),
                Period::months(3),
                jibar3m(),
            )
            .unwrap(),
        );
        assert!(matches!(
            coordinator.value(&[swap], anchor()),
            Err(PathwiseError::InvalidValueErr(_))
        ));
    }

    #[test]
    fn test_epe_deterministic_profile() {
        let mut coordinator = Coordinator::new(deterministic_model(), Vec::new(), 4).unwrap();
        let leg = quarterly_leg(Currency::ZAR, 1_000_000.0, 0.07);
        let forward_dates = vec![
            anchor(),
            anchor().add_months(4),
            anchor().add_months(6),
            anchor().add_months(9),
        ];
        let epe = coordinator.epe(&[leg], anchor(), &forward_dates).unwrap();

        let curve = zar_curve();
        let df3 = curve.discount_factor(anchor().add_months(3)).unwrap();
        let df6 = curve.discount_factor(anchor().add_months(6)).unwrap();
        let cf = 1_000_000.0 * 0.07 * 0.25;
        assert!((epe[0] - cf * (df3 + df6)).abs() < 1e-6);
        assert!((epe[1] - cf * df6).abs() < 1e-6);
        // horizons at and after the last pay date have no exposure
        assert_eq!(epe[2], 0.0);
        assert_eq!(epe[3], 0.0);
    }

    #[test]
    fn test_forward_dates_must_increase() {
        let mut coordinator = Coordinator::new(deterministic_model(), Vec::new(), 1).unwrap();
        let leg = quarterly_leg(Currency::ZAR, 1_000_000.0, 0.07);
        assert!(coordinator
            .epe(&[leg], anchor(), &[anchor().add_months(6), anchor()])
            .is_err());
    }

    #[test]
    fn test_zero_paths_rejected() {
        assert!(Coordinator::new(deterministic_model(), Vec::new(), 0).is_err());
    }

    #[test]
    fn test_value_is_reproducible() {
        let mut hw = HullWhite1F::new(Currency::ZAR, 0.05, 0.005, 0.07, 0.07);
        hw.add_forecast(jibar3m()).unwrap();
        let mut coordinator = Coordinator::new(Box::new(hw), Vec::new(), 200).unwrap();
        let swap: Box<dyn Product> = Box::new(
            InterestRateSwap::fixed_for_float(
                0.07,
                Side::Pay,
                1_000_000.0,
                Date::new(2016, 9, 17),
                Period::years(2),
                Period::months(3),
                jibar3m(),
            )
            .unwrap(),
        );
        let first = coordinator
            .value(std::slice::from_ref(&swap), Date::new(2016, 9, 17))
            .unwrap();
        let second = coordinator
            .value(std::slice::from_ref(&swap), Date::new(2016, 9, 17))
            .unwrap();
        assert_eq!(first, second);
    }

    // Two fixed legs in different currencies against flat deterministic
    // curves and a covered-parity FX forecast. Reference value from the
    // spreadsheet model behind the original deal.
    #[test]
    fn test_two_currency_fixed_legs() {
        let value_date = Date::new(2016, 9, 23);
        let cf_dates = vec![Date::new(2016, 12, 23), Date::new(2017, 3, 23)];
        let leg_zar: Box<dyn Product> = Box::new(
            FixedLeg::new(
                Currency::ZAR,
                cf_dates.clone(),
                vec![-16_000_000.0, -16_000_000.0],
                vec![0.07, 0.07],
                vec![0.25, 0.25],
            )
            .unwrap(),
        );
        let leg_usd: Box<dyn Product> = Box::new(
            FixedLeg::new(
                Currency::USD,
                cf_dates,
                vec![1_000_000.0, 1_000_000.0],
                vec![0.01, 0.01],
                vec![0.25, 0.25],
            )
            .unwrap(),
        );

        let far = Date::new(2026, 9, 23);
        let discount = Arc::new(
            DatesAndRates::new(
                Currency::ZAR,
                value_date,
                vec![(value_date, 0.0725), (far, 0.0725)],
            )
            .unwrap(),
        );
        let zar_basis = Arc::new(
            DatesAndRates::new(
                Currency::ZAR,
                value_date,
                vec![(value_date, 0.0735), (far, 0.0735)],
            )
            .unwrap(),
        );
        let usd = Arc::new(
            DatesAndRates::new(
                Currency::USD,
                value_date,
                vec![(value_date, 0.01), (far, 0.012)],
            )
            .unwrap(),
        );
        let mut model = DeterministicCurves::new(discount);
        model.add_rate_forecast(Arc::new(
            ForecastCurve::new(
                value_date,
                jibar3m(),
                vec![(value_date, 0.0725), (far, 0.0725)],
            )
            .unwrap(),
        ));
        model.add_fx_forecast(Arc::new(
            FxForecastCurve::new(
                CurrencyPair::new(Currency::USD, Currency::ZAR),
                13.66,
                usd,
                zar_basis,
            )
            .unwrap(),
        ));
        let mut coordinator = Coordinator::new(Box::new(model), Vec::new(), 1).unwrap();
        let value = coordinator.value(&[leg_zar, leg_usd], value_date).unwrap();
        assert!(
            (value - -477027.31).abs() < 0.01,
            "two leg portfolio valued at {}",
            value
        );
    }

    fn five_year_swap() -> Box<dyn Product> {
        Box::new(
            InterestRateSwap::fixed_for_float(
                0.07,
                Side::Pay,
                1_000_000.0,
                Date::new(2016, 9, 17),
                Period::years(5),
                Period::months(3),
                jibar3m(),
            )
            .unwrap(),
        )
    }

    // model-consistent value of five_year_swap on the flat 7% curve: the
    // floating leg pays the simple rate over each period, so the swap is
    // slightly above par to the floating receiver
    fn five_year_swap_expected_value(value_date: Date) -> f64 {
        let df = |d: Date| (-0.07 * DayCounter::Actual365.year_fraction(value_date, d)).exp();
        let mut expected = 0.0;
        for i in 0..20 {
            let d1 = value_date.add_months(3 * i);
            let d2 = value_date.add_months(3 * (i + 1));
            let af = (d2 - d1) as f64 / 365.0;
            expected += 1_000_000.0 * ((df(d1) - df(d2)) - 0.07 * af * df(d2));
        }
        expected
    }

    #[test]
    fn test_hull_white_swap_value_converges() {
        let value_date = Date::new(2016, 9, 17);
        let mut hw = HullWhite1F::new(Currency::ZAR, 0.05, 0.005, 0.07, 0.07);
        hw.add_forecast(jibar3m()).unwrap();
        let mut coordinator = Coordinator::new(Box::new(hw), Vec::new(), 100_000).unwrap();
        let value = coordinator.value(&[five_year_swap()], value_date).unwrap();

        let expected = five_year_swap_expected_value(value_date);
        assert!(
            (value - expected).abs() < 250.0,
            "swap valued at {}, expected {}",
            value,
            expected
        );
    }

    // Exposure profile regression for the 5y quarterly par-style swap on a
    // 10 day horizon grid, 1m notional, reference values from the original
    // deal analysis.
    #[test]
    fn test_hull_white_swap_epe_profile() {
        let value_date = Date::new(2016, 9, 17);
        let mut hw = HullWhite1F::new(Currency::ZAR, 0.05, 0.005, 0.07, 0.07);
        hw.add_forecast(jibar3m()).unwrap();
        let mut coordinator = Coordinator::new(Box::new(hw), Vec::new(), 150_000).unwrap();

        let end_date = value_date.add_years(5);
        let mut forward_dates = Vec::new();
        let mut date = value_date;
        while date < end_date {
            forward_dates.push(date);
            date = date.add_days(10);
        }
        let epe = coordinator
            .epe(&[five_year_swap()], value_date, &forward_dates)
            .unwrap();

        for (forward_date, exposure) in forward_dates.iter().zip(&epe) {
            assert!(*exposure >= 0.0, "negative exposure at {}", forward_date);
        }
        // at the value date the exposure is the positive part of the
        // swap value itself
        let expected_value = five_year_swap_expected_value(value_date);
        assert!(
            (epe[0] - expected_value).abs() < 250.0,
            "exposure at horizon 0 was {}, swap value {}",
            epe[0],
            expected_value
        );
        assert!(
            (epe[90] - 6560.0).abs() < 100.0,
            "exposure at horizon 90 was {}",
            epe[90]
        );
        assert!(
            (epe[182] - 712.0).abs() < 30.0,
            "exposure at horizon 182 was {}",
            epe[182]
        );
    }

    // Quanto CDS scenario: a ZAR CDS and a USD CDS on the same entity,
    // under a credit model whose USDZAR rate jumps by -20% at default.
    // The hazard rate is spread / (1 - recovery), so the ZAR CDS is worth
    // about zero; scaling the USD spread by (1 + jump) compensates the
    // quanto effect and the USD CDS is worth about zero too.
    #[test]
    fn test_quanto_cds_values_near_zero() {
        let anchor_date = Date::new(2016, 11, 25);
        let entity = RefEntity::new("ABC");
        let spread = 0.025;
        let recovery = 0.4;
        let jump = -0.2;
        let mut pay_dates = Vec::new();
        let mut accruals = Vec::new();
        let mut prev = anchor_date;
        for i in 1..=20 {
            let date = anchor_date.add_months(3 * i);
            accruals.push((date - prev) as f64 / 365.0);
            pay_dates.push(date);
            prev = date;
        }
        let cds_zar: Box<dyn Product> = Box::new(
            Cds::new(
                entity.clone(),
                Currency::ZAR,
                pay_dates.clone(),
                vec![1_000_000.0; 20],
                vec![spread; 20],
                accruals.clone(),
                true,
            )
            .unwrap(),
        );
        let cds_usd: Box<dyn Product> = Box::new(
            Cds::new(
                entity.clone(),
                Currency::USD,
                pay_dates,
                vec![1_000_000.0; 20],
                vec![spread * (1.0 + jump); 20],
                accruals,
                true,
            )
            .unwrap(),
        );

        let far = anchor_date.add_years(10);
        let usd_curve = Arc::new(
            DatesAndRates::new(
                Currency::USD,
                anchor_date,
                vec![(anchor_date, 0.01), (far, 0.02)],
            )
            .unwrap(),
        );
        let zar_curve = Arc::new(
            DatesAndRates::new(
                Currency::ZAR,
                anchor_date,
                vec![(anchor_date, 0.07), (far, 0.08)],
            )
            .unwrap(),
        );
        let hazard_rate = spread / (1.0 - recovery);
        let hazard = Arc::new(
            HazardCurve::new(
                entity,
                anchor_date,
                vec![(anchor_date, hazard_rate), (far, hazard_rate)],
            )
            .unwrap(),
        );
        let pair = CurrencyPair::new(Currency::USD, Currency::ZAR);
        let fx = Arc::new(FxForecastCurve::new(pair, 1.0, usd_curve, zar_curve.clone()).unwrap());
        let model = DeterministicCreditWithFxJump::new(
            hazard,
            pair,
            fx,
            zar_curve,
            0.15,
            jump,
            recovery,
        )
        .unwrap();
        let mut coordinator = Coordinator::new(Box::new(model), Vec::new(), 500_000).unwrap();

        let zar_value = coordinator
            .value(std::slice::from_ref(&cds_zar), anchor_date)
            .unwrap();
        assert!(zar_value.abs() < 1600.0, "ZAR CDS valued at {}", zar_value);
        let usd_value = coordinator
            .value(std::slice::from_ref(&cds_usd), anchor_date)
            .unwrap();
        assert!(usd_value.abs() < 1600.0, "USD CDS valued at {}", usd_value);
    }

    #[test]
    fn test_equity_options_match_black_scholes() {
        let anchor_date = Date::new(2016, 9, 30);
        let exercise = Date::new(2017, 8, 28);
        let shares = vec![
            Share::new(Currency::ZAR, "ALSI"),
            Share::new(Currency::ZAR, "AAA"),
            Share::new(Currency::ZAR, "BBB"),
        ];
        let prices = vec![200.0, 50.0, 100.0];
        let vols = vec![0.22, 0.52, 0.40];
        let div_yields = vec![0.03, 0.0, 0.0];
        let discount = Arc::new(
            DatesAndRates::new(
                Currency::ZAR,
                anchor_date,
                vec![(anchor_date, 0.07), (anchor_date.add_months(120), 0.09)],
            )
            .unwrap(),
        );
        let sim = EquitySimulator::new(
            shares.clone(),
            prices.clone(),
            vols.clone(),
            div_yields.clone(),
            vec![
                vec![1.0, 0.4, 0.5],
                vec![0.4, 1.0, 0.6],
                vec![0.5, 0.6, 1.0],
            ],
            discount.clone(),
            Vec::new(),
        )
        .unwrap();
        let mut coordinator = Coordinator::new(Box::new(sim), Vec::new(), 20_000).unwrap();

        let t = DayCounter::Actual365.year_fraction(anchor_date, exercise);
        let rate = -discount.discount_factor(exercise).unwrap().ln() / t;
        let options: Vec<Box<dyn Product>> = (0..3)
            .map(|p| {
                Box::new(EuropeanOption::new(
                    shares[p].clone(),
                    prices[p] * 1.05,
                    exercise,
                )) as Box<dyn Product>
            })
            .collect();

        let mut total_reference = 0.0;
        for p in 0..3 {
            let reference =
                black_scholes_call(prices[p], prices[p] * 1.05, t, vols[p], rate, div_yields[p]);
            let value = coordinator
                .value(std::slice::from_ref(&options[p]), anchor_date)
                .unwrap();
            assert!(
                (value - reference).abs() < reference * 0.05,
                "option {} valued at {}, reference {}",
                p,
                value,
                reference
            );
            total_reference += reference;
        }
        let all = coordinator.value(&options, anchor_date).unwrap();
        assert!((all - total_reference).abs() < total_reference * 0.05);
    }
}
