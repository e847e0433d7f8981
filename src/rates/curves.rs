use std::sync::Arc;

use crate::core::observables::{CurrencyPair, FloatRateIndex, RefEntity};
use crate::currencies::enums::Currency;
use crate::math::interpolation::LinearInterpolator;
use crate::rates::traits::{
    DiscountingSource, FloatingRateSource, FxSource, SurvivalProbabilitySource,
};
use crate::time::date::Date;
use crate::time::daycounter::DayCounter;
use crate::utils::errors::{PathwiseError, Result};

/// # DatesAndRates
/// A zero curve given as continuously compounded (NACC) rates at dates,
/// linearly interpolated on the rate and flat beyond the last date.
/// Discount factors are `exp(-r(t) * t)` with t in ACT/365 from the
/// anchor.
///
/// ## Example
/// ```
/// use pathwise::prelude::*;
/// let anchor = Date::new(2016, 9, 23);
/// let curve = DatesAndRates::new(
///     Currency::ZAR,
///     anchor,
///     vec![(anchor, 0.07), (Date::new(2026, 9, 23), 0.07)],
/// ).unwrap();
/// let date = Date::new(2017, 9, 23);
/// let df = curve.discount_factor(date).unwrap();
/// assert!((df - (-0.07f64 * 365.0 / 365.0).exp()).abs() < 1e-12);
/// ```
#[derive(Clone)]
pub struct DatesAndRates {
    currency: Currency,
    anchor_date: Date,
    interpolator: LinearInterpolator,
}

impl DatesAndRates {
    pub fn new(
        currency: Currency,
        anchor_date: Date,
        dates_and_rates: Vec<(Date, f64)>,
    ) -> Result<DatesAndRates> {
        let times = dates_and_rates
            .iter()
            .map(|(d, _)| DayCounter::Actual365.year_fraction(anchor_date, *d))
            .collect::<Vec<f64>>();
        let rates = dates_and_rates.iter().map(|(_, r)| *r).collect();
        Ok(DatesAndRates {
            currency,
            anchor_date,
            interpolator: LinearInterpolator::new(times, rates, true)?,
        })
    }

    /// A flat NACC curve, handy for tests and simple models.
    pub fn flat(currency: Currency, anchor_date: Date, rate: f64) -> Result<DatesAndRates> {
        DatesAndRates::new(
            currency,
            anchor_date,
            vec![(anchor_date, rate), (anchor_date.add_years(100), rate)],
        )
    }

    pub fn rate_at(&self, date: Date) -> Result<f64> {
        let t = DayCounter::Actual365.year_fraction(self.anchor_date, date);
        self.interpolator.interpolate(t)
    }
}

impl DiscountingSource for DatesAndRates {
    fn currency(&self) -> Currency {
        self.currency
    }

    fn anchor_date(&self) -> Date {
        self.anchor_date
    }

    fn discount_factor(&self, date: Date) -> Result<f64> {
        if date < self.anchor_date {
            return Err(PathwiseError::InvalidValueErr(format!(
                "discount factor requested at {} before curve anchor {}",
                date, self.anchor_date
            )));
        }
        let t = DayCounter::Actual365.year_fraction(self.anchor_date, date);
        Ok((-self.rate_at(date)? * t).exp())
    }
}

/// # ForecastCurve
/// Forward rates for one floating index, linearly interpolated between
/// dated values.
#[derive(Clone)]
pub struct ForecastCurve {
    index: FloatRateIndex,
    anchor_date: Date,
    interpolator: LinearInterpolator,
}

impl ForecastCurve {
    pub fn new(
        anchor_date: Date,
        index: FloatRateIndex,
        dates_and_rates: Vec<(Date, f64)>,
    ) -> Result<ForecastCurve> {
        let times = dates_and_rates
            .iter()
            .map(|(d, _)| DayCounter::Actual365.year_fraction(anchor_date, *d))
            .collect::<Vec<f64>>();
        let rates = dates_and_rates.iter().map(|(_, r)| *r).collect();
        Ok(ForecastCurve {
            index,
            anchor_date,
            interpolator: LinearInterpolator::new(times, rates, true)?,
        })
    }
}

impl FloatingRateSource for ForecastCurve {
    fn index(&self) -> &FloatRateIndex {
        &self.index
    }

    fn forward_rate(&self, date: Date) -> Result<f64> {
        let t = DayCounter::Actual365.year_fraction(self.anchor_date, date);
        self.interpolator.interpolate(t)
    }
}

/// # ForecastCurveFromDiscount
/// A floating rate forecast implied by a discount curve: the simple rate
/// over the index tenor from the discount factor ratio. Dates at or
/// before the anchor use the supplied fixing rate.
#[derive(Clone)]
pub struct ForecastCurveFromDiscount {
    curve: Arc<dyn DiscountingSource>,
    index: FloatRateIndex,
    fixing_rate: f64,
}

impl ForecastCurveFromDiscount {
    pub fn new(
        curve: Arc<dyn DiscountingSource>,
        index: FloatRateIndex,
        fixing_rate: f64,
    ) -> Result<ForecastCurveFromDiscount> {
        let tenor = index.tenor();
        if tenor.in_months().is_none() {
            return Err(PathwiseError::InvalidValueErr(format!(
                "index {} tenor must be a whole number of months",
                index
            )));
        }
        Ok(ForecastCurveFromDiscount {
            curve,
            index,
            fixing_rate,
        })
    }
}

impl FloatingRateSource for ForecastCurveFromDiscount {
    fn index(&self) -> &FloatRateIndex {
        &self.index
    }

    fn forward_rate(&self, date: Date) -> Result<f64> {
        if date <= self.curve.anchor_date() {
            return Ok(self.fixing_rate);
        }
        let end = date + self.index.tenor();
        let accrual = DayCounter::Actual365.year_fraction(date, end);
        let df_start = self.curve.discount_factor(date)?;
        let df_end = self.curve.discount_factor(end)?;
        Ok((df_start / df_end - 1.0) / accrual)
    }
}

/// # FxForecastCurve
/// A forward FX rate from spot and two discount curves by covered
/// interest parity: `fx(t) = spot * df_base(t) / df_counter(t)`.
#[derive(Clone)]
pub struct FxForecastCurve {
    pair: CurrencyPair,
    spot: f64,
    base_curve: Arc<dyn DiscountingSource>,
    counter_curve: Arc<dyn DiscountingSource>,
}

impl FxForecastCurve {
    pub fn new(
        pair: CurrencyPair,
        spot: f64,
        base_curve: Arc<dyn DiscountingSource>,
        counter_curve: Arc<dyn DiscountingSource>,
    ) -> Result<FxForecastCurve> {
        if base_curve.currency() != pair.base() || counter_curve.currency() != pair.counter() {
            return Err(PathwiseError::InvalidValueErr(format!(
                "curves ({}, {}) do not match pair {}{}",
                base_curve.currency(),
                counter_curve.currency(),
                pair.base(),
                pair.counter()
            )));
        }
        Ok(FxForecastCurve {
            pair,
            spot,
            base_curve,
            counter_curve,
        })
    }
}

impl FxSource for FxForecastCurve {
    fn currency_pair(&self) -> CurrencyPair {
        self.pair
    }

    fn fx_rate(&self, date: Date) -> Result<f64> {
        Ok(self.spot * self.base_curve.discount_factor(date)?
            / self.counter_curve.discount_factor(date)?)
    }
}

/// # HazardCurve
/// Survival probabilities from hazard rates at dates, linearly
/// interpolated on the rate and flat beyond the last date. Survival is
/// `exp(-h(t) * t)` with t in ACT/365 from the anchor.
#[derive(Clone)]
pub struct HazardCurve {
    ref_entity: RefEntity,
    anchor_date: Date,
    interpolator: LinearInterpolator,
}

impl HazardCurve {
    pub fn new(
        ref_entity: RefEntity,
        anchor_date: Date,
        dates_and_rates: Vec<(Date, f64)>,
    ) -> Result<HazardCurve> {
        if dates_and_rates.iter().any(|(_, h)| *h < 0.0) {
            return Err(PathwiseError::InvalidValueErr(format!(
                "hazard rates for {} must be non negative",
                ref_entity
            )));
        }
        let times = dates_and_rates
            .iter()
            .map(|(d, _)| DayCounter::Actual365.year_fraction(anchor_date, *d))
            .collect::<Vec<f64>>();
        let rates = dates_and_rates.iter().map(|(_, h)| *h).collect();
        Ok(HazardCurve {
            ref_entity,
            anchor_date,
            interpolator: LinearInterpolator::new(times, rates, true)?,
        })
    }
}

impl SurvivalProbabilitySource for HazardCurve {
    fn reference_entity(&self) -> &RefEntity {
        &self.ref_entity
    }

    fn anchor_date(&self) -> Date {
        self.anchor_date
    }

    fn survival_probability(&self, date: Date) -> Result<f64> {
        if date < self.anchor_date {
            return Err(PathwiseError::InvalidValueErr(format!(
                "survival probability requested at {} before curve anchor {}",
                date, self.anchor_date
            )));
        }
        let t = DayCounter::Actual365.year_fraction(self.anchor_date, date);
        Ok((-self.interpolator.interpolate(t)? * t).exp())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::period::Period;

    #[test]
    fn test_flat_curve_df() {
        let anchor = Date::new(2016, 9, 23);
        let curve = DatesAndRates::flat(Currency::ZAR, anchor, 0.0725).unwrap();
        let date = Date::new(2016, 12, 23);
        let t = 91.0 / 365.0;
        assert!((curve.discount_factor(date).unwrap() - (-0.0725f64 * t).exp()).abs() < 1e-14);
        assert_eq!(curve.discount_factor(anchor).unwrap(), 1.0);
    }

    #[test]
    fn test_df_before_anchor_is_error() {
        let anchor = Date::new(2016, 9, 23);
        let curve = DatesAndRates::flat(Currency::ZAR, anchor, 0.07).unwrap();
        assert!(curve.discount_factor(anchor.add_days(-1)).is_err());
    }

    #[test]
    fn test_rate_interpolation() {
        let anchor = Date::new(2016, 9, 30);
        let curve = DatesAndRates::new(
            Currency::ZAR,
            anchor,
            vec![(anchor, 0.07), (anchor.add_months(120), 0.09)],
        )
        .unwrap();
        let halfway = anchor.add_days((anchor.add_months(120) - anchor) / 2);
        let r = curve.rate_at(halfway).unwrap();
        assert!((r - 0.08).abs() < 1e-4);
    }

    #[test]
    fn test_fx_forecast_parity() {
        let anchor = Date::new(2016, 9, 23);
        let usd = Arc::new(DatesAndRates::flat(Currency::USD, anchor, 0.01).unwrap());
        let zar = Arc::new(DatesAndRates::flat(Currency::ZAR, anchor, 0.0735).unwrap());
        let pair = CurrencyPair::new(Currency::USD, Currency::ZAR);
        let fx = FxForecastCurve::new(pair, 13.66, usd, zar).unwrap();

        assert!((fx.fx_rate(anchor).unwrap() - 13.66).abs() < 1e-12);
        let date = Date::new(2016, 12, 23);
        let t = 91.0 / 365.0;
        let expected = 13.66 * ((0.0735f64 - 0.01) * t).exp();
        assert!((fx.fx_rate(date).unwrap() - expected).abs() < 1e-10);
    }

    #[test]
    fn test_fx_forecast_currency_mismatch() {
        let anchor = Date::new(2016, 9, 23);
        let usd = Arc::new(DatesAndRates::flat(Currency::USD, anchor, 0.01).unwrap());
        let zar = Arc::new(DatesAndRates::flat(Currency::ZAR, anchor, 0.07).unwrap());
        let pair = CurrencyPair::new(Currency::EUR, Currency::ZAR);
        assert!(FxForecastCurve::new(pair, 13.66, usd, zar).is_err());
    }

    #[test]
    fn test_flat_hazard_survival() {
        let anchor = Date::new(2016, 11, 25);
        let h = 0.025 / 0.6;
        let curve = HazardCurve::new(
            RefEntity::new("ABC"),
            anchor,
            vec![(anchor, h), (anchor.add_years(10), h)],
        )
        .unwrap();
        assert_eq!(curve.survival_probability(anchor).unwrap(), 1.0);
        let date = anchor.add_years(2);
        let t = (date - anchor) as f64 / 365.0;
        assert!((curve.survival_probability(date).unwrap() - (-h * t).exp()).abs() < 1e-12);
        assert_eq!(curve.reference_entity().name(), "ABC");
    }

    #[test]
    fn test_hazard_curve_input_checks() {
        let anchor = Date::new(2016, 11, 25);
        let curve = HazardCurve::new(RefEntity::new("ABC"), anchor, vec![(anchor, 0.04)]).unwrap();
        assert!(curve.survival_probability(anchor.add_days(-1)).is_err());
        assert!(HazardCurve::new(RefEntity::new("ABC"), anchor, vec![(anchor, -0.01)]).is_err());
    }

    #[test]
    fn test_forecast_from_discount() {
        let anchor = Date::new(2016, 9, 30);
        let curve = Arc::new(DatesAndRates::flat(Currency::ZAR, anchor, 0.07).unwrap());
        let jibar = FloatRateIndex::new(Currency::ZAR, "Jibar", Period::months(3));
        let forecast = ForecastCurveFromDiscount::new(curve, jibar, 0.065).unwrap();

        // at the anchor the fixing applies
        assert_eq!(forecast.forward_rate(anchor).unwrap(), 0.065);

        // beyond the anchor the simple forward over the tenor applies
        let date = anchor.add_months(6);
        let end = date.add_months(3);
        let accrual = (end - date) as f64 / 365.0;
        let expected = ((0.07f64 * accrual).exp() - 1.0) / accrual;
        assert!((forecast.forward_rate(date).unwrap() - expected).abs() < 1e-12);
    }
}
