use crate::core::observables::{CurrencyPair, FloatRateIndex, RefEntity};
use crate::currencies::enums::Currency;
use crate::time::date::Date;
use crate::utils::errors::Result;

/// # DiscountingSource
/// An already-built discount curve for a fixed currency. Discount factors
/// are relative to the curve's anchor date.
pub trait DiscountingSource: Send + Sync {
    fn currency(&self) -> Currency;
    fn anchor_date(&self) -> Date;
    fn discount_factor(&self, date: Date) -> Result<f64>;
}

/// # FloatingRateSource
/// A forecast curve for one floating rate index: the forward rate that
/// applies on a date.
pub trait FloatingRateSource: Send + Sync {
    fn index(&self) -> &FloatRateIndex;
    fn forward_rate(&self, date: Date) -> Result<f64>;
}

/// # FxSource
/// A forecast of the exchange rate for one currency pair.
pub trait FxSource: Send + Sync {
    fn currency_pair(&self) -> CurrencyPair;
    fn fx_rate(&self, date: Date) -> Result<f64>;
}

/// # SurvivalProbabilitySource
/// Survival probabilities for one credit reference entity, relative to
/// the source's anchor date: the probability that the entity has not
/// defaulted by the given date.
pub trait SurvivalProbabilitySource: Send + Sync {
    fn reference_entity(&self) -> &RefEntity;
    fn anchor_date(&self) -> Date;
    fn survival_probability(&self, date: Date) -> Result<f64>;
}
