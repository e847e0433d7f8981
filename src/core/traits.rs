use crate::core::cashflow::Cashflow;
use crate::core::observables::MarketObservable;
use crate::currencies::enums::Currency;
use crate::time::date::Date;
use crate::utils::errors::Result;

/// # Product
/// A contract that turns realized observable values into dated cashflows.
/// Contractual terms are fixed at construction; the value date and the
/// cache of realized values are path-scoped mutable state.
///
/// Lifecycle per valuation run: `set_value_date` once (or again to revalue
/// at another horizon), then per path `reset`, zero or more
/// `set_index_values`, and finally `cashflows`. `cashflows` must fail if
/// any required observable has unset values, never default silently.
pub trait Product: Send {
    /// A short identity used in error messages.
    fn name(&self) -> String;

    /// Establishes the horizon; cashflows on or before this date are
    /// excluded from everything that follows.
    fn set_value_date(&mut self, value_date: Date);

    /// Clears path-scoped realized values. Safe to call on products with
    /// no path dependency.
    fn reset(&mut self);

    /// The distinct observables this product needs at its current value
    /// date. May shrink as the value date advances.
    fn required_indices(&self) -> Vec<MarketObservable>;

    /// Ordered, strictly increasing realization dates for one of the
    /// observables returned by `required_indices`.
    fn required_index_dates(&self, observable: &MarketObservable) -> Result<Vec<Date>>;

    /// Injects realized values, in the same order and length as the dates
    /// returned by `required_index_dates` for this observable.
    fn set_index_values(&mut self, observable: &MarketObservable, values: &[f64]) -> Result<()>;

    /// All cashflows strictly after the value date implied by the terms
    /// and the injected values.
    fn cashflows(&self) -> Result<Vec<Cashflow>>;

    /// Currencies in which this product can pay, used to pre-register FX
    /// observables before any cashflow exists.
    fn cashflow_currencies(&self) -> Vec<Currency>;

    /// Possible payment dates in one of the currencies returned by
    /// `cashflow_currencies`.
    fn cashflow_dates(&self, currency: Currency) -> Vec<Date>;

    fn box_clone(&self) -> Box<dyn Product>;
}

impl Clone for Box<dyn Product> {
    fn clone(&self) -> Box<dyn Product> {
        self.box_clone()
    }
}

/// # Simulator
/// A path generator that realizes a registered set of observables on
/// registered dates.
///
/// State machine: `Registering` (after `reset`, accepting
/// `set_required_dates`) → `Prepared` (after `prepare`) → path loop of
/// `run_simulation` / `indices`. Calls outside this order fail with a
/// lifecycle error.
pub trait Simulator: Send {
    /// A short identity used in error messages.
    fn name(&self) -> String;

    /// Clears all registrations and returns to the registration phase.
    fn reset(&mut self);

    /// Whether this simulator can realize the given observable.
    fn provides_index(&self, observable: &MarketObservable) -> bool;

    /// Merges `dates` into the registered set for `observable` (union,
    /// not replace). Fails for observables outside this simulator's
    /// capability set or after `prepare`.
    fn set_required_dates(&mut self, observable: &MarketObservable, dates: &[Date]) -> Result<()>;

    /// Locks registrations and performs one-time setup for path
    /// generation.
    fn prepare(&mut self, anchor_date: Date) -> Result<()>;

    /// Realizes values for every registered (observable, date) pair on
    /// path `path_index`. Draws are derived from a reproducible stream
    /// keyed by the path index: re-running the same index reproduces
    /// bit-identical output.
    fn run_simulation(&mut self, path_index: usize) -> Result<()>;

    /// Realized values from the most recent `run_simulation` for a subset
    /// of the registered dates. An unregistered date is an error.
    fn indices(&self, observable: &MarketObservable, dates: &[Date]) -> Result<Vec<f64>>;

    /// The model state driving the current path at `date`, used as
    /// regression covariates when estimating forward values. Empty for
    /// deterministic models.
    fn underlying_factors(&self, date: Date) -> Result<Vec<f64>>;

    fn box_clone(&self) -> Box<dyn Simulator>;
}

impl Clone for Box<dyn Simulator> {
    fn clone(&self) -> Box<dyn Simulator> {
        self.box_clone()
    }
}

/// # NumeraireSimulator
/// A simulator that additionally exposes forward discounting consistent
/// with its own risk-neutral measure: the numeraire value at any
/// registered date along the current path. The discount factor between two
/// simulated dates is the ratio of numeraire values.
pub trait NumeraireSimulator: Simulator {
    /// The currency in which the coordinator reports values.
    fn numeraire_currency(&self) -> Currency;

    /// Registers dates at which the numeraire will be queried.
    fn set_numeraire_dates(&mut self, dates: &[Date]) -> Result<()>;

    /// Numeraire value at `date` along the current path. The date must
    /// have been registered before `prepare`.
    fn numeraire(&self, date: Date) -> Result<f64>;

    /// Discount factor along the current path from `to` back to `from`.
    fn path_discount_factor(&self, from: Date, to: Date) -> Result<f64> {
        Ok(self.numeraire(from)? / self.numeraire(to)?)
    }

    fn box_clone_numeraire(&self) -> Box<dyn NumeraireSimulator>;
}

impl Clone for Box<dyn NumeraireSimulator> {
    fn clone(&self) -> Box<dyn NumeraireSimulator> {
        self.box_clone_numeraire()
    }
}
