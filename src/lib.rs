//! # pathwise
//! A Monte Carlo valuation engine. Products declare the market observables
//! they depend on, simulators realize those observables along independent
//! reproducible paths, and a coordinator aggregates path results into
//! risk-neutral present values and expected positive exposure profiles.

pub mod core;
pub mod currencies;
pub mod engine;
pub mod math;
pub mod models;
pub mod prelude;
pub mod products;
pub mod rates;
pub mod time;
pub mod utils;
