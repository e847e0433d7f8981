pub mod cashflow;
pub mod observables;
pub mod traits;
