pub mod black_scholes;
pub mod cholesky;
pub mod interpolation;
pub mod regression;
