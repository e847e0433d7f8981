use thiserror::Error;

/// # PathwiseError
/// Errors raised by the valuation engine. Contract violations (mismatched
/// sizes, unregistered observables or dates, out-of-order lifecycle calls)
/// are fatal to the current run and carry the identity of the offending
/// product, simulator or observable in their message.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PathwiseError {
    #[error("Invalid value: {0}")]
    InvalidValueErr(String),
    #[error("Value not set: {0}")]
    ValueNotSetErr(String),
    #[error("Not found: {0}")]
    NotFoundErr(String),
    #[error("Size mismatch: {0}")]
    SizeMismatchErr(String),
    #[error("Lifecycle error: {0}")]
    LifecycleErr(String),
}

pub type Result<T> = std::result::Result<T, PathwiseError>;
