use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// # Currency
/// ISO currency codes understood by the engine. A currency is pure
/// identity; conversion between currencies always goes through an FX
/// observable or an FX source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Currency {
    USD,
    EUR,
    GBP,
    JPY,
    CHF,
    AUD,
    CAD,
    ZAR,
}

impl Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}
