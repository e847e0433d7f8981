use std::collections::HashMap;
use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::currencies::enums::Currency;
use crate::time::period::Period;
use crate::utils::errors::{PathwiseError, Result};

/// # FloatRateIndex
/// A floating rate index such as 3 month Jibar. Identity is the
/// (currency, family, tenor) triple; the family name is stored uppercase
/// so equal indices always compare and hash equal.
///
/// ## Example
/// ```
/// use pathwise::prelude::*;
/// let jibar = FloatRateIndex::new(Currency::ZAR, "Jibar", Period::months(3));
/// assert_eq!(jibar.to_string(), "ZAR:JIBAR:3M");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FloatRateIndex {
    currency: Currency,
    family: String,
    tenor: Period,
}

impl FloatRateIndex {
    pub fn new(currency: Currency, family: &str, tenor: Period) -> FloatRateIndex {
        FloatRateIndex {
            currency,
            family: family.to_uppercase(),
            tenor,
        }
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn tenor(&self) -> Period {
        self.tenor
    }
}

impl Display for FloatRateIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.currency, self.family, self.tenor)
    }
}

/// # Share
/// An equity identified by currency and ticker.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Share {
    currency: Currency,
    ticker: String,
}

impl Share {
    pub fn new(currency: Currency, ticker: &str) -> Share {
        Share {
            currency,
            ticker: ticker.to_uppercase(),
        }
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }
}

/// # CurrencyPair
/// An exchange rate quoted as units of `counter` per unit of `base`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CurrencyPair {
    base: Currency,
    counter: Currency,
}

impl CurrencyPair {
    pub fn new(base: Currency, counter: Currency) -> CurrencyPair {
        CurrencyPair { base, counter }
    }

    pub fn base(&self) -> Currency {
        self.base
    }

    pub fn counter(&self) -> Currency {
        self.counter
    }
}

/// # RefEntity
/// A credit reference entity identified by name, stored uppercase so
/// equal entities always compare and hash equal.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RefEntity {
    name: String,
}

impl RefEntity {
    pub fn new(name: &str) -> RefEntity {
        RefEntity {
            name: name.to_uppercase(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Display for RefEntity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// # MarketObservable
/// The identity of a market quantity that can be realized on a date: a
/// floating rate index, a share price, a dividend on a share, an exchange
/// rate, or the default state of a credit reference entity. Observables
/// carry no path state; two observables with the same content are the
/// same registration key.
///
/// The canonical key is a deterministic, injective encoding of the
/// observable's content. Registration maps are keyed on it rather than on
/// object identity.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarketObservable {
    RateIndex(FloatRateIndex),
    Share(Share),
    Dividend(Share),
    CurrencyPair(CurrencyPair),
    /// Default time of a reference entity, realized as the serial day
    /// count of the path's default date. Paths that never default
    /// realize a date far beyond any modeled horizon.
    DefaultTime(RefEntity),
    /// Recovery rate that applies at default of a reference entity.
    DefaultRecovery(RefEntity),
}

impl MarketObservable {
    pub fn key(&self) -> String {
        match self {
            MarketObservable::RateIndex(index) => index.to_string(),
            MarketObservable::Share(share) => {
                format!("SHARE:{}:{}", share.currency(), share.ticker())
            }
            MarketObservable::Dividend(share) => {
                format!("DIVI:{}:{}", share.currency(), share.ticker())
            }
            MarketObservable::CurrencyPair(pair) => {
                format!("FX:{}{}", pair.base(), pair.counter())
            }
            MarketObservable::DefaultTime(entity) => {
                format!("DEFAULT:TIME:{}", entity.name())
            }
            MarketObservable::DefaultRecovery(entity) => {
                format!("DEFAULT:RECOVERY:{}", entity.name())
            }
        }
    }
}

impl Display for MarketObservable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// # IndexRegistry
/// An immutable registry of well-known floating rate indices, built once
/// at startup and passed by reference wherever index lookups by name are
/// needed.
///
/// ## Example
/// ```
/// use pathwise::prelude::*;
/// let registry = IndexRegistry::with_defaults();
/// let jibar = registry.get("JIBAR3M").unwrap();
/// assert_eq!(jibar.currency(), Currency::ZAR);
/// ```
#[derive(Clone, Debug)]
pub struct IndexRegistry {
    indices: HashMap<String, FloatRateIndex>,
}

impl IndexRegistry {
    pub fn new(indices: Vec<(&str, FloatRateIndex)>) -> IndexRegistry {
        IndexRegistry {
            indices: indices
                .into_iter()
                .map(|(name, index)| (name.to_uppercase(), index))
                .collect(),
        }
    }

    pub fn with_defaults() -> IndexRegistry {
        IndexRegistry::new(vec![
            (
                "JIBAR3M",
                FloatRateIndex::new(Currency::ZAR, "Jibar", Period::months(3)),
            ),
            (
                "JIBAR6M",
                FloatRateIndex::new(Currency::ZAR, "Jibar", Period::months(6)),
            ),
            (
                "LIBOR3M",
                FloatRateIndex::new(Currency::USD, "Libor", Period::months(3)),
            ),
            (
                "EURIBOR3M",
                FloatRateIndex::new(Currency::EUR, "Euribor", Period::months(3)),
            ),
            (
                "EURIBOR6M",
                FloatRateIndex::new(Currency::EUR, "Euribor", Period::months(6)),
            ),
        ])
    }

    pub fn get(&self, name: &str) -> Result<&FloatRateIndex> {
        self.indices
            .get(&name.to_uppercase())
            .ok_or(PathwiseError::NotFoundErr(format!(
                "index {} is not in the registry",
                name
            )))
    }
}
