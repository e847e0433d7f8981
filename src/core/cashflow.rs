use serde::{Deserialize, Serialize};

use crate::currencies::enums::Currency;
use crate::time::date::Date;

/// # Side
/// Direction of a leg or instrument from the point of view of the holder.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Pay,
    Receive,
}

impl Side {
    pub fn sign(&self) -> f64 {
        match self {
            Side::Pay => -1.0,
            Side::Receive => 1.0,
        }
    }
}

/// # Cashflow
/// An immutable dated amount in a currency. Products produce these fresh
/// on every path; they carry no state beyond their three fields.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cashflow {
    date: Date,
    amount: f64,
    currency: Currency,
}

impl Cashflow {
    pub fn new(date: Date, amount: f64, currency: Currency) -> Cashflow {
        Cashflow {
            date,
            amount,
            currency,
        }
    }

    pub fn date(&self) -> Date {
        self.date
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }
}
