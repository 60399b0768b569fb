use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::price_format::{format_currency, NO_DATA};
use crate::models::priced;

/// How an offer sits relative to the target's own price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParityStatus {
    /// Strictly cheaper than the target.
    Undercut,
    /// At or above the target.
    Parity,
    /// No usable offer price.
    Unavailable,
    /// Offer is priced but the target price is unknown, so no comparison.
    Unrated,
}

impl ParityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParityStatus::Undercut => "undercut",
            ParityStatus::Parity => "parity",
            ParityStatus::Unavailable => "unavailable",
            ParityStatus::Unrated => "unrated",
        }
    }
}

impl fmt::Display for ParityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParityCell {
    pub status: ParityStatus,
    pub formatted_price: String,
    pub price: Option<Decimal>,
}

/// Classify an offer against the target price.
///
/// Equal prices are parity, never undercut.
pub fn evaluate(offer: Option<Decimal>, target: Option<Decimal>, currency: &str) -> ParityCell {
    let Some(offer) = priced(offer) else {
        return ParityCell {
            status: ParityStatus::Unavailable,
            formatted_price: NO_DATA.into(),
            price: None,
        };
    };

    let status = match priced(target) {
        Some(target) if offer < target => ParityStatus::Undercut,
        Some(_) => ParityStatus::Parity,
        None => ParityStatus::Unrated,
    };

    ParityCell {
        status,
        formatted_price: format_currency(offer, currency),
        price: Some(offer),
    }
}
