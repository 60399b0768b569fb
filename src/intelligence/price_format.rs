use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::models::{priced, PriceInfo};

/// Shown wherever a price is absent. Never render a missing price as `0`.
pub const NO_DATA: &str = "—";

/// Display-ready price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceDisplay {
    pub formatted: String,
    pub has_data: bool,
    pub is_estimated: bool,
    pub value: Option<Decimal>,
}

impl PriceDisplay {
    pub fn from_price_info(info: Option<&PriceInfo>, fallback_currency: &str) -> Self {
        match info {
            Some(info) => normalize_price(
                info.current_price,
                info.currency.as_deref().unwrap_or(fallback_currency),
                info.is_estimated,
            ),
            None => normalize_price(None, fallback_currency, false),
        }
    }
}

pub fn normalize_price(price: Option<Decimal>, currency: &str, is_estimated: bool) -> PriceDisplay {
    match priced(price) {
        Some(value) => PriceDisplay {
            formatted: format_currency(value, currency),
            has_data: true,
            is_estimated,
            value: Some(value),
        },
        None => PriceDisplay {
            formatted: NO_DATA.into(),
            has_data: false,
            is_estimated,
            value: None,
        },
    }
}

fn currency_symbol(code: &str) -> Option<&'static str> {
    match code {
        "USD" => Some("$"),
        "EUR" => Some("€"),
        "GBP" => Some("£"),
        "TRY" => Some("₺"),
        "JPY" => Some("¥"),
        "INR" => Some("₹"),
        _ => None,
    }
}

/// Whole-unit amount with thousands grouping, e.g. `$1,245` or `CHF 980`.
pub fn format_currency(amount: Decimal, currency: &str) -> String {
    let code = currency.trim().to_uppercase();
    let rounded = amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    let grouped = group_thousands(&rounded.abs().trunc().to_string());

    match currency_symbol(&code) {
        Some(symbol) => format!("{sign}{symbol}{grouped}"),
        None if code.is_empty() => format!("{sign}{grouped}"),
        None => format!("{sign}{code} {grouped}"),
    }
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
