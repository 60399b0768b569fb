use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    #[default]
    Stable,
}

/// A single vendor's quoted price for a hotel on a date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    #[serde(alias = "source")]
    pub vendor: String,
    #[serde(default)]
    pub price: Option<Decimal>,
}

/// Latest price snapshot attached to a hotel.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceInfo {
    #[serde(default)]
    pub current_price: Option<Decimal>,
    #[serde(default)]
    pub previous_price: Option<Decimal>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub trend: Trend,
    #[serde(default)]
    pub change_percent: Option<Decimal>,
    #[serde(default)]
    pub recorded_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub offers: Vec<Offer>,
    /// Set upstream when the value was inferred (sold out, rejected drop).
    #[serde(default)]
    pub is_estimated: bool,
}

/// A competitor's price on one calendar day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompetitorDayPrice {
    pub hotel_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub offers: Vec<Offer>,
    #[serde(default)]
    pub is_estimated: bool,
}

/// Sub-day observation. Informational only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntradayEvent {
    pub recorded_at: DateTime<Utc>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub vendor: Option<String>,
}

/// One calendar row of the comparison set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyPrice {
    pub date: NaiveDate,
    #[serde(default)]
    pub target_price: Option<Decimal>,
    #[serde(default)]
    pub target_offers: Vec<Offer>,
    #[serde(default)]
    pub target_is_estimated: bool,
    #[serde(default)]
    pub competitors: Vec<CompetitorDayPrice>,
    #[serde(default)]
    pub market_average: Option<Decimal>,
    #[serde(default)]
    pub deviation_pct: Option<Decimal>,
    #[serde(default)]
    pub intraday: Vec<IntradayEvent>,
}

/// Put intraday events in recorded order, oldest first.
pub fn sort_intraday(events: &mut [IntradayEvent]) {
    events.sort_by_key(|e| e.recorded_at);
}

/// Treat zero and negative prices as absent.
pub fn priced(value: Option<Decimal>) -> Option<Decimal> {
    value.filter(|p| *p > Decimal::ZERO)
}
