use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::price::{Offer, PriceInfo};

pub const DEFAULT_CURRENCY: &str = "USD";

fn default_currency() -> String {
    DEFAULT_CURRENCY.into()
}

/// A tracked property as returned by the backend, with its latest price snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hotel {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub is_target: bool,
    #[serde(default)]
    pub rating: Option<Decimal>,
    #[serde(default)]
    pub stars: Option<i32>,
    #[serde(default)]
    pub fixed_check_in: Option<NaiveDate>,
    #[serde(default)]
    pub fixed_check_out: Option<NaiveDate>,
    #[serde(default)]
    pub default_adults: Option<u32>,
    /// Directory cluster id linking the hotel to an external pricing source.
    #[serde(default, alias = "serp_api_id")]
    pub external_cluster_id: Option<String>,
    #[serde(default)]
    pub price_info: Option<PriceInfo>,
}

impl Hotel {
    /// Headline price, treating zero as no data.
    pub fn current_price(&self) -> Option<Decimal> {
        self.price_info
            .as_ref()
            .and_then(|p| p.current_price)
            .filter(|p| *p > Decimal::ZERO)
    }

    pub fn offers(&self) -> &[Offer] {
        self.price_info
            .as_ref()
            .map(|p| p.offers.as_slice())
            .unwrap_or(&[])
    }

    /// Currency to display prices in: the snapshot's own currency wins.
    pub fn display_currency(&self) -> &str {
        self.price_info
            .as_ref()
            .and_then(|p| p.currency.as_deref())
            .unwrap_or(&self.currency)
    }
}

/// Payload for creating a hotel through the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewHotel {
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub is_target: bool,
    #[serde(default)]
    pub external_cluster_id: Option<String>,
}

/// Partial update; absent fields are left untouched by the backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HotelUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_check_in: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_check_out: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_adults: Option<u32>,
}

/// A name/location candidate from the hotel directory search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectorySuggestion {
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default, alias = "serp_api_id")]
    pub external_cluster_id: Option<String>,
}

/// The user's own property plus everything it is compared against.
#[derive(Debug, Clone)]
pub struct CompSet {
    pub target: Option<Hotel>,
    pub competitors: Vec<Hotel>,
}

/// Split a hotel list into the target and its competitors.
///
/// The first hotel flagged `is_target` wins. Any further target flags are
/// a backend inconsistency; those hotels are compared like competitors.
pub fn split_target(hotels: Vec<Hotel>) -> CompSet {
    let mut target: Option<Hotel> = None;
    let mut competitors = Vec::with_capacity(hotels.len());

    for hotel in hotels {
        if hotel.is_target && target.is_none() {
            target = Some(hotel);
        } else {
            if hotel.is_target {
                tracing::warn!(
                    hotel_id = %hotel.id,
                    name = %hotel.name,
                    "Multiple target hotels, treating extra as competitor"
                );
            }
            competitors.push(hotel);
        }
    }

    CompSet { target, competitors }
}
