use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{NewHotel, ScanRequest};

pub const MAX_ADULTS: u32 = 8;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormViolation {
    #[error("hotel name is required")]
    EmptyName,

    #[error("currency is required")]
    MissingCurrency,

    #[error("currency must be a 3-letter ISO code, got '{0}'")]
    InvalidCurrency(String),

    #[error("manual entry is disabled, pick a hotel from the directory")]
    ManualEntryDisabled,

    #[error("plan limit reached: {limit} hotels")]
    PlanLimitReached { limit: usize },

    #[error("check-in {check_in} is in the past")]
    CheckInPast { check_in: NaiveDate },

    #[error("check-out must be after check-in")]
    CheckOutBeforeCheckIn,

    #[error("adults must be between 1 and 8, got {0}")]
    InvalidAdults(u32),

    #[error("daily scan limit reached ({limit} per day)")]
    DailyLimitReached { limit: u32 },
}

/// Capabilities of the add/edit hotel form, one policy per product surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotelFormPolicy {
    pub require_currency: bool,
    pub allow_manual_entry: bool,
    pub plan_limit: Option<usize>,
}

impl Default for HotelFormPolicy {
    fn default() -> Self {
        Self {
            require_currency: true,
            allow_manual_entry: true,
            plan_limit: None,
        }
    }
}

impl HotelFormPolicy {
    /// Validate and normalize a new hotel against the policy and the number
    /// of hotels the account already tracks.
    pub fn validate_new_hotel(
        &self,
        hotel: NewHotel,
        existing_count: usize,
    ) -> Result<NewHotel, FormViolation> {
        let name = hotel.name.trim().to_string();
        if name.is_empty() {
            return Err(FormViolation::EmptyName);
        }

        let currency = match hotel.currency.as_deref().map(str::trim) {
            Some(code) if !code.is_empty() => {
                if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
                    return Err(FormViolation::InvalidCurrency(code.to_string()));
                }
                Some(code.to_ascii_uppercase())
            }
            _ if self.require_currency => return Err(FormViolation::MissingCurrency),
            _ => None,
        };

        if !self.allow_manual_entry && hotel.external_cluster_id.is_none() {
            return Err(FormViolation::ManualEntryDisabled);
        }

        if let Some(limit) = self.plan_limit {
            if existing_count >= limit {
                return Err(FormViolation::PlanLimitReached { limit });
            }
        }

        let location = hotel
            .location
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty());

        Ok(NewHotel {
            name,
            location,
            currency,
            is_target: hotel.is_target,
            external_cluster_id: hotel.external_cluster_id,
        })
    }
}

/// Validate a scan request. The daily limit is checked exactly once.
pub fn validate_scan(
    request: &ScanRequest,
    today: NaiveDate,
    scans_today: u32,
    daily_limit: u32,
) -> Result<(), FormViolation> {
    if request.check_in < today {
        return Err(FormViolation::CheckInPast {
            check_in: request.check_in,
        });
    }
    if request.check_out <= request.check_in {
        return Err(FormViolation::CheckOutBeforeCheckIn);
    }
    if request.adults == 0 || request.adults > MAX_ADULTS {
        return Err(FormViolation::InvalidAdults(request.adults));
    }
    if scans_today >= daily_limit {
        return Err(FormViolation::DailyLimitReached { limit: daily_limit });
    }
    Ok(())
}
