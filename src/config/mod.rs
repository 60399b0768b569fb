use std::env;
use std::time::Duration;

use crate::intelligence::{HotelFormPolicy, DEFAULT_VISIBLE_VENDORS, MAX_COMPETITORS};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub backend_url: String,
    pub host: String,
    pub port: u16,

    // Backend client
    pub request_timeout_secs: u64,

    // Session polling
    pub poll_interval_secs: u64,

    // Rate grid
    pub default_visible_vendors: usize,
    pub max_competitors: usize,

    // Plan limits
    pub scan_daily_limit: u32,
    pub hotel_plan_limit: Option<usize>,
    pub require_currency: bool,
    pub allow_manual_entry: bool,
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            backend_url: env::var("BACKEND_URL")
                .map_err(|_| anyhow::anyhow!("BACKEND_URL must be set"))?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()?,

            request_timeout_secs: parse_or("REQUEST_TIMEOUT_SECS", 15u64).max(1),
            poll_interval_secs: parse_or("POLL_INTERVAL_SECS", 3u64).max(1),

            default_visible_vendors: parse_or("DEFAULT_VISIBLE_VENDORS", DEFAULT_VISIBLE_VENDORS),
            max_competitors: parse_or("MAX_COMPETITORS", MAX_COMPETITORS),

            scan_daily_limit: parse_or("SCAN_DAILY_LIMIT", 10u32),
            hotel_plan_limit: env::var("HOTEL_PLAN_LIMIT")
                .ok()
                .and_then(|v| v.trim().parse().ok()),
            require_currency: parse_or("REQUIRE_CURRENCY", true),
            allow_manual_entry: parse_or("ALLOW_MANUAL_ENTRY", true),
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn hotel_form_policy(&self) -> HotelFormPolicy {
        HotelFormPolicy {
            require_currency: self.require_currency,
            allow_manual_entry: self.allow_manual_entry,
            plan_limit: self.hotel_plan_limit,
        }
    }
}
