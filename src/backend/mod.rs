pub mod client;
pub mod session;

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::{
    DailyPrice, DirectorySuggestion, Hotel, HotelUpdate, IntradayEvent, NewHotel, QueryLog,
    ScanRequest, ScanSession,
};

pub use client::{BackendClient, BackendError};
pub use session::CurrentSession;

/// The pricing backend as seen by this service. It owns persistence and
/// authentication; every call acts on behalf of `session`.
#[async_trait]
pub trait RateBackend: Send + Sync {
    async fn list_hotels(&self, session: &CurrentSession) -> Result<Vec<Hotel>, BackendError>;

    async fn create_hotel(
        &self,
        session: &CurrentSession,
        hotel: &NewHotel,
    ) -> Result<Hotel, BackendError>;

    async fn update_hotel(
        &self,
        session: &CurrentSession,
        id: Uuid,
        update: &HotelUpdate,
    ) -> Result<Hotel, BackendError>;

    async fn delete_hotel(&self, session: &CurrentSession, id: Uuid) -> Result<(), BackendError>;

    /// Flag `id` as the account's target; the backend clears the previous one.
    async fn set_target(&self, session: &CurrentSession, id: Uuid) -> Result<Hotel, BackendError>;

    async fn daily_prices(
        &self,
        session: &CurrentSession,
        hotel_id: Uuid,
        start: NaiveDate,
        days: u32,
    ) -> Result<Vec<DailyPrice>, BackendError>;

    async fn intraday(
        &self,
        session: &CurrentSession,
        hotel_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<IntradayEvent>, BackendError>;

    async fn list_sessions(
        &self,
        session: &CurrentSession,
        limit: u32,
    ) -> Result<Vec<ScanSession>, BackendError>;

    async fn get_session(
        &self,
        session: &CurrentSession,
        id: Uuid,
    ) -> Result<ScanSession, BackendError>;

    async fn session_logs(
        &self,
        session: &CurrentSession,
        id: Uuid,
    ) -> Result<Vec<QueryLog>, BackendError>;

    async fn create_scan(
        &self,
        session: &CurrentSession,
        request: &ScanRequest,
    ) -> Result<ScanSession, BackendError>;

    async fn search_directory(
        &self,
        session: &CurrentSession,
        query: &str,
        city: Option<&str>,
    ) -> Result<Vec<DirectorySuggestion>, BackendError>;
}
