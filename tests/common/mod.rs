use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use ratewatch::api::router::create_router;
use ratewatch::api::ws_types::ScopedMessage;
use ratewatch::backend::{BackendError, CurrentSession, RateBackend};
use ratewatch::config::AppConfig;
use ratewatch::models::{
    DailyPrice, DirectorySuggestion, Hotel, HotelUpdate, IntradayEvent, LogStatus, NewHotel,
    Offer, PriceInfo, QueryLog, ScanRequest, ScanSession, ScanStatus,
};
use ratewatch::services::WatchRegistry;
use ratewatch::AppState;

pub const TEST_TOKEN: &str = "test-token";
/// Token the mock backend rejects, as if the user's session had expired.
#[allow(dead_code)]
pub const EXPIRED_TOKEN: &str = "expired";
/// A valid token for a different account. Scan sessions belong to the
/// `TEST_TOKEN` account, so this one gets not-found for them.
#[allow(dead_code)]
pub const OTHER_USER_TOKEN: &str = "other-user";

/// In-memory backend. Status fetches follow a script: each call consumes
/// the next entry (`None` fails the fetch) and the last entry repeats.
#[derive(Default)]
pub struct MockBackend {
    pub hotels: Mutex<Vec<Hotel>>,
    pub sessions: Mutex<Vec<ScanSession>>,
    pub logs: Mutex<HashMap<Uuid, Vec<QueryLog>>>,
    pub daily: Mutex<Vec<DailyPrice>>,
    pub status_script: Mutex<VecDeque<Option<ScanStatus>>>,
    pub fail_logs: Mutex<bool>,
    pub created_scans: Mutex<Vec<ScanRequest>>,
    pub status_calls: AtomicUsize,
    pub log_calls: AtomicUsize,
    pub directory_calls: AtomicUsize,
}

#[allow(dead_code)]
impl MockBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_hotels(hotels: Vec<Hotel>) -> Arc<Self> {
        let backend = Self::default();
        *backend.hotels.lock().unwrap() = hotels;
        Arc::new(backend)
    }

    pub fn script_status(&self, script: &[Option<ScanStatus>]) {
        *self.status_script.lock().unwrap() = script.iter().copied().collect();
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn log_calls(&self) -> usize {
        self.log_calls.load(Ordering::SeqCst)
    }

    pub fn directory_calls(&self) -> usize {
        self.directory_calls.load(Ordering::SeqCst)
    }

    fn check(&self, session: &CurrentSession) -> Result<(), BackendError> {
        if session.access_token() == EXPIRED_TOKEN {
            Err(BackendError::Unauthorized)
        } else {
            Ok(())
        }
    }

    fn check_owner(&self, session: &CurrentSession, id: Uuid) -> Result<(), BackendError> {
        self.check(session)?;
        if session.access_token() == OTHER_USER_TOKEN {
            return Err(BackendError::NotFound(format!("session {id}")));
        }
        Ok(())
    }

    fn find_hotel(&self, id: Uuid) -> Result<Hotel, BackendError> {
        self.hotels
            .lock()
            .unwrap()
            .iter()
            .find(|h| h.id == id)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(format!("hotel {id}")))
    }
}

#[async_trait]
impl RateBackend for MockBackend {
    async fn list_hotels(&self, session: &CurrentSession) -> Result<Vec<Hotel>, BackendError> {
        self.check(session)?;
        Ok(self.hotels.lock().unwrap().clone())
    }

    async fn create_hotel(
        &self,
        session: &CurrentSession,
        hotel: &NewHotel,
    ) -> Result<Hotel, BackendError> {
        self.check(session)?;
        let mut created = make_hotel(&hotel.name, hotel.is_target, None, &[]);
        if let Some(currency) = &hotel.currency {
            created.currency = currency.clone();
        }
        created.location = hotel.location.clone();
        created.external_cluster_id = hotel.external_cluster_id.clone();
        self.hotels.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn update_hotel(
        &self,
        session: &CurrentSession,
        id: Uuid,
        update: &HotelUpdate,
    ) -> Result<Hotel, BackendError> {
        self.check(session)?;
        let mut hotels = self.hotels.lock().unwrap();
        let hotel = hotels
            .iter_mut()
            .find(|h| h.id == id)
            .ok_or_else(|| BackendError::NotFound(format!("hotel {id}")))?;
        if let Some(name) = &update.name {
            hotel.name = name.clone();
        }
        if let Some(location) = &update.location {
            hotel.location = Some(location.clone());
        }
        Ok(hotel.clone())
    }

    async fn delete_hotel(&self, session: &CurrentSession, id: Uuid) -> Result<(), BackendError> {
        self.check(session)?;
        self.find_hotel(id)?;
        self.hotels.lock().unwrap().retain(|h| h.id != id);
        Ok(())
    }

    async fn set_target(&self, session: &CurrentSession, id: Uuid) -> Result<Hotel, BackendError> {
        self.check(session)?;
        self.find_hotel(id)?;
        let mut hotels = self.hotels.lock().unwrap();
        for hotel in hotels.iter_mut() {
            hotel.is_target = hotel.id == id;
        }
        Ok(hotels.iter().find(|h| h.id == id).cloned().unwrap())
    }

    async fn daily_prices(
        &self,
        session: &CurrentSession,
        _hotel_id: Uuid,
        _start: NaiveDate,
        days: u32,
    ) -> Result<Vec<DailyPrice>, BackendError> {
        self.check(session)?;
        let daily = self.daily.lock().unwrap();
        Ok(daily.iter().take(days as usize).cloned().collect())
    }

    async fn intraday(
        &self,
        session: &CurrentSession,
        _hotel_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<IntradayEvent>, BackendError> {
        self.check(session)?;
        let daily = self.daily.lock().unwrap();
        Ok(daily
            .iter()
            .find(|d| d.date == date)
            .map(|d| d.intraday.clone())
            .unwrap_or_default())
    }

    async fn list_sessions(
        &self,
        session: &CurrentSession,
        limit: u32,
    ) -> Result<Vec<ScanSession>, BackendError> {
        self.check(session)?;
        let sessions = self.sessions.lock().unwrap();
        Ok(sessions.iter().take(limit as usize).cloned().collect())
    }

    async fn get_session(
        &self,
        session: &CurrentSession,
        id: Uuid,
    ) -> Result<ScanSession, BackendError> {
        self.check_owner(session, id)?;
        self.status_calls.fetch_add(1, Ordering::SeqCst);

        let mut script = self.status_script.lock().unwrap();
        let next = if script.len() > 1 {
            script.pop_front().flatten()
        } else {
            script.front().copied().flatten()
        };

        match next {
            Some(status) => Ok(make_session(id, status, 2)),
            None => Err(BackendError::Timeout),
        }
    }

    async fn session_logs(
        &self,
        session: &CurrentSession,
        id: Uuid,
    ) -> Result<Vec<QueryLog>, BackendError> {
        self.check_owner(session, id)?;
        self.log_calls.fetch_add(1, Ordering::SeqCst);
        if *self.fail_logs.lock().unwrap() {
            return Err(BackendError::Timeout);
        }
        Ok(self.logs.lock().unwrap().get(&id).cloned().unwrap_or_default())
    }

    async fn create_scan(
        &self,
        session: &CurrentSession,
        request: &ScanRequest,
    ) -> Result<ScanSession, BackendError> {
        self.check(session)?;
        self.created_scans.lock().unwrap().push(request.clone());
        let mut created = make_session(Uuid::new_v4(), ScanStatus::Pending, request.hotel_ids.len() as u32);
        created.created_at = Some(Utc::now());
        self.sessions.lock().unwrap().insert(0, created.clone());
        Ok(created)
    }

    async fn search_directory(
        &self,
        session: &CurrentSession,
        query: &str,
        city: Option<&str>,
    ) -> Result<Vec<DirectorySuggestion>, BackendError> {
        self.check(session)?;
        self.directory_calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![DirectorySuggestion {
            name: format!("{query} Hotel"),
            location: city.map(str::to_string),
            external_cluster_id: Some("cluster-1".into()),
        }])
    }
}

#[allow(dead_code)]
pub fn make_hotel(name: &str, is_target: bool, price: Option<i64>, offers: &[(&str, i64)]) -> Hotel {
    Hotel {
        id: Uuid::new_v4(),
        name: name.into(),
        location: None,
        currency: "USD".into(),
        is_target,
        rating: None,
        stars: None,
        fixed_check_in: None,
        fixed_check_out: None,
        default_adults: None,
        external_cluster_id: None,
        price_info: Some(PriceInfo {
            current_price: price.map(Decimal::from),
            offers: offers
                .iter()
                .map(|(vendor, p)| Offer {
                    vendor: vendor.to_string(),
                    price: Some(Decimal::from(*p)),
                })
                .collect(),
            ..Default::default()
        }),
    }
}

#[allow(dead_code)]
pub fn make_session(id: Uuid, status: ScanStatus, hotels_count: u32) -> ScanSession {
    ScanSession {
        id,
        status,
        hotels_count,
        check_in_date: None,
        check_out_date: None,
        adults: Some(2),
        reasoning_trace: vec![],
        created_at: Some(Utc::now()),
        completed_at: None,
    }
}

#[allow(dead_code)]
pub fn make_log(session_id: Uuid, hotel: &str, price: Option<i64>, vendor: Option<&str>) -> QueryLog {
    QueryLog {
        id: Some(Uuid::new_v4()),
        session_id: Some(session_id),
        hotel_name: hotel.into(),
        location: Some("Istanbul, Beyoglu".into()),
        price: price.map(Decimal::from),
        currency: Some("USD".into()),
        vendor: vendor.map(str::to_string),
        status: if price.is_some() { LogStatus::Success } else { LogStatus::Error },
        created_at: Utc::now(),
    }
}

#[allow(dead_code)]
pub fn test_config() -> AppConfig {
    AppConfig {
        backend_url: "http://backend.invalid".into(),
        host: "127.0.0.1".into(),
        port: 0,
        request_timeout_secs: 15,
        poll_interval_secs: 3,
        default_visible_vendors: 6,
        max_competitors: 5,
        scan_daily_limit: 10,
        hotel_plan_limit: None,
        require_currency: true,
        allow_manual_entry: true,
    }
}

#[allow(dead_code)]
pub fn build_test_app(backend: Arc<MockBackend>, config: AppConfig) -> axum::Router {
    let (ws_tx, _) = tokio::sync::broadcast::channel::<ScopedMessage>(16);
    let metrics_handle = ratewatch::metrics::init_metrics();
    let watchers = WatchRegistry::new(config.poll_interval());

    let state = AppState {
        backend,
        config,
        ws_tx,
        metrics_handle,
        watchers,
    };
    create_router(state)
}

/// Request builder with the test bearer token already attached.
#[allow(dead_code)]
pub fn authed(method: &str, uri: &str) -> axum::http::request::Builder {
    authed_as(TEST_TOKEN, method, uri)
}

#[allow(dead_code)]
pub fn authed_as(token: &str, method: &str, uri: &str) -> axum::http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
}

#[allow(dead_code)]
pub fn empty_body() -> Body {
    Body::empty()
}
