use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::NaiveDate;
use metrics::{counter, histogram};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use uuid::Uuid;

use super::session::CurrentSession;
use super::RateBackend;
use crate::models::{
    DailyPrice, DirectorySuggestion, Hotel, HotelUpdate, IntradayEvent, NewHotel, QueryLog,
    ScanRequest, ScanSession,
};

/// Longest error body kept for diagnostics.
const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request timed out")]
    Timeout,

    #[error("not authenticated")]
    Unauthorized,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("backend returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("unexpected response: {0}")]
    Decode(String),
}

impl BackendError {
    fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            BackendError::Timeout
        } else if e.is_decode() {
            BackendError::Decode(e.to_string())
        } else {
            BackendError::Http(e)
        }
    }
}

#[derive(Debug, Clone)]
pub struct BackendClient {
    http: Client,
    base_url: String,
}

impl BackendClient {
    /// Build a client with an explicit per-request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BackendError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(http, base_url))
    }

    pub fn with_client(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request, recording latency and mapping HTTP failures to
    /// `BackendError` kinds.
    async fn execute(
        &self,
        op: &'static str,
        req: RequestBuilder,
        session: &CurrentSession,
    ) -> Result<Response, BackendError> {
        counter!("backend_requests_total", "op" => op).increment(1);
        let started = Instant::now();

        let result = req.bearer_auth(session.access_token()).send().await;
        histogram!("backend_latency_seconds", "op" => op).record(started.elapsed().as_secs_f64());

        let resp = match result {
            Ok(resp) => resp,
            Err(e) => {
                counter!("backend_request_failures_total", "op" => op).increment(1);
                return Err(BackendError::from_reqwest(e));
            }
        };

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        counter!("backend_request_failures_total", "op" => op).increment(1);
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(BackendError::Unauthorized),
            StatusCode::NOT_FOUND => Err(BackendError::NotFound(resp.url().path().to_string())),
            _ => {
                let body: String = resp
                    .text()
                    .await
                    .unwrap_or_default()
                    .chars()
                    .take(MAX_ERROR_BODY)
                    .collect();
                tracing::warn!(op, status = %status, "Backend returned error status");
                Err(BackendError::Status { status, body })
            }
        }
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        op: &'static str,
        req: RequestBuilder,
        session: &CurrentSession,
    ) -> Result<T, BackendError> {
        let resp = self.execute(op, req, session).await?;
        resp.json::<T>().await.map_err(BackendError::from_reqwest)
    }
}

#[async_trait]
impl RateBackend for BackendClient {
    async fn list_hotels(&self, session: &CurrentSession) -> Result<Vec<Hotel>, BackendError> {
        let req = self.http.get(self.url("/hotels"));
        self.fetch("list_hotels", req, session).await
    }

    async fn create_hotel(
        &self,
        session: &CurrentSession,
        hotel: &NewHotel,
    ) -> Result<Hotel, BackendError> {
        let req = self.http.post(self.url("/hotels")).json(hotel);
        self.fetch("create_hotel", req, session).await
    }

    async fn update_hotel(
        &self,
        session: &CurrentSession,
        id: Uuid,
        update: &HotelUpdate,
    ) -> Result<Hotel, BackendError> {
        let req = self.http.patch(self.url(&format!("/hotels/{id}"))).json(update);
        self.fetch("update_hotel", req, session).await
    }

    async fn delete_hotel(&self, session: &CurrentSession, id: Uuid) -> Result<(), BackendError> {
        let req = self.http.delete(self.url(&format!("/hotels/{id}")));
        self.execute("delete_hotel", req, session).await?;
        Ok(())
    }

    async fn set_target(&self, session: &CurrentSession, id: Uuid) -> Result<Hotel, BackendError> {
        let req = self.http.post(self.url(&format!("/hotels/{id}/target")));
        self.fetch("set_target", req, session).await
    }

    async fn daily_prices(
        &self,
        session: &CurrentSession,
        hotel_id: Uuid,
        start: NaiveDate,
        days: u32,
    ) -> Result<Vec<DailyPrice>, BackendError> {
        let req = self
            .http
            .get(self.url(&format!("/hotels/{hotel_id}/daily-prices")))
            .query(&[("start", start.to_string()), ("days", days.to_string())]);
        self.fetch("daily_prices", req, session).await
    }

    async fn intraday(
        &self,
        session: &CurrentSession,
        hotel_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<IntradayEvent>, BackendError> {
        let req = self
            .http
            .get(self.url(&format!("/hotels/{hotel_id}/intraday")))
            .query(&[("date", date.to_string())]);
        self.fetch("intraday", req, session).await
    }

    async fn list_sessions(
        &self,
        session: &CurrentSession,
        limit: u32,
    ) -> Result<Vec<ScanSession>, BackendError> {
        let req = self
            .http
            .get(self.url("/scan-sessions"))
            .query(&[("limit", limit.to_string())]);
        self.fetch("list_sessions", req, session).await
    }

    async fn get_session(
        &self,
        session: &CurrentSession,
        id: Uuid,
    ) -> Result<ScanSession, BackendError> {
        let req = self.http.get(self.url(&format!("/scan-sessions/{id}")));
        self.fetch("get_session", req, session).await
    }

    async fn session_logs(
        &self,
        session: &CurrentSession,
        id: Uuid,
    ) -> Result<Vec<QueryLog>, BackendError> {
        let req = self.http.get(self.url(&format!("/scan-sessions/{id}/logs")));
        self.fetch("session_logs", req, session).await
    }

    async fn create_scan(
        &self,
        session: &CurrentSession,
        request: &ScanRequest,
    ) -> Result<ScanSession, BackendError> {
        let req = self.http.post(self.url("/scan-sessions")).json(request);
        self.fetch("create_scan", req, session).await
    }

    async fn search_directory(
        &self,
        session: &CurrentSession,
        query: &str,
        city: Option<&str>,
    ) -> Result<Vec<DirectorySuggestion>, BackendError> {
        let mut params = vec![("q", query)];
        if let Some(city) = city {
            params.push(("city", city));
        }
        let req = self.http.get(self.url("/directory/search")).query(&params);
        self.fetch("search_directory", req, session).await
    }
}
