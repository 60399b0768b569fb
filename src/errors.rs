use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::backend::BackendError;
use crate::intelligence::FormViolation;

/// Where the dashboard sends clients without a valid session.
pub const LOGIN_URL: &str = "/login";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not authenticated")]
    NotAuthenticated { login_url: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Backend unavailable: {0}")]
    Upstream(String),

    #[error("Backend timed out")]
    Timeout,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn not_authenticated() -> Self {
        AppError::NotAuthenticated {
            login_url: LOGIN_URL.into(),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    login_url: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut login_url = None;
        let (status, message) = match &self {
            AppError::NotAuthenticated { login_url: url } => {
                login_url = Some(url.clone());
                (StatusCode::UNAUTHORIZED, "Not authenticated".into())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Upstream(msg) => {
                tracing::warn!("Backend fetch failed: {msg}");
                (StatusCode::BAD_GATEWAY, msg.clone())
            }
            AppError::Timeout => (StatusCode::GATEWAY_TIMEOUT, "Backend timed out".into()),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".into())
            }
        };

        (
            status,
            Json(ErrorBody {
                success: false,
                error: message,
                login_url,
            }),
        )
            .into_response()
    }
}

impl From<BackendError> for AppError {
    fn from(e: BackendError) -> Self {
        match e {
            BackendError::Unauthorized => AppError::not_authenticated(),
            BackendError::NotFound(what) => AppError::NotFound(what),
            BackendError::Timeout => AppError::Timeout,
            BackendError::Status { status, body } if status.is_client_error() => {
                AppError::BadRequest(body)
            }
            other => AppError::Upstream(other.to_string()),
        }
    }
}

impl From<FormViolation> for AppError {
    fn from(v: FormViolation) -> Self {
        AppError::BadRequest(v.to_string())
    }
}
