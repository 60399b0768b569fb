pub mod directory;
pub mod health;
pub mod hotels;
pub mod rates;
pub mod reports;
pub mod scans;
pub mod ws;

use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use crate::errors::AppError;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, AppError>;

/// Split a comma-separated query value, dropping blanks.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse `hotels=<uuid>,<uuid>`. Absent means no filter.
pub fn parse_hotel_filter(raw: Option<&str>) -> Result<Option<Vec<Uuid>>, AppError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    split_list(raw)
        .iter()
        .map(|s| {
            Uuid::parse_str(s).map_err(|_| AppError::BadRequest(format!("invalid hotel id: {s}")))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}
