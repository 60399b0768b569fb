use axum::extract::{Query, State};
use axum::{Extension, Json};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{parse_hotel_filter, split_list, ApiResponse, ApiResult};
use crate::backend::CurrentSession;
use crate::errors::AppError;
use crate::intelligence::rate_grid::select_competitors;
use crate::intelligence::vendors::ranked_names;
use crate::intelligence::{
    aggregate_vendors, annotate_daily, build_daily_matrix, build_vendor_grid, DailyMatrix,
    VendorCount, VendorGrid, VendorSelection,
};
use crate::models::{sort_intraday, split_target, CompSet, IntradayEvent};
use crate::AppState;

const DEFAULT_DAYS: u32 = 14;
const MAX_DAYS: u32 = 90;

#[derive(Debug, Deserialize)]
pub struct GridQuery {
    /// Comma-separated explicit vendor selection. Present but empty means
    /// the user hid every column.
    pub vendors: Option<String>,
    pub hotels: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GridResponse {
    /// Every vendor seen across the comp set, most common first.
    pub vendors: Vec<VendorCount>,
    pub selection: VendorSelection,
    pub visible: Vec<String>,
    /// `None` until the account has a target hotel.
    pub grid: Option<VendorGrid>,
}

/// Vendor ranking over the target and the competitors that will be shown.
fn rank_vendors(comp_set: &CompSet, filter: Option<&[Uuid]>, max: usize) -> Vec<VendorCount> {
    let target_offers = comp_set.target.as_ref().map(|t| t.offers()).unwrap_or(&[]);
    let shown = select_competitors(&comp_set.competitors, filter, max);
    aggregate_vendors(target_offers, shown.into_iter().map(|h| h.offers()))
}

/// GET /api/rates/grid
pub async fn grid(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Query(q): Query<GridQuery>,
) -> ApiResult<GridResponse> {
    let filter = parse_hotel_filter(q.hotels.as_deref())?;
    let comp_set = split_target(state.backend.list_hotels(&session).await?);
    let max = state.config.max_competitors;

    let vendors = rank_vendors(&comp_set, filter.as_deref(), max);
    let ranked = ranked_names(&vendors);

    let selection = match q.vendors.as_deref() {
        Some(raw) => VendorSelection::Explicit(split_list(raw)),
        None => VendorSelection::Default,
    };
    let visible = selection.visible(&ranked, state.config.default_visible_vendors);

    let grid = comp_set.target.as_ref().map(|target| {
        build_vendor_grid(target, &comp_set.competitors, filter.as_deref(), &visible, max)
    });

    Ok(ApiResponse::ok(GridResponse {
        vendors,
        selection,
        visible,
        grid,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    #[serde(default)]
    pub selection: VendorSelection,
    pub vendor: Option<String>,
    #[serde(default)]
    pub reset: bool,
    #[serde(default)]
    pub hotels: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub selection: VendorSelection,
    pub visible: Vec<String>,
}

/// POST /api/rates/vendors/toggle: apply one selection transition.
pub async fn toggle_vendor(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Json(body): Json<ToggleRequest>,
) -> ApiResult<ToggleResponse> {
    let filter = parse_hotel_filter(body.hotels.as_deref())?;
    let comp_set = split_target(state.backend.list_hotels(&session).await?);
    let ranked = ranked_names(&rank_vendors(
        &comp_set,
        filter.as_deref(),
        state.config.max_competitors,
    ));
    let n = state.config.default_visible_vendors;

    let selection = if body.reset {
        body.selection.reset()
    } else {
        let vendor = body
            .vendor
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::BadRequest("vendor is required".into()))?;
        body.selection.toggle(vendor, &ranked, n)
    };

    let visible = selection.visible(&ranked, n);
    Ok(ApiResponse::ok(ToggleResponse { selection, visible }))
}

#[derive(Debug, Deserialize)]
pub struct DailyQuery {
    pub start: Option<NaiveDate>,
    pub days: Option<u32>,
    pub hotels: Option<String>,
}

/// GET /api/rates/daily: the target's date matrix against its competitors.
pub async fn daily(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Query(q): Query<DailyQuery>,
) -> ApiResult<Option<DailyMatrix>> {
    let filter = parse_hotel_filter(q.hotels.as_deref())?;
    let start = q.start.unwrap_or_else(|| Utc::now().date_naive());
    let days = q.days.unwrap_or(DEFAULT_DAYS).clamp(1, MAX_DAYS);

    let comp_set = split_target(state.backend.list_hotels(&session).await?);
    let Some(target) = comp_set.target else {
        return Ok(ApiResponse::ok(None));
    };

    let mut rows = state
        .backend
        .daily_prices(&session, target.id, start, days)
        .await?;
    annotate_daily(&mut rows);

    let matrix = build_daily_matrix(
        &target,
        &rows,
        filter.as_deref(),
        state.config.max_competitors,
    );
    Ok(ApiResponse::ok(Some(matrix)))
}

#[derive(Debug, Deserialize)]
pub struct IntradayQuery {
    pub hotel_id: Uuid,
    pub date: NaiveDate,
}

/// GET /api/rates/intraday: price changes within one day, oldest first.
pub async fn intraday(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Query(q): Query<IntradayQuery>,
) -> ApiResult<Vec<IntradayEvent>> {
    let mut events = state.backend.intraday(&session, q.hotel_id, q.date).await?;
    sort_intraday(&mut events);
    Ok(ApiResponse::ok(events))
}
