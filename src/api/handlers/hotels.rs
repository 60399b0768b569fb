use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::Serialize;
use uuid::Uuid;

use super::{ApiResponse, ApiResult};
use crate::backend::CurrentSession;
use crate::intelligence::PriceDisplay;
use crate::models::{Hotel, HotelUpdate, NewHotel};
use crate::AppState;

/// A hotel with its headline price already normalized for display.
#[derive(Debug, Serialize)]
pub struct HotelView {
    #[serde(flatten)]
    pub hotel: Hotel,
    pub display: PriceDisplay,
}

impl From<Hotel> for HotelView {
    fn from(hotel: Hotel) -> Self {
        let display = PriceDisplay::from_price_info(hotel.price_info.as_ref(), &hotel.currency);
        Self { hotel, display }
    }
}

/// GET /api/hotels: the target first, then competitors in backend order.
pub async fn list(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
) -> ApiResult<Vec<HotelView>> {
    let mut hotels = state.backend.list_hotels(&session).await?;
    // Stable: keeps backend order within each group.
    hotels.sort_by_key(|h| !h.is_target);
    Ok(ApiResponse::ok(hotels.into_iter().map(HotelView::from).collect()))
}

/// POST /api/hotels
pub async fn create(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Json(body): Json<NewHotel>,
) -> ApiResult<HotelView> {
    let existing = state.backend.list_hotels(&session).await?.len();
    let hotel = state
        .config
        .hotel_form_policy()
        .validate_new_hotel(body, existing)?;

    let created = state.backend.create_hotel(&session, &hotel).await?;
    tracing::info!(hotel_id = %created.id, name = %created.name, "Hotel added");
    Ok(ApiResponse::ok(created.into()))
}

/// PATCH /api/hotels/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Path(id): Path<Uuid>,
    Json(body): Json<HotelUpdate>,
) -> ApiResult<HotelView> {
    let updated = state.backend.update_hotel(&session, id, &body).await?;
    Ok(ApiResponse::ok(updated.into()))
}

/// DELETE /api/hotels/:id
pub async fn remove(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Path(id): Path<Uuid>,
) -> ApiResult<Uuid> {
    state.backend.delete_hotel(&session, id).await?;
    tracing::info!(hotel_id = %id, "Hotel removed");
    Ok(ApiResponse::ok(id))
}

/// POST /api/hotels/:id/target: make `id` the account's own property.
pub async fn set_target(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Path(id): Path<Uuid>,
) -> ApiResult<HotelView> {
    let hotel = state.backend.set_target(&session, id).await?;
    tracing::info!(hotel_id = %id, "Target hotel changed");
    Ok(ApiResponse::ok(hotel.into()))
}
