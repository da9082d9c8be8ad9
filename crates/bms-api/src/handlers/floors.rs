//! Floor and room handlers

use axum::extract::{Path, State};
use axum::Json;
use bms_core::{FaultFilter, StoreError};
use serde::Serialize;

use super::faults::{FaultInfoResponse, FaultsResponse, RECENT_LIMIT};
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct RoomsResponse {
    pub floor: i32,
    pub rooms: Vec<i32>,
}

/// GET /api/v1/floors/{floor}/faults
/// The newest unresolved faults on a floor
pub async fn floor_faults(
    State(state): State<AppState>,
    Path(floor): Path<i32>,
) -> Result<Json<FaultsResponse>, ApiError> {
    let filter = FaultFilter {
        floor: Some(floor),
        limit: Some(RECENT_LIMIT),
        ..FaultFilter::active()
    };
    let faults = state.store().list_faults(&filter).await?;
    Ok(Json(FaultsResponse::from_records(faults)))
}

/// GET /api/v1/floors/{floor}/rooms
pub async fn floor_rooms(
    State(state): State<AppState>,
    Path(floor): Path<i32>,
) -> Result<Json<RoomsResponse>, ApiError> {
    let rooms = state.store().rooms_on_floor(floor).await?;
    Ok(Json(RoomsResponse { floor, rooms }))
}

/// GET /api/v1/floors/{floor}/rooms/{room}/latest-fault
pub async fn latest_room_fault(
    State(state): State<AppState>,
    Path((floor, room)): Path<(i32, i32)>,
) -> Result<Json<FaultInfoResponse>, ApiError> {
    let fault = state
        .store()
        .latest_active_fault(floor, room)
        .await?
        .ok_or(StoreError::NoActiveFault { floor, room })?;
    Ok(Json(fault.into()))
}
