//! Sensor connectivity handlers

use axum::extract::State;
use axum::Json;
use bms_core::{sensor_statuses, ReadingFilter, SensorStatus, StatusOverview};
use chrono::Utc;
use serde::Serialize;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct SensorStatusResponse {
    pub overview: StatusOverview,
    pub items: Vec<SensorStatus>,
    pub offline_threshold_secs: i64,
}

/// GET /api/v1/sensors/status
/// Online/offline state of every sensor that has reported
pub async fn sensor_status(State(state): State<AppState>) -> Result<Json<SensorStatusResponse>, ApiError> {
    let readings = state.store().list_readings(&ReadingFilter::default()).await?;
    let threshold = state.offline_threshold();
    let items = sensor_statuses(&readings, Utc::now(), threshold);

    Ok(Json(SensorStatusResponse {
        overview: StatusOverview::from_statuses(&items),
        items,
        offline_threshold_secs: threshold.num_seconds(),
    }))
}
