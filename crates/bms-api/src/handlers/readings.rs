//! Sensor reading handlers

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use bms_core::{AnnotatedReading, FaultFlags, NewReading, ReadingFilter, SensorKind, SensorReading, TimeWindow};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::faults::FaultInfoResponse;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct IngestResponse {
    pub reading: SensorReading,
    /// Everything detected in the reading
    pub fault_flags: FaultFlags,
    /// Faults stored for this reading
    pub faults: Vec<FaultInfoResponse>,
}

#[derive(Serialize)]
pub struct ReadingsResponse {
    pub items: Vec<AnnotatedReading>,
    pub total_count: usize,
}

#[derive(Deserialize, Default)]
pub struct ReadingQuery {
    pub floor: Option<i32>,
    pub room: Option<i32>,
    pub sensor_type: Option<String>,
    /// Time window, e.g. "1hour"
    pub range: Option<String>,
    pub limit: Option<usize>,
}

/// POST /api/v1/readings
/// Store a reading and record any faults detected in it
pub async fn ingest_reading(
    State(state): State<AppState>,
    Json(reading): Json<NewReading>,
) -> Result<(StatusCode, Json<IngestResponse>), ApiError> {
    let store = state.store();
    let reading = store.insert_reading(reading, Utc::now()).await?;

    let detector = state.detector();
    let fault_flags = detector.detect(&reading);

    let mut faults = Vec::new();
    for fault in detector.evaluate(&reading) {
        let record = store.insert_fault(fault).await?;
        faults.push(FaultInfoResponse::from(record));
    }

    Ok((
        StatusCode::CREATED,
        Json(IngestResponse {
            reading,
            fault_flags,
            faults,
        }),
    ))
}

/// GET /api/v1/readings
/// Readings oldest first, each with its out-of-range annotations
pub async fn list_readings(
    State(state): State<AppState>,
    Query(query): Query<ReadingQuery>,
) -> Result<Json<ReadingsResponse>, ApiError> {
    let sensor_type = query
        .sensor_type
        .as_deref()
        .map(str::parse::<SensorKind>)
        .transpose()
        .map_err(ApiError::BadRequest)?;
    let window = query
        .range
        .as_deref()
        .map(str::parse::<TimeWindow>)
        .transpose()
        .map_err(ApiError::BadRequest)?;

    let filter = ReadingFilter {
        floor: query.floor,
        room: query.room,
        sensor_type,
        since: window.map(|w| w.cutoff(Utc::now())),
        until: None,
        limit: query.limit,
    };
    let readings = state.store().list_readings(&filter).await?;

    let items: Vec<AnnotatedReading> = readings.into_iter().map(AnnotatedReading::from).collect();
    Ok(Json(ReadingsResponse {
        total_count: items.len(),
        items,
    }))
}
