//! Fault handlers

use axum::extract::{Path, Query, State};
use axum::Json;
use bms_core::{FaultFilter, FaultRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

/// Number of faults shown by the "recent" lists
pub const RECENT_LIMIT: usize = 10;

#[derive(Serialize)]
pub struct FaultsResponse {
    pub items: Vec<FaultInfoResponse>,
    pub total_count: usize,
}

/// A fault record with its decoded flags
#[derive(Serialize)]
pub struct FaultInfoResponse {
    #[serde(flatten)]
    pub record: FaultRecord,
    pub active: bool,
    pub descriptions: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl From<FaultRecord> for FaultInfoResponse {
    fn from(record: FaultRecord) -> Self {
        Self {
            active: record.is_active(),
            descriptions: record.descriptions(),
            location: record.location(),
            record,
        }
    }
}

impl FaultsResponse {
    pub fn from_records(records: Vec<FaultRecord>) -> Self {
        let items: Vec<FaultInfoResponse> = records.into_iter().map(FaultInfoResponse::from).collect();
        Self {
            total_count: items.len(),
            items,
        }
    }
}

#[derive(Deserialize, Default)]
pub struct FaultFilterQuery {
    pub floor: Option<i32>,
    pub room: Option<i32>,
    pub device_type: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub resolved: Option<bool>,
    pub active_only: Option<bool>,
    pub limit: Option<usize>,
}

impl From<FaultFilterQuery> for FaultFilter {
    fn from(query: FaultFilterQuery) -> Self {
        let resolved = match query.active_only {
            Some(true) => Some(false),
            _ => query.resolved,
        };
        FaultFilter {
            floor: query.floor,
            room: query.room,
            device_type: query.device_type,
            since: query.since,
            until: query.until,
            resolved,
            limit: query.limit,
        }
    }
}

/// GET /api/v1/faults
/// List faults, newest first
pub async fn list_faults(
    State(state): State<AppState>,
    Query(query): Query<FaultFilterQuery>,
) -> Result<Json<FaultsResponse>, ApiError> {
    let filter = FaultFilter::from(query);
    let faults = state.store().list_faults(&filter).await?;
    Ok(Json(FaultsResponse::from_records(faults)))
}

/// GET /api/v1/faults/recent
/// The newest unresolved faults
pub async fn recent_faults(State(state): State<AppState>) -> Result<Json<FaultsResponse>, ApiError> {
    let filter = FaultFilter {
        limit: Some(RECENT_LIMIT),
        ..FaultFilter::active()
    };
    let faults = state.store().list_faults(&filter).await?;
    Ok(Json(FaultsResponse::from_records(faults)))
}

/// GET /api/v1/faults/{fault_id}
pub async fn get_fault(
    State(state): State<AppState>,
    Path(fault_id): Path<i64>,
) -> Result<Json<FaultInfoResponse>, ApiError> {
    let fault = state.store().get_fault(fault_id).await?;
    Ok(Json(fault.into()))
}

/// POST /api/v1/faults/{fault_id}/resolve
/// Mark a fault resolved; resolving again is a no-op
pub async fn resolve_fault(
    State(state): State<AppState>,
    Path(fault_id): Path<i64>,
) -> Result<Json<FaultInfoResponse>, ApiError> {
    let fault = state.store().resolve_fault(fault_id, Utc::now()).await?;
    Ok(Json(fault.into()))
}
