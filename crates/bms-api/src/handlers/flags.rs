//! Fault flag table handlers

use axum::extract::Path;
use axum::Json;
use bms_core::{DecodedFlags, FaultType, FAULT_TYPES};
use serde::Serialize;

#[derive(Serialize)]
pub struct FlagsResponse {
    pub items: Vec<FaultType>,
    pub total_count: usize,
}

/// GET /api/v1/flags
/// The fault bit table
pub async fn list_flags() -> Json<FlagsResponse> {
    Json(FlagsResponse {
        items: FAULT_TYPES.to_vec(),
        total_count: FAULT_TYPES.len(),
    })
}

/// GET /api/v1/flags/{value}/decode
pub async fn decode_flags(Path(value): Path<i64>) -> Json<DecodedFlags> {
    Json(DecodedFlags::from_raw(value))
}
