//! Fault analysis handlers

use axum::extract::{Query, State};
use axum::Json;
use bms_core::aggregate::{self, AggregateSummary, TrendBucket};
use bms_core::{FaultFilter, TimeWindow, TrendRange};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize, Default)]
pub struct RangeQuery {
    pub range: Option<String>,
}

#[derive(Serialize)]
pub struct SummaryResponse {
    pub range: TimeWindow,
    /// e.g. "last 24 hours"
    pub description: &'static str,
    pub since: DateTime<Utc>,
    #[serde(flatten)]
    pub summary: AggregateSummary,
}

#[derive(Serialize)]
pub struct TrendsResponse {
    pub range: TrendRange,
    pub bucket_minutes: i64,
    pub items: Vec<TrendBucket>,
}

/// GET /api/v1/analysis/summary?range=30min|1hour|1day
/// Fault statistics over a time window (default: last day)
pub async fn summary(
    State(state): State<AppState>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let window: TimeWindow = match query.range.as_deref() {
        Some(range) => range.parse().map_err(ApiError::BadRequest)?,
        None => TimeWindow::default(),
    };
    let since = window.cutoff(Utc::now());

    let filter = FaultFilter {
        since: Some(since),
        ..Default::default()
    };
    let faults = state.store().list_faults(&filter).await?;

    Ok(Json(SummaryResponse {
        range: window,
        description: window.description(),
        since,
        summary: AggregateSummary::compute(&faults),
    }))
}

/// GET /api/v1/analysis/trends?range=30m|1h|1d
/// Unresolved faults bucketed over time, newest bucket first
pub async fn trends(
    State(state): State<AppState>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<TrendsResponse>, ApiError> {
    let range: TrendRange = match query.range.as_deref() {
        Some(range) => range.parse().map_err(ApiError::BadRequest)?,
        None => TrendRange::default(),
    };
    let now = Utc::now();

    let filter = FaultFilter {
        since: Some(now - range.span()),
        ..FaultFilter::active()
    };
    let faults = state.store().list_faults(&filter).await?;

    Ok(Json(TrendsResponse {
        range,
        bucket_minutes: range.bucket().num_minutes(),
        items: aggregate::fault_trend(&faults, now, range),
    }))
}
