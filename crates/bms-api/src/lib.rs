//! bms-api - REST API for hotel building fault monitoring
//!
//! Serves fault lists, floor and room views, fault statistics, the fault bit
//! table, sensor reading ingestion and change notifications over any
//! [`FaultStore`](bms_core::FaultStore).
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use bms_api::{create_router, AppState};
//! use bms_core::MemoryStore;
//!
//! let state = AppState::new(Arc::new(MemoryStore::new()));
//! let router = create_router(state);
//! ```

pub mod error;
pub mod handlers;
pub mod state;

pub use error::ApiError;
pub use state::AppState;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the monitoring API router with the given application state
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(|| async { "OK" }))
        // Fault routes
        .route("/api/v1/faults", get(handlers::faults::list_faults))
        .route("/api/v1/faults/recent", get(handlers::faults::recent_faults))
        .route("/api/v1/faults/{fault_id}", get(handlers::faults::get_fault))
        .route(
            "/api/v1/faults/{fault_id}/resolve",
            post(handlers::faults::resolve_fault),
        )
        // Floor and room routes
        .route(
            "/api/v1/floors/{floor}/faults",
            get(handlers::floors::floor_faults),
        )
        .route(
            "/api/v1/floors/{floor}/rooms",
            get(handlers::floors::floor_rooms),
        )
        .route(
            "/api/v1/floors/{floor}/rooms/{room}/latest-fault",
            get(handlers::floors::latest_room_fault),
        )
        // Analysis routes
        .route("/api/v1/analysis/summary", get(handlers::analysis::summary))
        .route("/api/v1/analysis/trends", get(handlers::analysis::trends))
        // Fault bit table
        .route("/api/v1/flags", get(handlers::flags::list_flags))
        .route(
            "/api/v1/flags/{value}/decode",
            get(handlers::flags::decode_flags),
        )
        // Sensor routes
        .route(
            "/api/v1/readings",
            get(handlers::readings::list_readings).post(handlers::readings::ingest_reading),
        )
        .route("/api/v1/sensors/status", get(handlers::sensors::sensor_status))
        // Change notifications
        .route("/api/v1/events", get(handlers::events::stream_events))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
