//! Application state for the monitoring API

use std::sync::Arc;

use bms_core::{FaultDetector, FaultStore, DEFAULT_OFFLINE_THRESHOLD_SECS};
use chrono::Duration;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn FaultStore>,
    detector: Arc<FaultDetector>,
    /// Silence after which a sensor counts as offline
    offline_threshold: Duration,
}

impl AppState {
    /// Create state over a store, with default detection limits
    pub fn new(store: Arc<dyn FaultStore>) -> Self {
        Self {
            store,
            detector: Arc::new(FaultDetector::default()),
            offline_threshold: Duration::seconds(DEFAULT_OFFLINE_THRESHOLD_SECS),
        }
    }

    /// Replace the fault detector
    pub fn with_detector(mut self, detector: FaultDetector) -> Self {
        self.detector = Arc::new(detector);
        self
    }

    /// Replace the sensor offline threshold
    pub fn with_offline_threshold(mut self, threshold: Duration) -> Self {
        self.offline_threshold = threshold;
        self
    }

    pub fn store(&self) -> &Arc<dyn FaultStore> {
        &self.store
    }

    pub fn detector(&self) -> &FaultDetector {
        &self.detector
    }

    pub fn offline_threshold(&self) -> Duration {
        self.offline_threshold
    }
}
