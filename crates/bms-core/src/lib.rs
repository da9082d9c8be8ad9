//! bms-core - Fault monitoring core for hotel building management
//!
//! This crate holds the fault flag codec, the fault statistics used by the
//! analysis views, fault detection from sensor readings, and the store
//! abstraction the API is served from.

pub mod aggregate;
pub mod detect;
pub mod error;
pub mod flags;
pub mod models;
pub mod store;
pub mod thresholds;

pub use aggregate::{AggregateSummary, DescriptionCount, NamedCount, TrendBucket};
pub use detect::{DetectionThresholds, FaultDetector};
pub use error::{StoreError, StoreResult};
pub use flags::{fault_bit, DecodedFlags, FaultFlags, FaultType, FAULT_TYPES};
pub use models::*;
pub use store::{ChangeEvent, FaultStore, MemoryStore};
pub use thresholds::{AnnotatedReading, Metric, RangeViolation};
