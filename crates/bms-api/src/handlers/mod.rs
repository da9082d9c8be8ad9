//! HTTP request handlers for the monitoring API
//!
//! Handlers only talk to the [`FaultStore`](bms_core::FaultStore) in the
//! application state; they do not know which store implementation is used.

pub mod analysis;
pub mod events;
pub mod faults;
pub mod flags;
pub mod floors;
pub mod readings;
pub mod sensors;
