//! Shared data models for the monitoring service

mod fault;
mod sensor;

pub use fault::*;
pub use sensor::*;
