//! Error types for fault storage

use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors returned by a [`FaultStore`](crate::store::FaultStore)
#[derive(Debug, Error)]
pub enum StoreError {
    /// No fault with this id
    #[error("Fault not found: {0}")]
    FaultNotFound(i64),

    /// No active fault for a room
    #[error("No active fault for floor {floor}, room {room}")]
    NoActiveFault { floor: i32, room: i32 },

    /// Invalid parameter or request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl StoreError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            StoreError::FaultNotFound(_) => 404,
            StoreError::NoActiveFault { .. } => 404,
            StoreError::InvalidRequest(_) => 400,
            StoreError::Internal(_) => 500,
        }
    }
}
