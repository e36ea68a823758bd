//! Error types for store operations.

use thiserror::Error;

use crate::domain::RequestStatus;

pub type Result<T> = std::result::Result<T, BridgeError>;

/// Business-rule rejections. The store's state is unchanged whenever one is returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BridgeError {
    /// A required field is missing or out of range.
    #[error("validation error: {0}")]
    Validation(String),

    #[error("unknown request {0:?}")]
    UnknownRequest(String),

    #[error("unknown camp {0:?}")]
    UnknownCamp(String),

    /// Lifecycle transition out of a terminal status.
    #[error("request {id:?} is {status}, only Active requests can be fulfilled")]
    InvalidTransition { id: String, status: RequestStatus },

    /// The resulting state failed an invariant check.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

impl BridgeError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
