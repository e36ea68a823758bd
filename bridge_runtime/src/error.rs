//! Runtime error types: persistence, advisory flows and configuration.

use std::io;

use thiserror::Error;

/// Slot persistence failures.
#[derive(Error, Debug)]
pub enum PersistError {
    #[error("io error on slot {slot}: {source}")]
    Io {
        slot: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to serialize slot {slot}: {message}")]
    Serialization { slot: String, message: String },

    /// Malformed JSON, missing fields or a shape that does not match the collection.
    #[error("failed to decode slot {slot}: {message}")]
    Deserialization { slot: String, message: String },

    #[error("slot {slot} has version {found}, expected {expected}")]
    VersionMismatch { slot: String, found: u32, expected: u32 },

    #[error("slot {slot} checksum mismatch: stored {stored}, computed {computed}")]
    ChecksumMismatch {
        slot: String,
        stored: String,
        computed: String,
    },

    /// Hydrated state failed the kernel's invariant checks.
    #[error("persisted state violates invariants: {0}")]
    InvariantViolation(String),
}

impl PersistError {
    pub fn io(slot: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            slot: slot.into(),
            source,
        }
    }
}

/// Advisory flow failures. Always surfaced to the caller, never swallowed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AdvisoryError {
    /// Rejected before any model call was made.
    #[error("invalid advisory input: {0}")]
    InvalidInput(String),

    /// Network failure or timeout reaching the model endpoint.
    #[error("model transport error: {0}")]
    Transport(String),

    #[error("model endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The reply did not match the expected JSON shape.
    #[error("malformed model response: {0}")]
    MalformedResponse(String),

    #[error("model returned an empty response")]
    EmptyResponse,

    #[error("advisory model not configured: {0} is not set")]
    NotConfigured(&'static str),
}

impl AdvisoryError {
    /// Worth retrying: transport failures, rate limits and server errors.
    pub fn is_transient(&self) -> bool {
        match self {
            AdvisoryError::Transport(_) => true,
            AdvisoryError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for AdvisoryError {
    fn from(err: reqwest::Error) -> Self {
        AdvisoryError::Transport(err.to_string())
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}
