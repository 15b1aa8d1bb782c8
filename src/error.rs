//! Error types for the station core.
//! Only configuration and store I/O can fail; codec input never does.

use std::path::PathBuf;

/// All errors that can occur in station operations.
#[derive(Debug, thiserror::Error)]
pub enum StationError {
    // ─────────────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Decay rate must be > 0, got {0}")]
    InvalidDecayRate(f64),

    #[error("Max sanity must be > 0, got {0}")]
    InvalidMaxSanity(f64),

    #[error("Duration must be > 0: {0}")]
    InvalidDuration(&'static str),

    #[error("Recovery code must have {expected} symbols, got {actual}")]
    InvalidRecoveryCode { expected: usize, actual: usize },

    #[error("Configuration file unreadable: {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration file malformed: {path}: {details}")]
    ConfigMalformed { path: PathBuf, details: String },

    // ─────────────────────────────────────────────────────────────────────
    // Store Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Store write failed: {path}: {source}")]
    StoreWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Store serialization failed for key {key}: {source}")]
    StoreSerialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, StationError>;
