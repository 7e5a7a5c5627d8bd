//! Error types and result aliases for the tracker.
//!
//! This module defines the core error type [`TrackerError`] and the [`Result`] type alias
//! used throughout the crate. Configuration and taxonomy problems are never returned as
//! errors: they are reported to the diagnostic sink (see [`crate::console`]) so that a
//! misconfigured tracker cannot take down its host.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Transport error: {0}")]
    TransportError(String),

    #[error("Transport not usable: {0}")]
    TransportUnusable(String),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Retries exhausted after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        attempts: u32,
        last_error: Box<TrackerError>,
    },

    #[error("Tracker not found: {0}")]
    TrackerNotFound(String),

    #[error("Queue error: {0}")]
    QueueError(String),

    #[error("Operation cancelled: {0}")]
    Cancelled(String),
}

pub type Result<T> = std::result::Result<T, TrackerError>;
