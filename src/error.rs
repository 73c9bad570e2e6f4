//! Unified error handling for the run-tracker library.
//!
//! Every failure at this layer is either recoverable-degraded (a bad fix, a
//! lost position source, a lagging durable snapshot) or an explicit caller
//! misuse. [`TrackerError::kind`] exposes that classification.

use thiserror::Error;

/// Failure reported by a [`PositionSource`](crate::PositionSource) stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// Location permission was revoked by the user or the OS
    #[error("location permission revoked")]
    PermissionRevoked,
    /// The underlying location provider is unavailable
    #[error("location provider unavailable: {message}")]
    ProviderUnavailable { message: String },
    /// The stream terminated without an explicit error
    #[error("position stream ended")]
    Ended,
}

/// Unified error type for run-tracker operations.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Fix has non-finite or out-of-range coordinates
    #[error("invalid fix: {message}")]
    InvalidFix { message: String },
    /// An open session already exists
    #[error("a run session is already active (id {session_id})")]
    SessionAlreadyActive { session_id: i64 },
    /// Operation requires an active or paused session
    #[error("no active run session")]
    NoActiveSession,
    /// Position source failure
    #[error("position source error: {0}")]
    Source(#[from] SourceError),
    /// Persistence/storage error
    #[error("persistence error: {0}")]
    Persistence(#[from] rusqlite::Error),
    /// Schema migration failure
    #[error("schema migration error: {0}")]
    Migration(#[from] rusqlite_migration::Error),
    /// Configuration error
    #[error("configuration error: {message}")]
    Config { message: String },
}

/// Coarse classification of a [`TrackerError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input; dropped, the session continues
    Validation,
    /// Position source failure; the session stays active but degraded
    TransientSource,
    /// Caller misuse of the lifecycle; do not blindly retry
    State,
    /// Store write/read failure; in-memory totals remain authoritative
    Persistence,
    /// Invalid configuration
    Config,
}

impl TrackerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TrackerError::InvalidFix { .. } => ErrorKind::Validation,
            TrackerError::Source(_) => ErrorKind::TransientSource,
            TrackerError::SessionAlreadyActive { .. } | TrackerError::NoActiveSession => {
                ErrorKind::State
            }
            TrackerError::Persistence(_) | TrackerError::Migration(_) => ErrorKind::Persistence,
            TrackerError::Config { .. } => ErrorKind::Config,
        }
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        TrackerError::Config {
            message: message.into(),
        }
    }
}

/// Result type alias for run-tracker operations.
pub type Result<T> = std::result::Result<T, TrackerError>;
