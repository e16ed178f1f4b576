//! Error types for the hand_sessions crate.
//!
//! Per-frame processing never fails: partial skeletons, unknown sessions and
//! ambiguous handedness are all handled in-band.  Errors only arise while
//! setting things up.

use thiserror::Error;

/// Errors raised while configuring or enabling hand tracking.
#[derive(Debug, Error)]
pub enum TrackingError {
    /// The frame source could not be reached when the service was enabled.
    #[error("frame source unavailable: {0}")]
    SourceUnavailable(String),

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    ConfigRead(#[from] std::io::Error),

    /// The configuration file is not valid TOML for [`crate::TrackingConfig`].
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

impl TrackingError {
    /// Creates a source unavailable error.
    #[must_use]
    pub fn source_unavailable(reason: impl Into<String>) -> Self {
        Self::SourceUnavailable(reason.into())
    }

    /// Creates an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig(reason.into())
    }
}

/// Result type for hand tracking setup.
pub type Result<T> = std::result::Result<T, TrackingError>;
