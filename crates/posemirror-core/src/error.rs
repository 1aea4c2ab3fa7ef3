//! Error types for the posemirror core.
//!
//! All errors derive their `Display` and `Error` implementations through
//! [`thiserror`].
//!
//! # Error Hierarchy
//!
//! - [`CoreError`]: Top-level error returned by session and comparator calls
//! - [`GeometryError`]: Degenerate geometry, recovered locally by skipping the tick
//! - [`ConfigError`]: Configuration validation and file loading
//!
//! # Example
//!
//! ```rust
//! use posemirror_core::error::{CoreError, GeometryError};
//!
//! let err: CoreError = GeometryError::DegenerateNormalization.into();
//! assert!(err.is_recoverable());
//! ```

use std::path::PathBuf;

use thiserror::Error;

use crate::types::BodyPart;

/// A specialized `Result` type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Top-level error type for pose comparison and feedback.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum CoreError {
    /// Degenerate geometry for this tick
    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),

    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Live and reference poses are not index-aligned.
    ///
    /// The pose source guarantees alignment, so this is an integration
    /// defect rather than a per-frame condition.
    #[error("Pose alignment error: live pose has {live} keypoints, reference has {reference}")]
    Alignment {
        /// Keypoint count of the live pose
        live: usize,
        /// Keypoint count of the reference pose
        reference: usize,
    },

    /// A shared keypoint index names different body parts.
    #[error("Pose alignment error: index {index} is {live} in the live pose but {reference} in the reference")]
    MisalignedPart {
        /// Keypoint index where the poses disagree
        index: usize,
        /// Part found in the live pose
        live: BodyPart,
        /// Part found in the reference pose
        reference: BodyPart,
    },

    /// Validation error for input data
    #[error("Validation error: {message}")]
    Validation {
        /// Description of what validation failed
        message: String,
    },
}

impl CoreError {
    /// Creates a new validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates a new alignment error.
    #[must_use]
    pub fn alignment(live: usize, reference: usize) -> Self {
        Self::Alignment { live, reference }
    }

    /// Returns `true` if the session may skip the tick and carry on.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Geometry(e) => e.is_recoverable(),
            Self::Config(_)
            | Self::Alignment { .. }
            | Self::MisalignedPart { .. }
            | Self::Validation { .. } => false,
        }
    }
}

/// Degenerate geometry encountered while comparing two poses.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum GeometryError {
    /// One ray of the angle has zero length (coincident points).
    #[error("Degenerate triangle: coincident points at the angle vertex")]
    DegenerateTriangle,

    /// A pose has no keypoints, or every live keypoint sits on its centroid.
    #[error("Degenerate normalization: pose has no spread")]
    DegenerateNormalization,

    /// Confidence filtering left nothing to compare.
    #[error("No comparable keypoints above the confidence threshold")]
    NoComparableKeypoints,
}

impl GeometryError {
    /// Returns `true` if this error is recoverable.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::DegenerateTriangle
            | Self::DegenerateNormalization
            | Self::NoComparableKeypoints => true,
        }
    }
}

/// Errors produced when loading or validating a [`ComparisonConfig`].
///
/// [`ComparisonConfig`]: crate::config::ComparisonConfig
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A field has an invalid value.
    #[error("Invalid value for `{field}`: {reason}")]
    InvalidValue {
        /// Name of the field.
        field: &'static str,
        /// Human-readable reason.
        reason: String,
    },

    /// A configuration file could not be read or written.
    #[error("Cannot access config file `{path}`: {source}")]
    FileRead {
        /// Path that was being accessed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A configuration file contains malformed JSON.
    #[error("Cannot parse config file `{path}`: {source}")]
    ParseError {
        /// Path that was being parsed.
        path: PathBuf,
        /// Underlying JSON parse error.
        #[source]
        source: serde_json::Error,
    },
}

impl ConfigError {
    /// Construct a [`ConfigError::InvalidValue`].
    pub fn invalid_value<S: Into<String>>(field: &'static str, reason: S) -> Self {
        ConfigError::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alignment_error_display() {
        let err = CoreError::alignment(17, 12);
        let text = err.to_string();
        assert!(text.contains("17"));
        assert!(text.contains("12"));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_geometry_errors_are_recoverable() {
        for e in [
            GeometryError::DegenerateTriangle,
            GeometryError::DegenerateNormalization,
            GeometryError::NoComparableKeypoints,
        ] {
            let core: CoreError = e.into();
            assert!(core.is_recoverable());
            assert!(matches!(core, CoreError::Geometry(_)));
        }
    }

    #[test]
    fn test_config_error_conversion() {
        let err: CoreError = ConfigError::invalid_value("frame_gate", "must be > 0").into();
        assert!(err.to_string().contains("frame_gate"));
        assert!(!err.is_recoverable());
    }
}
