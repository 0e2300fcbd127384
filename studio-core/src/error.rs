//! Error types for canvas operations.

use thiserror::Error;

/// Result type for canvas operations.
pub type CanvasResult<T> = Result<T, CanvasError>;

/// Errors that can occur in canvas operations.
///
/// Operations on element ids that are not present are not errors; they are
/// reported as no-ops by the store.
#[derive(Debug, Error)]
pub enum CanvasError {
    /// A configuration value (grid size, canvas size, device geometry) is unusable.
    #[error("Invalid configuration for `{field}`: {reason}")]
    InvalidConfig {
        /// The offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// A requested change violates an element or viewport constraint.
    #[error("Validation failed for `{field}`: {reason}")]
    Validation {
        /// The offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// The device id is not present in the catalogue.
    #[error("Unknown device: {0}")]
    UnknownDevice(String),

    /// Scene document has a version this build cannot read.
    #[error("Unsupported scene document version {found} (newest supported is {supported})")]
    UnsupportedVersion {
        /// Version found in the document.
        found: u32,
        /// Newest version understood by this build.
        supported: u32,
    },

    /// Scene serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Reading or writing a scene file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CanvasError {
    pub(crate) fn invalid_config(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }

    pub(crate) fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// The field named by a validation or configuration error, if any.
    #[must_use]
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::InvalidConfig { field, .. } | Self::Validation { field, .. } => Some(field),
            _ => None,
        }
    }
}
