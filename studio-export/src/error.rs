//! Export error types.

use thiserror::Error;

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// Errors that can occur while planning, rendering or delivering an export.
#[derive(Debug, Error)]
pub enum ExportError {
    /// An export option is out of range. Raised before any rendering starts.
    #[error("Invalid export option `{field}`: {reason}")]
    Validation {
        /// The offending option.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// The preset id is not in the catalogue.
    #[error("Unknown preset: {0}")]
    UnknownPreset(String),

    /// The surface could not produce an image.
    #[error("Render failed: {0}")]
    Render(String),

    /// The rendered image could not be encoded in the target format.
    #[error("Encoding failed: {0}")]
    Encode(String),

    /// The export queue worker has stopped.
    #[error("Export queue is closed")]
    QueueClosed,

    /// Writing bundle files failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Manifest serialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Loading the scene failed.
    #[error(transparent)]
    Canvas(#[from] studio_core::CanvasError),
}

impl ExportError {
    pub(crate) fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// The option named by a validation error, if any.
    #[must_use]
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::Validation { field, .. } => Some(field),
            _ => None,
        }
    }
}
