//! Editor tuning knobs.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::element::MIN_ELEMENT_SIZE;
use crate::geometry::{Point, PAN_THRESHOLD, WHEEL_ZOOM_STEP};
use crate::history::DEFAULT_MAX_HISTORY;
use crate::{CanvasError, CanvasResult};

/// Editor configuration. Every field has a default, so a partial JSON object
/// is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorConfig {
    /// Bound on recorded undo states.
    pub max_history_size: usize,
    /// Offset applied to duplicated and pasted elements.
    pub duplicate_offset: Point,
    /// Smallest element width/height in canvas units.
    pub min_element_size: f64,
    /// Single-finger travel (screen px) before a touch becomes a pan or drag.
    pub pan_threshold: f64,
    /// Zoom multiplier per wheel notch.
    pub wheel_zoom_step: f64,
    /// Minimum spacing between applied pointer-move updates.
    pub pointer_frame_interval_ms: u64,
    /// Arrow-key nudge distance.
    pub nudge_step: f64,
    /// Shift+arrow nudge distance.
    pub nudge_step_large: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_history_size: DEFAULT_MAX_HISTORY,
            duplicate_offset: Point::new(20.0, 20.0),
            min_element_size: MIN_ELEMENT_SIZE,
            pan_threshold: PAN_THRESHOLD,
            wheel_zoom_step: WHEEL_ZOOM_STEP,
            pointer_frame_interval_ms: 16,
            nudge_step: 1.0,
            nudge_step_large: 10.0,
        }
    }
}

impl EditorConfig {
    /// Check every value is usable.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> CanvasResult<()> {
        if self.max_history_size == 0 {
            return Err(CanvasError::invalid_config("maxHistorySize", "must be at least 1"));
        }
        let positive = [
            ("minElementSize", self.min_element_size),
            ("panThreshold", self.pan_threshold),
            ("nudgeStep", self.nudge_step),
            ("nudgeStepLarge", self.nudge_step_large),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(CanvasError::invalid_config(field, format!("must be positive, got {value}")));
            }
        }
        if !(self.wheel_zoom_step.is_finite() && self.wheel_zoom_step > 1.0) {
            return Err(CanvasError::invalid_config(
                "wheelZoomStep",
                format!("must be greater than 1, got {}", self.wheel_zoom_step),
            ));
        }
        if !(self.duplicate_offset.x.is_finite() && self.duplicate_offset.y.is_finite()) {
            return Err(CanvasError::invalid_config("duplicateOffset", "must be finite"));
        }
        Ok(())
    }

    /// Parse and validate a JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a value is out of range.
    pub fn from_json(json: &str) -> CanvasResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is invalid.
    pub fn load(path: impl AsRef<Path>) -> CanvasResult<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        EditorConfig::default().validate().expect("valid");
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = EditorConfig::from_json(r#"{ "maxHistorySize": 10 }"#).expect("parse");
        assert_eq!(config.max_history_size, 10);
        assert!((config.wheel_zoom_step - WHEEL_ZOOM_STEP).abs() < f64::EPSILON);
        assert!((config.duplicate_offset.x - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rejects_zero_history() {
        let err = EditorConfig::from_json(r#"{ "maxHistorySize": 0 }"#).expect_err("invalid");
        assert_eq!(err.field(), Some("maxHistorySize"));
    }

    #[test]
    fn test_rejects_wheel_step_at_or_below_one() {
        let config = EditorConfig {
            wheel_zoom_step: 1.0,
            ..EditorConfig::default()
        };
        assert_eq!(config.validate().expect_err("invalid").field(), Some("wheelZoomStep"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("editor.json");
        std::fs::write(&path, r#"{ "panThreshold": 4 }"#).expect("write");
        let config = EditorConfig::load(&path).expect("load");
        assert!((config.pan_threshold - 4.0).abs() < f64::EPSILON);
    }
}
