//! Conversion options and configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Millimetres per PDF point at a 1:100 drawing scale.
pub const MM_PER_POINT_AT_1_100: f64 = 25.4 / 72.0 * 100.0;

/// Options for converting a drawing set.
///
/// Lengths are millimetres. The struct deserializes from JSON with every
/// field optional, so a config file only needs the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    /// Fallback scale, millimetres per page unit
    pub default_scale_ratio: f64,

    /// Caller-declared scale, millimetres per page unit
    pub scale_override: Option<f64>,

    /// Wall height when no elevation gives one
    pub default_wall_height_mm: f64,

    /// Accepted wall thickness (min, max)
    pub wall_thickness_range_mm: (f64, f64),

    /// Narrowest gap treated as an opening
    pub min_opening_width_mm: f64,

    /// Widest gap still bridged as an opening
    pub max_opening_width_mm: f64,

    /// Door head height above the floor
    pub door_height_mm: f64,

    /// Window sill height above the floor
    pub window_sill_mm: f64,

    /// Window head height above the floor
    pub window_head_mm: f64,

    /// Snapping tolerance for coincident points
    pub tolerance_epsilon_mm: f64,

    /// Slab between stacked floors
    pub slab_thickness_mm: f64,

    /// Walls shorter than this are excluded from the mesh
    pub min_wall_length_mm: f64,

    /// Smallest enclosed area reported as a room (square millimetres)
    pub min_room_area_mm2: f64,

    /// Maximum angle between lines treated as parallel, in degrees
    pub parallel_tolerance_deg: f64,

    /// How far from an opening a door/window label may sit
    pub label_search_radius_mm: f64,

    /// Case-insensitive substrings marking a door label
    pub door_labels: Vec<String>,

    /// Case-insensitive substrings marking a window label
    pub window_labels: Vec<String>,

    /// Explicit page index → floor index assignment
    pub page_floors: BTreeMap<usize, usize>,

    /// Error handling mode
    pub error_mode: ErrorMode,

    /// Whether to use parallel processing
    pub parallel: bool,
}

impl ConvertOptions {
    /// Create new options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the fallback scale ratio (mm per page unit).
    pub fn with_default_scale(mut self, ratio: f64) -> Self {
        self.default_scale_ratio = ratio;
        self
    }

    /// Declare the scale explicitly (mm per page unit).
    pub fn with_scale(mut self, ratio: f64) -> Self {
        self.scale_override = Some(ratio);
        self
    }

    /// Declare the drawing scale as `1:denominator` on a point-based page.
    pub fn with_drawing_scale(mut self, denominator: f64) -> Self {
        self.scale_override = Some(denominator * 25.4 / 72.0);
        self
    }

    /// Set the default wall height.
    pub fn with_wall_height(mut self, mm: f64) -> Self {
        self.default_wall_height_mm = mm;
        self
    }

    /// Set the accepted wall thickness range.
    pub fn with_wall_thickness_range(mut self, min_mm: f64, max_mm: f64) -> Self {
        self.wall_thickness_range_mm = (min_mm, max_mm);
        self
    }

    /// Set the opening width bounds.
    pub fn with_opening_widths(mut self, min_mm: f64, max_mm: f64) -> Self {
        self.min_opening_width_mm = min_mm;
        self.max_opening_width_mm = max_mm;
        self
    }

    /// Set the door head height.
    pub fn with_door_height(mut self, mm: f64) -> Self {
        self.door_height_mm = mm;
        self
    }

    /// Set the window band.
    pub fn with_window_band(mut self, sill_mm: f64, head_mm: f64) -> Self {
        self.window_sill_mm = sill_mm;
        self.window_head_mm = head_mm;
        self
    }

    /// Set the snapping tolerance.
    pub fn with_tolerance(mut self, mm: f64) -> Self {
        self.tolerance_epsilon_mm = mm;
        self
    }

    /// Set the slab thickness between floors.
    pub fn with_slab_thickness(mut self, mm: f64) -> Self {
        self.slab_thickness_mm = mm;
        self
    }

    /// Set the minimum wall length kept in the mesh.
    pub fn with_min_wall_length(mut self, mm: f64) -> Self {
        self.min_wall_length_mm = mm;
        self
    }

    /// Assign a page to a floor.
    pub fn with_page_floor(mut self, page: usize, floor: usize) -> Self {
        self.page_floors.insert(page, floor);
        self
    }

    /// Set error mode.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Enable lenient mode (skip undecodable pages).
    pub fn lenient(mut self) -> Self {
        self.error_mode = ErrorMode::Lenient;
        self
    }

    /// Enable or disable parallel processing.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Disable parallel processing.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Parse options from a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)
            .map_err(|e| Error::InvalidOptions(format!("config: {}", e)))?;
        options.validate()?;
        Ok(options)
    }

    /// Reject inconsistent settings.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("default_scale_ratio", self.default_scale_ratio),
            ("default_wall_height_mm", self.default_wall_height_mm),
            ("tolerance_epsilon_mm", self.tolerance_epsilon_mm),
            ("door_height_mm", self.door_height_mm),
            ("min_opening_width_mm", self.min_opening_width_mm),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(Error::InvalidOptions(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }
        if let Some(ratio) = self.scale_override {
            if !(ratio.is_finite() && ratio > 0.0) {
                return Err(Error::InvalidOptions(format!(
                    "scale_override must be positive, got {}",
                    ratio
                )));
            }
        }

        let (min_t, max_t) = self.wall_thickness_range_mm;
        if !(min_t > 0.0 && min_t <= max_t) {
            return Err(Error::InvalidOptions(format!(
                "wall_thickness_range_mm ({}, {}) is not a valid range",
                min_t, max_t
            )));
        }
        if self.min_opening_width_mm > self.max_opening_width_mm {
            return Err(Error::InvalidOptions(
                "min_opening_width_mm exceeds max_opening_width_mm".to_string(),
            ));
        }
        if self.window_sill_mm < 0.0 || self.window_sill_mm >= self.window_head_mm {
            return Err(Error::InvalidOptions(format!(
                "window sill {} must be below head {}",
                self.window_sill_mm, self.window_head_mm
            )));
        }
        if self.slab_thickness_mm < 0.0 || self.min_wall_length_mm < 0.0 {
            return Err(Error::InvalidOptions(
                "slab thickness and minimum wall length cannot be negative".to_string(),
            ));
        }
        if !(0.0..45.0).contains(&self.parallel_tolerance_deg) {
            return Err(Error::InvalidOptions(format!(
                "parallel_tolerance_deg {} is out of range",
                self.parallel_tolerance_deg
            )));
        }
        Ok(())
    }
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            default_scale_ratio: MM_PER_POINT_AT_1_100,
            scale_override: None,
            default_wall_height_mm: 2700.0,
            wall_thickness_range_mm: (50.0, 600.0),
            min_opening_width_mm: 500.0,
            max_opening_width_mm: 3000.0,
            door_height_mm: 2100.0,
            window_sill_mm: 900.0,
            window_head_mm: 2100.0,
            tolerance_epsilon_mm: 10.0,
            slab_thickness_mm: 200.0,
            min_wall_length_mm: 100.0,
            min_room_area_mm2: 1_000_000.0,
            parallel_tolerance_deg: 2.0,
            label_search_radius_mm: 1500.0,
            door_labels: vec!["door".to_string(), "entry".to_string()],
            window_labels: vec!["window".to_string(), "glazing".to_string()],
            page_floors: BTreeMap::new(),
            error_mode: ErrorMode::Strict,
            parallel: true,
        }
    }
}

/// Error handling mode during decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorMode {
    /// Fail on any undecodable page
    #[default]
    Strict,
    /// Skip undecodable pages and continue
    Lenient,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_options_builder() {
        let options = ConvertOptions::new()
            .lenient()
            .with_wall_height(3000.0)
            .with_drawing_scale(50.0)
            .with_page_floor(2, 1)
            .sequential();

        assert_eq!(options.error_mode, ErrorMode::Lenient);
        assert_eq!(options.default_wall_height_mm, 3000.0);
        assert!((options.scale_override.unwrap() - 17.638_888).abs() < 1e-5);
        assert_eq!(options.page_floors.get(&2), Some(&1));
        assert!(!options.parallel);
    }

    #[test]
    fn test_default_options() {
        let options = ConvertOptions::default();
        assert_eq!(options.error_mode, ErrorMode::Strict);
        assert!(options.parallel);
        assert!((options.default_scale_ratio - 35.277_777).abs() < 1e-5);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_partial_json_config() {
        let options =
            ConvertOptions::from_json(r#"{"default_wall_height_mm": 2400, "parallel": false}"#)
                .unwrap();
        assert_eq!(options.default_wall_height_mm, 2400.0);
        assert!(!options.parallel);
        assert_eq!(options.door_height_mm, 2100.0);
    }

    #[test]
    fn test_invalid_options() {
        let bad_band = ConvertOptions::new().with_window_band(2100.0, 900.0);
        assert!(matches!(bad_band.validate(), Err(Error::InvalidOptions(_))));

        let bad_range = ConvertOptions::new().with_wall_thickness_range(300.0, 100.0);
        assert!(bad_range.validate().is_err());

        let bad_scale = ConvertOptions::new().with_scale(0.0);
        assert!(bad_scale.validate().is_err());

        assert!(ConvertOptions::from_json("{not json").is_err());
    }
}
