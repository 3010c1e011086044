//! Writers for assembled models.

mod json;
mod obj;
mod stl;

pub use json::{to_json, JsonFormat};
pub use obj::{parse_obj, to_obj};
pub use stl::to_stl;

use crate::error::Result;
use crate::model::{LengthUnit, Model};
use serde::{Deserialize, Serialize};

/// Options for writing a model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExportOptions {
    /// Unit of the written coordinates
    pub unit: LengthUnit,

    /// Digits after the decimal point
    pub precision: usize,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            unit: LengthUnit::Millimetre,
            precision: 6,
        }
    }
}

impl ExportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the output unit.
    pub fn with_unit(mut self, unit: LengthUnit) -> Self {
        self.unit = unit;
        self
    }

    /// Set the coordinate precision.
    pub fn with_precision(mut self, digits: usize) -> Self {
        self.precision = digits;
        self
    }
}

/// Output file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Obj,
    Stl,
    Json,
}

impl ExportFormat {
    /// Usual file extension.
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Obj => "obj",
            ExportFormat::Stl => "stl",
            ExportFormat::Json => "json",
        }
    }
}

/// Write `model` in `format`.
///
/// JSON always carries millimetres; the unit option applies to the mesh
/// formats only.
pub fn export(model: &Model, format: ExportFormat, options: &ExportOptions) -> Result<String> {
    match format {
        ExportFormat::Obj => to_obj(model, options),
        ExportFormat::Stl => to_stl(model, options),
        ExportFormat::Json => to_json(model, JsonFormat::Pretty),
    }
}

/// Meshes to write, one per named group.
///
/// Falls back to the combined mesh when the model has no per-floor parts.
fn groups(model: &Model) -> Vec<(String, &crate::model::Mesh)> {
    if model.floors.is_empty() {
        if model.mesh.is_empty() {
            return Vec::new();
        }
        return vec![("model".to_string(), &model.mesh)];
    }
    model
        .floors
        .values()
        .map(|f| (format!("floor_{}", f.floor_index), &f.mesh))
        .collect()
}
