//! JSON output for models.

use crate::error::{Error, Result};
use crate::model::Model;

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Indented
    #[default]
    Pretty,
    /// Single line
    Compact,
}

/// Serialize the model (floors, combined mesh, scale, bounds, metadata).
pub fn to_json(model: &Model, format: JsonFormat) -> Result<String> {
    let result = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(model),
        JsonFormat::Compact => serde_json::to_string(model),
    };

    result.map_err(|e| Error::Export(format!("JSON serialization error: {}", e)))
}
