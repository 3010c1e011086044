//! Non-fatal conditions collected during a conversion.

use crate::error;
use crate::model::ScaleConfidence;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A problem that degraded the output without aborting the conversion.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConversionWarning {
    /// Scale came from a drawing note or the configured default.
    #[error("Scale is {confidence} ({ratio:.4} mm per page unit)")]
    LowConfidenceScale {
        confidence: ScaleConfidence,
        ratio: f64,
    },

    /// Page has no vector content (raster-only) and was skipped.
    #[error("Page {page} has no vector content and was skipped")]
    UnsupportedPage { page: usize },

    /// Page content stream could not be decoded (lenient mode).
    #[error("Page {page} could not be decoded: {reason}")]
    UndecodablePage { page: usize, reason: String },

    /// Page is titled as an elevation or section but was read as a plan,
    /// either because it has walls or because `page_floors` maps it.
    #[error("Page {page} has an elevation or section title but was read as a plan")]
    ViewTitleOnPlan { page: usize },

    /// A plan page produced no walls.
    #[error("No walls found on page {page}")]
    InsufficientGeometry { page: usize },

    /// A wall was excluded from the mesh.
    #[error("Wall {wall} on floor {floor} skipped: length {length_mm:.1} mm")]
    DegenerateGeometry {
        floor: usize,
        wall: usize,
        length_mm: f64,
    },

    /// A room boundary did not close and was dropped.
    #[error("Room {room} on floor {floor} does not close")]
    UnclosedRoom { floor: usize, room: usize },

    /// A wall end is not connected to any other wall.
    #[error("Wall {wall} on floor {floor} has a dangling end")]
    DanglingWall { floor: usize, wall: usize },

    /// The floor's walls form more than one connected group.
    #[error("Floor {floor} has {components} disconnected wall groups")]
    DisconnectedGraph { floor: usize, components: usize },

    /// Wall height was read from an elevation view.
    #[error("Floor {floor} wall height {height_mm:.0} mm inferred from page {page}")]
    InferredWallHeight {
        floor: usize,
        height_mm: f64,
        page: usize,
    },

    /// A room polygon could not be triangulated; its caps are missing.
    #[error("Room {room} on floor {floor} could not be capped: {reason}")]
    UntriangulatedRoom {
        floor: usize,
        room: usize,
        reason: String,
    },

    /// No plan page yielded walls; the model is empty.
    #[error("No floors could be built from the document")]
    NoFloors,
}

impl ConversionWarning {
    /// Downgrade a non-fatal stage error to a warning.
    pub fn from_error(err: &error::Error) -> Option<Self> {
        match err {
            error::Error::InsufficientGeometry { page } => {
                Some(ConversionWarning::InsufficientGeometry { page: *page })
            }
            error::Error::DegenerateGeometry {
                floor,
                wall,
                length_mm,
            } => Some(ConversionWarning::DegenerateGeometry {
                floor: *floor,
                wall: *wall,
                length_mm: *length_mm,
            }),
            _ => None,
        }
    }
}
