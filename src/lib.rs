//! # plan3d
//!
//! Turns vector PDF house plans into 3D building meshes.
//!
//! The conversion runs in six stages: page decoding, scale resolution,
//! feature extraction (walls, openings, rooms), per-floor graph building,
//! mesh synthesis and model assembly.
//!
//! ## Quick Start
//!
//! ```no_run
//! use plan3d::{convert, export, ConvertOptions};
//!
//! fn main() -> plan3d::Result<()> {
//!     let data = std::fs::read("house.pdf")?;
//!     let conversion = convert(&data, &ConvertOptions::default())?;
//!
//!     for warning in &conversion.warnings {
//!         eprintln!("warning: {}", warning);
//!     }
//!
//!     let obj = export::to_obj(&conversion.model, &export::ExportOptions::default())?;
//!     std::fs::write("house.obj", obj)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Scale detection**: dimension annotations, scale notes or a default
//! - **Wall pairing**: parallel strokes become walls with thickness
//! - **Openings**: door and window gaps classified by labels and glazing
//! - **Rooms**: closed faces of the wall graph, labelled from plan text
//! - **Multi-storey**: floors stacked by slab thickness, heights from elevations
//! - **Parallel processing**: pages and floors run on Rayon

pub mod assemble;
pub mod decode;
pub mod detect;
pub mod error;
pub mod export;
pub mod extract;
pub mod graph;
pub mod model;
pub mod options;
pub mod pipeline;
pub mod scale;
pub mod synth;
pub mod warning;

// Re-export commonly used types
pub use detect::{detect_format_from_bytes, is_pdf_bytes, PdfFormat};
pub use error::{ConversionError, Error, Result};
pub use export::{ExportFormat, ExportOptions, JsonFormat};
pub use model::{
    BoundingBox, DecodedDocument, DecodedPage, FloorGraph, FloorMesh, LengthUnit, Mesh,
    Metadata, Model, Opening, OpeningKind, PageFeatures, PageRole, Point2, Point3,
    RoomBoundary, ScaleConfidence, ScaleFactor, WallSegment,
};
pub use options::{ConvertOptions, ErrorMode};
pub use pipeline::{Conversion, Converter};
pub use warning::ConversionWarning;

use std::path::Path;

/// Convert PDF bytes into a 3D model.
///
/// # Example
///
/// ```no_run
/// use plan3d::{convert, ConvertOptions};
///
/// let data = std::fs::read("house.pdf").unwrap();
/// let conversion = convert(&data, &ConvertOptions::default().lenient()).unwrap();
/// println!("{} triangles", conversion.model.mesh.face_count());
/// ```
pub fn convert(data: &[u8], options: &ConvertOptions) -> Result<Conversion> {
    Converter::new(options.clone()).convert(data)
}

/// Convert a PDF file into a 3D model.
pub fn convert_file<P: AsRef<Path>>(path: P, options: &ConvertOptions) -> Result<Conversion> {
    Converter::new(options.clone()).convert_file(path)
}

/// Decode a PDF without converting it.
///
/// Useful for inspecting what the decoder sees on each page.
pub fn decode_bytes(data: &[u8], options: &ConvertOptions) -> Result<DecodedDocument> {
    decode::decode(data, options.error_mode)
}
