//! Data model shared by the conversion stages.
//!
//! Values flow strictly forward: decoded pages feed the scale resolver and
//! feature extractor, features feed the per-floor graphs, and graphs feed
//! the meshes that make up the final [`Model`].

mod document;
mod feature;
mod geometry;
mod graph;
mod mesh;
mod page;

pub use document::{DecodedDocument, Metadata, SkipReason, SkippedPage};
pub use feature::{
    signed_area, Opening, OpeningKind, PageFeatures, RoomBoundary, ScaleConfidence, ScaleFactor,
    WallSegment,
};
pub use geometry::{BoundingBox, LengthUnit, Point2, Point3};
pub use graph::{FloorGraph, GraphEdge, HeightHint, HeightSource};
pub use mesh::{triangle_area, FloorMesh, Mesh, Model, SynthesisStats};
pub use page::{DecodedPage, PagePrimitive, PageRole, TextSpan};
