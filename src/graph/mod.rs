//! Floor graphs: snapped, validated wall layouts placed in the storey
//! stack.

pub mod builder;
pub mod hints;

pub use builder::{assign_floors, elevation_offsets, FloorGraphBuilder, FloorPlacement};
pub use hints::{height_hints, storey_heights};
