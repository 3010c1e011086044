//! Model assembly: floor meshes to one model.

use std::collections::BTreeMap;

use crate::model::{BoundingBox, FloorMesh, LengthUnit, Mesh, Metadata, Model, ScaleFactor};

/// Concatenate floor meshes into a [`Model`].
///
/// Floors are merged in ascending floor index whatever the input order.
/// The combined mesh and the bounding box are in millimetres; an empty
/// model gets a zero box.
pub fn assemble(
    floors: impl IntoIterator<Item = FloorMesh>,
    scale: Option<ScaleFactor>,
    metadata: Metadata,
) -> Model {
    let floors: BTreeMap<usize, FloorMesh> =
        floors.into_iter().map(|f| (f.floor_index, f)).collect();

    let mut mesh = Mesh::new(LengthUnit::Millimetre);
    for floor in floors.values() {
        mesh.merge(&floor.mesh);
    }
    let bounding_box = mesh.bounds().unwrap_or_default();

    log::debug!(
        "Assembled {} floors: {} vertices, {} faces",
        floors.len(),
        mesh.vertex_count(),
        mesh.face_count()
    );

    Model {
        floors,
        mesh,
        scale,
        bounding_box,
        unit: LengthUnit::Millimetre,
        metadata,
    }
}
