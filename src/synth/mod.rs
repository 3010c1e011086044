//! Mesh synthesis: floor graphs to triangle meshes.

pub mod cap;
pub mod wall;

use rayon::prelude::*;

use crate::model::{FloorGraph, FloorMesh, LengthUnit, Mesh, ScaleFactor, SynthesisStats};
use crate::options::ConvertOptions;
use crate::warning::ConversionWarning;

pub use cap::{add_room_caps, triangulate_ring};
pub use wall::{opening_band, wall_mesh, wall_voids, Void};

/// Triangles with less area (square millimetres) are dropped.
pub const MIN_TRIANGLE_AREA: f64 = 1e-6;

/// Turns [`FloorGraph`]s into [`FloorMesh`]es.
pub struct MeshSynthesizer<'a> {
    options: &'a ConvertOptions,
    scale: ScaleFactor,
}

impl<'a> MeshSynthesizer<'a> {
    pub fn new(options: &'a ConvertOptions, scale: ScaleFactor) -> Self {
        Self { options, scale }
    }

    /// Build the mesh of one floor.
    ///
    /// Short walls and rooms that cannot be triangulated are left out and
    /// reported as warnings.
    pub fn synthesize(&self, graph: &FloorGraph) -> (FloorMesh, Vec<ConversionWarning>) {
        let ratio = self.scale.ratio;
        let base = graph.elevation_offset;
        let height = graph.wall_height;
        let mut mesh = Mesh::new(LengthUnit::Millimetre);
        let mut stats = SynthesisStats::default();
        let mut warnings = Vec::new();

        for (i, edge) in graph.edges.iter().enumerate() {
            let voids = wall_voids(
                graph.openings_on(i),
                edge.wall.length(),
                ratio,
                height,
                self.options,
            );
            match wall_mesh(
                &mut mesh,
                &edge.wall,
                &voids,
                ratio,
                base,
                height,
                self.options,
                (graph.floor_index, i),
            ) {
                Ok(()) => {
                    stats.wall_prisms += 1;
                    stats.opening_voids += voids.len();
                }
                Err(e) => {
                    log::debug!("Floor {}: {}", graph.floor_index, e);
                    stats.skipped_walls += 1;
                    warnings.extend(ConversionWarning::from_error(&e));
                }
            }
        }

        for (i, room) in graph.rooms.iter().enumerate() {
            match add_room_caps(&mut mesh, room, ratio, base, base + height) {
                Ok((floor_tris, ceiling_tris)) => {
                    stats.floor_caps += usize::from(floor_tris > 0);
                    stats.ceiling_caps += usize::from(ceiling_tris > 0);
                }
                Err(e) => warnings.push(ConversionWarning::UntriangulatedRoom {
                    floor: graph.floor_index,
                    room: i,
                    reason: e.to_string(),
                }),
            }
        }

        log::debug!(
            "Floor {}: {} triangles from {} walls ({} voids), {} rooms",
            graph.floor_index,
            mesh.face_count(),
            stats.wall_prisms,
            stats.opening_voids,
            stats.floor_caps
        );

        let floor = FloorMesh {
            floor_index: graph.floor_index,
            elevation_offset: base,
            wall_height: height,
            height_source: graph.height_source,
            mesh,
            stats,
        };
        (floor, warnings)
    }

    /// Build every floor, in parallel when the options allow it.
    ///
    /// Results keep the order of `graphs`.
    pub fn synthesize_all(&self, graphs: &[FloorGraph]) -> Vec<(FloorMesh, Vec<ConversionWarning>)> {
        if self.options.parallel && graphs.len() > 1 {
            graphs.par_iter().map(|g| self.synthesize(g)).collect()
        } else {
            graphs.iter().map(|g| self.synthesize(g)).collect()
        }
    }
}

/// Build the mesh of one floor graph.
pub fn synthesize_floor(
    graph: &FloorGraph,
    scale: ScaleFactor,
    options: &ConvertOptions,
) -> (FloorMesh, Vec<ConversionWarning>) {
    MeshSynthesizer::new(options, scale).synthesize(graph)
}
