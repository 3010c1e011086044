//! Triangle meshes and the assembled model.

use super::{BoundingBox, HeightSource, LengthUnit, Metadata, Point3, ScaleFactor};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Indexed triangle mesh.
///
/// Every face index is below `vertices.len()` and no face has zero area.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub vertices: Vec<Point3>,
    pub faces: Vec<[u32; 3]>,
    pub unit: LengthUnit,
}

impl Mesh {
    pub fn new(unit: LengthUnit) -> Self {
        Self {
            vertices: Vec::new(),
            faces: Vec::new(),
            unit,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Append a vertex and return its index.
    pub fn add_vertex(&mut self, p: Point3) -> u32 {
        self.vertices.push(p);
        (self.vertices.len() - 1) as u32
    }

    /// Append a triangle unless its area is below `min_area`.
    ///
    /// Returns whether the face was kept.
    pub fn add_triangle(&mut self, a: Point3, b: Point3, c: Point3, min_area: f64) -> bool {
        if triangle_area(&a, &b, &c) <= min_area {
            return false;
        }
        let ia = self.add_vertex(a);
        let ib = self.add_vertex(b);
        let ic = self.add_vertex(c);
        self.faces.push([ia, ib, ic]);
        true
    }

    /// Append another mesh, offsetting its indices.
    pub fn merge(&mut self, other: &Mesh) {
        if other.is_empty() {
            return;
        }
        let offset = self.vertices.len() as u32;
        self.vertices.reserve(other.vertices.len());
        self.faces.reserve(other.faces.len());
        self.vertices.extend_from_slice(&other.vertices);
        self.faces
            .extend(other.faces.iter().map(|f| [f[0] + offset, f[1] + offset, f[2] + offset]));
    }

    pub fn bounds(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(&self.vertices)
    }

    /// Check the index and area invariants.
    pub fn is_valid(&self) -> bool {
        let n = self.vertices.len() as u32;
        self.faces.iter().all(|f| {
            f.iter().all(|&i| i < n)
                && triangle_area(
                    &self.vertices[f[0] as usize],
                    &self.vertices[f[1] as usize],
                    &self.vertices[f[2] as usize],
                ) > 0.0
        })
    }

    /// Copy of the mesh expressed in another unit.
    pub fn converted(&self, unit: LengthUnit) -> Mesh {
        let factor = self.unit.convert(1.0, unit);
        Mesh {
            vertices: self
                .vertices
                .iter()
                .map(|p| Point3::new(p.x * factor, p.y * factor, p.z * factor))
                .collect(),
            faces: self.faces.clone(),
            unit,
        }
    }
}

/// Area of a 3D triangle.
pub fn triangle_area(a: &Point3, b: &Point3, c: &Point3) -> f64 {
    let ab = b.to_vector() - a.to_vector();
    let ac = c.to_vector() - a.to_vector();
    ab.cross(&ac).norm() / 2.0
}

/// Counters describing what a floor mesh was built from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesisStats {
    pub wall_prisms: usize,
    pub opening_voids: usize,
    pub floor_caps: usize,
    pub ceiling_caps: usize,
    pub skipped_walls: usize,
}

impl SynthesisStats {
    /// Merge statistics from another floor.
    pub fn merge(&mut self, other: &SynthesisStats) {
        self.wall_prisms += other.wall_prisms;
        self.opening_voids += other.opening_voids;
        self.floor_caps += other.floor_caps;
        self.ceiling_caps += other.ceiling_caps;
        self.skipped_walls += other.skipped_walls;
    }
}

/// Mesh of one floor with its placement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FloorMesh {
    pub floor_index: usize,
    /// Millimetres above floor 0
    pub elevation_offset: f64,
    /// Millimetres
    pub wall_height: f64,
    pub height_source: HeightSource,
    pub mesh: Mesh,
    pub stats: SynthesisStats,
}

/// The assembled 3D model of a drawing set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Model {
    /// Per-floor meshes keyed by floor index
    pub floors: BTreeMap<usize, FloorMesh>,
    /// All floors concatenated in ascending floor order
    pub mesh: Mesh,
    pub scale: Option<ScaleFactor>,
    pub bounding_box: BoundingBox,
    pub unit: LengthUnit,
    pub metadata: Metadata,
}

impl Model {
    pub fn floor_count(&self) -> usize {
        self.floors.len()
    }

    pub fn floor(&self, index: usize) -> Option<&FloorMesh> {
        self.floors.get(&index)
    }

    pub fn is_empty(&self) -> bool {
        self.mesh.is_empty()
    }

    /// Statistics summed over all floors.
    pub fn stats(&self) -> SynthesisStats {
        let mut total = SynthesisStats::default();
        for floor in self.floors.values() {
            total.merge(&floor.stats);
        }
        total
    }
}
