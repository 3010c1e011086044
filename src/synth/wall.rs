//! Wall prisms with openings cut out.
//!
//! A wall is built in its own frame: `u` runs along the centerline from
//! 0 to the wall length, `v` across the thickness and `z` up from the
//! floor level. Everything is millimetres.

use nalgebra::{Vector2, Vector3};

use crate::error::{Error, Result};
use crate::model::{Mesh, Opening, OpeningKind, Point3, WallSegment};
use crate::options::ConvertOptions;

use super::MIN_TRIANGLE_AREA;

/// A rectangular hole through a wall, in wall coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Void {
    pub u0: f64,
    pub u1: f64,
    pub z0: f64,
    pub z1: f64,
}

/// Vertical band an opening of `kind` occupies, clamped to the wall.
pub fn opening_band(kind: OpeningKind, options: &ConvertOptions, height: f64) -> (f64, f64) {
    let (lo, hi) = match kind {
        OpeningKind::Window => (options.window_sill_mm, options.window_head_mm),
        OpeningKind::Door | OpeningKind::Unknown => (0.0, options.door_height_mm),
    };
    (lo.clamp(0.0, height), hi.clamp(0.0, height))
}

/// Voids of the openings on one wall, overlapping ones merged.
pub fn wall_voids<'a, I>(
    openings: I,
    length_page: f64,
    ratio: f64,
    height: f64,
    options: &ConvertOptions,
) -> Vec<Void>
where
    I: IntoIterator<Item = &'a Opening>,
{
    let mut voids: Vec<Void> = openings
        .into_iter()
        .filter_map(|o| {
            let (lo, hi) = o.span_on(length_page);
            let (z0, z1) = opening_band(o.kind, options, height);
            let void = Void {
                u0: lo * ratio,
                u1: hi * ratio,
                z0,
                z1,
            };
            (void.u1 - void.u0 > f64::EPSILON && z1 - z0 > f64::EPSILON).then_some(void)
        })
        .collect();
    voids.sort_by(|a, b| a.u0.total_cmp(&b.u0));

    let mut merged: Vec<Void> = Vec::with_capacity(voids.len());
    for void in voids {
        match merged.last_mut() {
            Some(last) if void.u0 < last.u1 => {
                last.u1 = last.u1.max(void.u1);
                last.z0 = last.z0.min(void.z0);
                last.z1 = last.z1.max(void.z1);
            }
            _ => merged.push(void),
        }
    }
    merged
}

/// Local frame of a wall placed in the model.
struct Frame {
    origin: Vector2<f64>,
    along: Vector2<f64>,
    across: Vector2<f64>,
    half: f64,
    base: f64,
}

impl Frame {
    fn at(&self, u: f64, side: f64, z: f64) -> Point3 {
        let p = self.origin + self.along * u + self.across * (side * self.half);
        Point3::new(p.x, p.y, self.base + z)
    }

    fn along3(&self) -> Vector3<f64> {
        Vector3::new(self.along.x, self.along.y, 0.0)
    }

    fn across3(&self) -> Vector3<f64> {
        Vector3::new(self.across.x, self.across.y, 0.0)
    }
}

/// Append a quad split into two triangles wound around `outward`.
///
/// Returns the number of triangles kept.
fn add_quad(mesh: &mut Mesh, quad: [Point3; 4], outward: Vector3<f64>) -> usize {
    let [a, b, c, d] = quad;
    let normal = (b.to_vector() - a.to_vector()).cross(&(c.to_vector() - a.to_vector()));
    let tris = if normal.dot(&outward) >= 0.0 {
        [(a, b, c), (a, c, d)]
    } else {
        [(a, c, b), (a, d, c)]
    };
    let mut kept = 0;
    for (p, q, r) in tris {
        if mesh.add_triangle(p, q, r, MIN_TRIANGLE_AREA) {
            kept += 1;
        }
    }
    kept
}

/// Intervals of `[0, length]` not covered by `cut`.
fn complement(length: f64, cut: &[(f64, f64)]) -> Vec<(f64, f64)> {
    let mut out = Vec::new();
    let mut from = 0.0;
    for &(a, b) in cut {
        if a > from {
            out.push((from, a));
        }
        from = from.max(b);
    }
    if length > from {
        out.push((from, length));
    }
    out
}

/// Solid height intervals of a column holding `void` (if any).
fn solid_cells(void: Option<&Void>, height: f64) -> Vec<(f64, f64)> {
    match void {
        None => vec![(0.0, height)],
        Some(v) => complement(height, &[(v.z0, v.z1)]),
    }
}

/// Build the prism of one wall with its voids.
///
/// `floor` and `wall` only label the error for walls shorter than
/// `min_wall_length_mm`.
#[allow(clippy::too_many_arguments)]
pub fn wall_mesh(
    mesh: &mut Mesh,
    wall: &WallSegment,
    voids: &[Void],
    ratio: f64,
    base: f64,
    height: f64,
    options: &ConvertOptions,
    (floor, index): (usize, usize),
) -> Result<()> {
    let length = wall.length() * ratio;
    if length < options.min_wall_length_mm || length <= f64::EPSILON {
        return Err(Error::DegenerateGeometry {
            floor,
            wall: index,
            length_mm: length,
        });
    }

    let along = wall.direction();
    let frame = Frame {
        origin: wall.start.to_vector() * ratio,
        along,
        across: Vector2::new(-along.y, along.x),
        half: wall.thickness * ratio / 2.0,
        base,
    };
    let up = Vector3::new(0.0, 0.0, 1.0);

    // long faces, tiled column by column
    let mut breaks: Vec<f64> = vec![0.0, length];
    for v in voids {
        breaks.push(v.u0);
        breaks.push(v.u1);
    }
    breaks.sort_by(|a, b| a.total_cmp(b));
    breaks.dedup_by(|a, b| (*a - *b).abs() <= f64::EPSILON);

    for col in breaks.windows(2) {
        let (u0, u1) = (col[0], col[1]);
        let mid = (u0 + u1) / 2.0;
        let void = voids.iter().find(|v| v.u0 <= mid && mid <= v.u1);
        for (z0, z1) in solid_cells(void, height) {
            for side in [1.0, -1.0] {
                add_quad(
                    mesh,
                    [
                        frame.at(u0, side, z0),
                        frame.at(u1, side, z0),
                        frame.at(u1, side, z1),
                        frame.at(u0, side, z1),
                    ],
                    frame.across3() * side,
                );
            }
        }
    }

    // top and bottom leave out voids reaching them
    let top_cut: Vec<(f64, f64)> = voids
        .iter()
        .filter(|v| v.z1 >= height)
        .map(|v| (v.u0, v.u1))
        .collect();
    let bottom_cut: Vec<(f64, f64)> = voids
        .iter()
        .filter(|v| v.z0 <= 0.0)
        .map(|v| (v.u0, v.u1))
        .collect();
    for (cut, z, outward) in [(top_cut, height, up), (bottom_cut, 0.0, -up)] {
        for (u0, u1) in complement(length, &cut) {
            add_quad(
                mesh,
                [
                    frame.at(u0, -1.0, z),
                    frame.at(u1, -1.0, z),
                    frame.at(u1, 1.0, z),
                    frame.at(u0, 1.0, z),
                ],
                outward,
            );
        }
    }

    // end caps
    for (u, outward) in [(0.0, -frame.along3()), (length, frame.along3())] {
        let void = voids.iter().find(|v| v.u0 <= u && u <= v.u1);
        for (z0, z1) in solid_cells(void, height) {
            add_quad(
                mesh,
                [
                    frame.at(u, -1.0, z0),
                    frame.at(u, 1.0, z0),
                    frame.at(u, 1.0, z1),
                    frame.at(u, -1.0, z1),
                ],
                outward,
            );
        }
    }

    // reveals
    for v in voids {
        for (u, outward, solid_beyond) in [
            (v.u0, frame.along3(), v.u0 > 0.0),
            (v.u1, -frame.along3(), v.u1 < length),
        ] {
            if solid_beyond {
                add_quad(
                    mesh,
                    [
                        frame.at(u, -1.0, v.z0),
                        frame.at(u, 1.0, v.z0),
                        frame.at(u, 1.0, v.z1),
                        frame.at(u, -1.0, v.z1),
                    ],
                    outward,
                );
            }
        }
        for (z, outward, solid_beyond) in [(v.z1, -up, v.z1 < height), (v.z0, up, v.z0 > 0.0)] {
            if solid_beyond {
                add_quad(
                    mesh,
                    [
                        frame.at(v.u0, -1.0, z),
                        frame.at(v.u1, -1.0, z),
                        frame.at(v.u1, 1.0, z),
                        frame.at(v.u0, 1.0, z),
                    ],
                    outward,
                );
            }
        }
    }

    Ok(())
}
