//! Floor and ceiling caps of rooms.

use crate::error::{Error, Result};
use crate::model::{Mesh, Point2, Point3, RoomBoundary};

use super::MIN_TRIANGLE_AREA;

/// Triangulate a room polygon (millimetres, open ring) into indices.
pub fn triangulate_ring(ring: &[Point2]) -> Result<Vec<usize>> {
    if ring.len() < 3 {
        return Err(Error::Triangulation(format!(
            "ring has {} vertices",
            ring.len()
        )));
    }
    let mut coords = Vec::with_capacity(ring.len() * 2);
    for p in ring {
        coords.push(p.x);
        coords.push(p.y);
    }
    earcutr::earcut(&coords, &[], 2).map_err(|e| Error::Triangulation(format!("{:?}", e)))
}

/// Append the floor cap at `floor_z` (facing up) and the ceiling cap at
/// `ceiling_z` (facing down) of one room.
///
/// Returns the number of triangles kept for each cap.
pub fn add_room_caps(
    mesh: &mut Mesh,
    room: &RoomBoundary,
    ratio: f64,
    floor_z: f64,
    ceiling_z: f64,
) -> Result<(usize, usize)> {
    let ring: Vec<Point2> = room.open_ring().iter().map(|p| p.scaled(ratio)).collect();
    let indices = triangulate_ring(&ring)?;

    let mut floor_tris = 0;
    let mut ceiling_tris = 0;
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [ring[tri[0]], ring[tri[1]], ring[tri[2]]];
        // orient counter-clockwise seen from above
        let ccw = (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x) > 0.0;
        let (b, c) = if ccw { (b, c) } else { (c, b) };

        if mesh.add_triangle(
            Point3::from_plan(a, floor_z),
            Point3::from_plan(b, floor_z),
            Point3::from_plan(c, floor_z),
            MIN_TRIANGLE_AREA,
        ) {
            floor_tris += 1;
        }
        if mesh.add_triangle(
            Point3::from_plan(a, ceiling_z),
            Point3::from_plan(c, ceiling_z),
            Point3::from_plan(b, ceiling_z),
            MIN_TRIANGLE_AREA,
        ) {
            ceiling_tris += 1;
        }
    }
    Ok((floor_tris, ceiling_tris))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LengthUnit;
    use approx::assert_relative_eq;

    fn l_shaped_room() -> RoomBoundary {
        let vertices = vec![
            Point2::new(0.0, 0.0),
            Point2::new(4.0, 0.0),
            Point2::new(4.0, 2.0),
            Point2::new(2.0, 2.0),
            Point2::new(2.0, 4.0),
            Point2::new(0.0, 4.0),
            Point2::new(0.0, 0.0),
        ];
        RoomBoundary {
            walls: vec![0, 1, 2, 3, 4, 5],
            vertices,
            area_mm2: 12.0,
            label: None,
        }
    }

    fn normal_z(mesh: &Mesh, face: usize) -> f64 {
        let f = mesh.faces[face];
        let a = mesh.vertices[f[0] as usize].to_vector();
        let b = mesh.vertices[f[1] as usize].to_vector();
        let c = mesh.vertices[f[2] as usize].to_vector();
        (b - a).cross(&(c - a)).z
    }

    #[test]
    fn test_caps_cover_area_and_face_outwards() {
        let mut mesh = Mesh::new(LengthUnit::Millimetre);
        let (floor, ceiling) = add_room_caps(&mut mesh, &l_shaped_room(), 1000.0, 0.0, 2700.0)
            .unwrap();
        assert_eq!(floor, 4);
        assert_eq!(ceiling, 4);
        assert!(mesh.is_valid());

        let mut floor_area = 0.0;
        for (i, f) in mesh.faces.iter().enumerate() {
            let z = mesh.vertices[f[0] as usize].z;
            if z == 0.0 {
                assert!(normal_z(&mesh, i) > 0.0);
                floor_area += crate::model::triangle_area(
                    &mesh.vertices[f[0] as usize],
                    &mesh.vertices[f[1] as usize],
                    &mesh.vertices[f[2] as usize],
                );
            } else {
                assert_eq!(z, 2700.0);
                assert!(normal_z(&mesh, i) < 0.0);
            }
        }
        assert_relative_eq!(floor_area, 12_000_000.0, epsilon = 1e-3);
    }

    #[test]
    fn test_degenerate_ring_fails() {
        assert!(matches!(
            triangulate_ring(&[Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)]),
            Err(Error::Triangulation(_))
        ));
    }
}
