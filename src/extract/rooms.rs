//! Room detection by tracing the faces of the planar wall graph.

use rustc_hash::FxHashSet;

use super::openings::text_kind;
use super::spatial::PointGrid;
use super::Params;
use crate::model::{signed_area, DecodedPage, Point2, RoomBoundary, WallSegment};
use crate::scale::{parse_length_mm, parse_scale_note};

struct Edge {
    from: usize,
    to: usize,
    wall: usize,
    alive: bool,
}

/// Find the rooms enclosed by `walls`.
///
/// Wall ends are snapped together, dead ends are pruned, and every
/// counter-clockwise face that is a simple polygon of at least
/// `min_room_area` becomes a room.
pub fn detect_rooms(walls: &[WallSegment], page: &DecodedPage, params: &Params) -> Vec<RoomBoundary> {
    let mut grid = PointGrid::new(params.epsilon);
    let mut edges: Vec<Edge> = Vec::new();
    let mut seen: FxHashSet<(usize, usize)> = FxHashSet::default();
    for (i, wall) in walls.iter().enumerate() {
        let from = grid.snap(wall.start);
        let to = grid.snap(wall.end);
        if from == to || !seen.insert((from.min(to), from.max(to))) {
            continue;
        }
        edges.push(Edge {
            from,
            to,
            wall: i,
            alive: true,
        });
    }
    let points = grid.into_points();

    prune_dead_ends(&mut edges, points.len());

    // neighbours of each vertex sorted counter-clockwise by angle
    let mut around: Vec<Vec<(usize, usize)>> = vec![Vec::new(); points.len()];
    for (k, edge) in edges.iter().enumerate().filter(|(_, e)| e.alive) {
        around[edge.from].push((edge.to, k));
        around[edge.to].push((edge.from, k));
    }
    for (v, list) in around.iter_mut().enumerate() {
        let origin = points[v];
        list.sort_by(|a, b| {
            angle(&origin, &points[a.0])
                .total_cmp(&angle(&origin, &points[b.0]))
                .then(a.0.cmp(&b.0))
        });
    }

    let mut visited: FxHashSet<(usize, usize)> = FxHashSet::default();
    let mut rooms = Vec::new();
    for edge in edges.iter().filter(|e| e.alive) {
        for start in [(edge.from, edge.to), (edge.to, edge.from)] {
            if visited.contains(&start) {
                continue;
            }
            let (ring, walls_on_face) = trace_face(start, &around, &edges, &mut visited);
            if let Some(room) = make_room(&ring, walls_on_face, &points, page, params) {
                rooms.push(room);
            }
        }
    }

    log::trace!("Page {}: {} rooms", page.index, rooms.len());
    rooms
}

fn angle(origin: &Point2, p: &Point2) -> f64 {
    (p.y - origin.y).atan2(p.x - origin.x)
}

fn prune_dead_ends(edges: &mut [Edge], vertex_count: usize) {
    let mut degree = vec![0usize; vertex_count];
    for edge in edges.iter() {
        degree[edge.from] += 1;
        degree[edge.to] += 1;
    }
    loop {
        let mut changed = false;
        for edge in edges.iter_mut().filter(|e| e.alive) {
            if degree[edge.from] <= 1 || degree[edge.to] <= 1 {
                edge.alive = false;
                degree[edge.from] -= 1;
                degree[edge.to] -= 1;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
}

/// Walk one face keeping it on the left: at each vertex take the
/// neighbour just clockwise of the one we came from.
fn trace_face(
    start: (usize, usize),
    around: &[Vec<(usize, usize)>],
    edges: &[Edge],
    visited: &mut FxHashSet<(usize, usize)>,
) -> (Vec<usize>, Vec<usize>) {
    let mut ring = Vec::new();
    let mut walls = Vec::new();
    let (mut a, mut b) = start;
    let limit = 2 * edges.len() + 1;

    for _ in 0..limit {
        visited.insert((a, b));
        ring.push(a);

        let list = &around[b];
        let Some(back) = list.iter().position(|&(n, _)| n == a) else {
            break;
        };
        walls.push(edges[list[back].1].wall);
        let (next, _) = list[(back + list.len() - 1) % list.len()];
        a = b;
        b = next;
        if (a, b) == start {
            break;
        }
    }

    (ring, walls)
}

fn make_room(
    ring: &[usize],
    walls: Vec<usize>,
    points: &[Point2],
    page: &DecodedPage,
    params: &Params,
) -> Option<RoomBoundary> {
    if ring.len() < 3 {
        return None;
    }
    let unique: FxHashSet<usize> = ring.iter().copied().collect();
    if unique.len() != ring.len() {
        return None;
    }

    let mut vertices: Vec<Point2> = ring.iter().map(|&v| points[v]).collect();
    let area = signed_area(&vertices);
    let area_mm2 = area * params.ratio * params.ratio;
    if area <= 0.0 || area_mm2 < params.min_room_area_mm2 {
        return None;
    }

    let label = room_label(&vertices, page, params);
    vertices.push(vertices[0]);
    Some(RoomBoundary {
        walls,
        vertices,
        area_mm2,
        label,
    })
}

/// First text inside the room that is not a dimension, scale note or
/// opening label.
fn room_label(ring: &[Point2], page: &DecodedPage, params: &Params) -> Option<String> {
    page.texts()
        .filter(|t| contains_point(ring, &t.center()))
        .map(|t| t.text.trim())
        .find(|text| {
            !text.is_empty()
                && parse_length_mm(text).is_none()
                && parse_scale_note(text).is_none()
                && text_kind(text, params).is_none()
        })
        .map(str::to_string)
}

/// Even-odd point-in-polygon test on an open ring.
pub fn contains_point(ring: &[Point2], p: &Point2) -> bool {
    let mut inside = false;
    let n = ring.len();
    let mut j = n.wrapping_sub(1);
    for i in 0..n {
        let (a, b) = (ring[i], ring[j]);
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}
