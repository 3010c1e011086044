//! Wall recognition: face-line pairing, collinear merging and junction
//! clean-up.
//!
//! Every step takes an immutable snapshot and returns a new one, all in
//! page units.

use nalgebra::Vector2;

use super::spatial::{DisjointSets, SegmentGrid};
use super::Params;
use crate::model::{DecodedPage, Point2, WallSegment};

pub type Segment = (Point2, Point2);

/// A gap in a wall run, before it is classified as an opening.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gap {
    /// Index of the wall that hosts the gap
    pub host: usize,
    pub center: Point2,
    pub width: f64,
}

fn cross(a: &Vector2<f64>, b: &Vector2<f64>) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Unit direction of `a`-`b`, flipped to point towards +x (or +y when
/// vertical) so parallel lines share one direction.
pub fn canonical_direction(a: &Point2, b: &Point2) -> Vector2<f64> {
    let d = b.to_vector() - a.to_vector();
    let len = d.norm();
    if len < f64::EPSILON {
        return Vector2::zeros();
    }
    let d = d / len;
    if d.x < -1e-9 || (d.x.abs() <= 1e-9 && d.y < 0.0) {
        -d
    } else {
        d
    }
}

fn normal(dir: &Vector2<f64>) -> Vector2<f64> {
    Vector2::new(-dir.y, dir.x)
}

/// Point at station `s` and signed offset `offset` of a line through the
/// origin with direction `dir`.
fn on_line(dir: &Vector2<f64>, s: f64, offset: f64) -> Point2 {
    Point2::from_vector(dir * s + normal(dir) * offset)
}

/// Line segments plus the four edges of every rectangle, without
/// zero-length pieces.
pub fn collect_segments(page: &DecodedPage) -> Vec<Segment> {
    page.edges()
        .into_iter()
        .filter(|(a, b)| a.distance_to(b) > f64::EPSILON)
        .collect()
}

struct PairCandidate {
    i: usize,
    j: usize,
    distance: f64,
    /// Overlap stations along the direction of `i`
    lo: f64,
    hi: f64,
    /// Signed offset of `j` from the line of `i`
    offset: f64,
}

/// Pair parallel face lines into walls.
///
/// Two lines form a wall when their distance lies in the thickness range
/// and they overlap by at least that distance. Thinner pairs are taken
/// first and no stretch of a line is used twice.
pub fn pair_walls(segments: &[Segment], params: &Params) -> Vec<WallSegment> {
    let grid = SegmentGrid::build(segments, params.max_thickness);
    let dirs: Vec<Vector2<f64>> = segments
        .iter()
        .map(|(a, b)| canonical_direction(a, b))
        .collect();

    let mut candidates = Vec::new();
    for (i, (a0, a1)) in segments.iter().enumerate() {
        let di = dirs[i];
        for j in grid.near(a0, a1, params.max_thickness) {
            if j <= i || cross(&di, &dirs[j]).abs() > params.sin_parallel {
                continue;
            }
            let (b0, b1) = segments[j];
            let o0 = cross(&di, &(b0.to_vector() - a0.to_vector()));
            let o1 = cross(&di, &(b1.to_vector() - a0.to_vector()));
            let offset = (o0 + o1) / 2.0;
            let distance = offset.abs();
            if distance < params.min_thickness || distance > params.max_thickness {
                continue;
            }

            let (si0, si1) = stations(&di, a0, a1);
            let (sj0, sj1) = stations(&di, &b0, &b1);
            let lo = si0.max(sj0);
            let hi = si1.min(sj1);
            if hi - lo < distance {
                continue;
            }
            candidates.push(PairCandidate {
                i,
                j,
                distance,
                lo,
                hi,
                offset,
            });
        }
    }

    candidates.sort_by(|x, y| {
        x.distance
            .total_cmp(&y.distance)
            .then(x.i.cmp(&y.i))
            .then(x.j.cmp(&y.j))
    });

    let mut used: Vec<Vec<(f64, f64)>> = vec![Vec::new(); segments.len()];
    let mut walls = Vec::new();
    for c in candidates {
        let di = dirs[c.i];
        let a0 = segments[c.i].0;
        let base = a0.to_vector().dot(&di);
        let start_i = Point2::from_vector(a0.to_vector() + di * (c.lo - base));
        let end_i = Point2::from_vector(a0.to_vector() + di * (c.hi - base));

        let span_i = (c.lo, c.hi);
        let span_j = stations(&dirs[c.j], &start_i, &end_i);
        if overlaps_any(&used[c.i], span_i, params.epsilon)
            || overlaps_any(&used[c.j], span_j, params.epsilon)
        {
            continue;
        }
        used[c.i].push(span_i);
        used[c.j].push(span_j);

        let shift = normal(&di) * (c.offset / 2.0);
        let start = Point2::from_vector(start_i.to_vector() + shift);
        let end = Point2::from_vector(end_i.to_vector() + shift);
        walls.push(WallSegment::new(start, end, c.distance));
    }

    log::trace!(
        "Paired {} walls from {} segments",
        walls.len(),
        segments.len()
    );
    walls
}

/// Sorted stations of a segment's endpoints along `dir`.
fn stations(dir: &Vector2<f64>, a: &Point2, b: &Point2) -> (f64, f64) {
    let sa = a.to_vector().dot(dir);
    let sb = b.to_vector().dot(dir);
    (sa.min(sb), sa.max(sb))
}

/// Grid over wall centerlines, sized like the one over face lines.
fn wall_grid(walls: &[WallSegment], params: &Params) -> SegmentGrid {
    let segments: Vec<Segment> = walls.iter().map(|w| (w.start, w.end)).collect();
    SegmentGrid::build(&segments, params.max_thickness)
}

/// Largest distance at which an end still joins a crossing wall.
fn join_reach(params: &Params) -> f64 {
    params.max_thickness + params.epsilon
}

fn overlaps_any(spans: &[(f64, f64)], span: (f64, f64), epsilon: f64) -> bool {
    spans
        .iter()
        .any(|&(u0, u1)| span.1.min(u1) - span.0.max(u0) > epsilon)
}

/// Merge collinear walls separated by small gaps into single runs.
///
/// Gaps of at least `min_opening` inside a run are returned as openings;
/// narrower ones are drafting breaks and disappear.
pub fn merge_collinear(walls: &[WallSegment], params: &Params) -> (Vec<WallSegment>, Vec<Gap>) {
    let dirs: Vec<Vector2<f64>> = walls
        .iter()
        .map(|w| canonical_direction(&w.start, &w.end))
        .collect();

    let grid = wall_grid(walls, params);
    let mut sets = DisjointSets::new(walls.len());
    for (i, wall) in walls.iter().enumerate() {
        let margin = params.max_opening + params.max_thickness;
        for j in grid.near(&wall.start, &wall.end, margin) {
            if j > i && collinear_neighbours(walls, &dirs, i, j, params) {
                sets.union(i, j);
            }
        }
    }

    let mut merged = Vec::new();
    let mut gaps = Vec::new();
    for group in sets.groups() {
        let host = merged.len();
        let dir = dirs[group[0]];

        let mut spans: Vec<(f64, f64)> = group
            .iter()
            .map(|&k| stations(&dir, &walls[k].start, &walls[k].end))
            .collect();
        spans.sort_by(|a, b| a.0.total_cmp(&b.0));

        let count = group.len() as f64;
        let offset = group
            .iter()
            .map(|&k| cross(&dir, &walls[k].start.midpoint(&walls[k].end).to_vector()))
            .sum::<f64>()
            / count;
        let thickness = group.iter().map(|&k| walls[k].thickness).sum::<f64>() / count;

        let mut covered = spans[0].1;
        for &(s0, s1) in &spans[1..] {
            let gap = s0 - covered;
            if gap >= params.min_opening {
                gaps.push(Gap {
                    host,
                    center: on_line(&dir, (covered + s0) / 2.0, offset),
                    width: gap,
                });
            }
            covered = covered.max(s1);
        }

        let mut wall = WallSegment::new(
            on_line(&dir, spans[0].0, offset),
            on_line(&dir, covered, offset),
            thickness,
        );
        wall.floor_index = walls[group[0]].floor_index;
        merged.push(wall);
    }

    (merged, gaps)
}

fn collinear_neighbours(
    walls: &[WallSegment],
    dirs: &[Vector2<f64>],
    i: usize,
    j: usize,
    params: &Params,
) -> bool {
    let (a, b) = (&walls[i], &walls[j]);
    let di = dirs[i];
    if cross(&di, &dirs[j]).abs() > params.sin_parallel {
        return false;
    }
    let mid = b.start.midpoint(&b.end);
    if cross(&di, &(mid.to_vector() - a.start.to_vector())).abs() > params.epsilon {
        return false;
    }
    let thicker = a.thickness.max(b.thickness);
    if (a.thickness - b.thickness).abs() > params.epsilon.max(thicker * 0.1) {
        return false;
    }
    let (ai0, ai1) = stations(&di, &a.start, &a.end);
    let (bj0, bj1) = stations(&di, &b.start, &b.end);
    let gap = ai0.max(bj0) - ai1.min(bj1);
    gap <= params.max_opening
}

/// Extend or trim wall ends onto the centerline of a crossing wall.
///
/// An end moves to the intersection with a non-parallel wall when the
/// intersection is within the larger of the two thicknesses, which closes
/// corners and T-junctions drawn as face outlines.
///
/// An end that stops short of a corner by an opening's width is first
/// carried to that corner, and the stretch it crossed is returned as a
/// [`Gap`] on the wall.
pub fn join_ends(walls: &[WallSegment], params: &Params) -> (Vec<WallSegment>, Vec<Gap>) {
    let grid = wall_grid(walls, params);
    let mut gaps = Vec::new();
    let mut extended = walls.to_vec();
    for (i, wall) in walls.iter().enumerate() {
        for at_start in [true, false] {
            let end = if at_start { wall.start } else { wall.end };
            if snap_end(walls, &grid, i, end, params).is_some() {
                continue;
            }
            if let Some((corner, gap)) = corner_gap(walls, &grid, i, at_start, params) {
                if at_start {
                    extended[i].start = corner;
                } else {
                    extended[i].end = corner;
                }
                gaps.push(gap);
            }
        }
    }

    let grid = wall_grid(&extended, params);
    let joined = extended
        .iter()
        .enumerate()
        .map(|(i, wall)| {
            let mut joined = *wall;
            joined.start = snap_end(&extended, &grid, i, wall.start, params).unwrap_or(wall.start);
            joined.end = snap_end(&extended, &grid, i, wall.end, params).unwrap_or(wall.end);
            if joined.length() > params.epsilon {
                joined
            } else {
                *wall
            }
        })
        .collect();

    (joined, gaps)
}

fn snap_end(
    walls: &[WallSegment],
    grid: &SegmentGrid,
    i: usize,
    end: Point2,
    params: &Params,
) -> Option<Point2> {
    let wall = &walls[i];
    let di = wall.direction();
    let mut best: Option<(f64, Point2)> = None;

    for j in grid.near(&end, &end, 2.0 * join_reach(params)) {
        if j == i {
            continue;
        }
        let other = &walls[j];
        let dj = other.direction();
        let denom = cross(&di, &dj);
        if denom.abs() <= params.sin_parallel {
            continue;
        }
        let t = cross(&(other.start.to_vector() - wall.start.to_vector()), &dj) / denom;
        let x = Point2::from_vector(wall.start.to_vector() + di * t);

        let reach = wall.thickness.max(other.thickness) + params.epsilon;
        let moved = x.distance_to(&end);
        if moved > reach {
            continue;
        }
        let u = (x.to_vector() - other.start.to_vector()).dot(&dj);
        if u < -reach || u > other.length() + reach {
            continue;
        }
        if best.map_or(true, |(d, _)| moved < d) {
            best = Some((moved, x));
        }
    }

    best.map(|(_, x)| x)
}

/// Corner ahead of a wall end with an opening-sized stretch in between.
///
/// The crossing wall must end near the corner, and the distance from the
/// wall end to the crossing wall's face must be an opening width.
fn corner_gap(
    walls: &[WallSegment],
    grid: &SegmentGrid,
    i: usize,
    at_start: bool,
    params: &Params,
) -> Option<(Point2, Gap)> {
    let wall = &walls[i];
    let di = wall.direction();
    let (end, outward) = if at_start {
        (wall.start, -di)
    } else {
        (wall.end, di)
    };
    let mut best: Option<(f64, Point2, f64)> = None;

    let margin = params.max_opening + 2.0 * join_reach(params);
    for j in grid.near(&end, &end, margin) {
        if j == i {
            continue;
        }
        let other = &walls[j];
        let dj = other.direction();
        let denom = cross(&di, &dj);
        if denom.abs() <= params.sin_parallel {
            continue;
        }
        let t = cross(&(other.start.to_vector() - wall.start.to_vector()), &dj) / denom;
        let x = Point2::from_vector(wall.start.to_vector() + di * t);

        let moved = (x.to_vector() - end.to_vector()).dot(&outward);
        if moved <= 0.0 {
            continue;
        }
        let reach = wall.thickness.max(other.thickness) + params.epsilon;
        if x.distance_to(&other.start).min(x.distance_to(&other.end)) > reach {
            continue;
        }
        let width = moved - other.thickness / 2.0;
        if width < params.min_opening || width > params.max_opening {
            continue;
        }
        if best.map_or(true, |(d, _, _)| moved < d) {
            best = Some((moved, x, width));
        }
    }

    let (_, corner, width) = best?;
    let face = Point2::from_vector(end.to_vector() + outward * width);
    Some((
        corner,
        Gap {
            host: i,
            center: end.midpoint(&face),
            width,
        },
    ))
}

/// Split walls where another wall ends on their interior.
///
/// Returns the pieces and, for each piece, the index of the wall it came
/// from.
pub fn split_at_junctions(walls: &[WallSegment], params: &Params) -> (Vec<WallSegment>, Vec<usize>) {
    let eps = params.epsilon;
    let grid = wall_grid(walls, params);
    let mut pieces = Vec::new();
    let mut parents = Vec::new();

    for (i, wall) in walls.iter().enumerate() {
        let len = wall.length();
        let dir = wall.direction();
        let mut cuts: Vec<f64> = grid
            .near(&wall.start, &wall.end, eps)
            .into_iter()
            .filter(|&j| j != i)
            .flat_map(|j| [walls[j].start, walls[j].end])
            .filter(|p| p.distance_to_segment(&wall.start, &wall.end) <= eps)
            .map(|p| (p.to_vector() - wall.start.to_vector()).dot(&dir))
            .filter(|s| *s > eps && *s < len - eps)
            .collect();
        cuts.sort_by(|a, b| a.total_cmp(b));
        cuts.dedup_by(|a, b| (*a - *b).abs() <= eps);

        let mut from = 0.0;
        for s in cuts.into_iter().chain(std::iter::once(len)) {
            let mut piece = *wall;
            piece.start = wall.point_at(from / len);
            piece.end = wall.point_at(s / len);
            pieces.push(piece);
            parents.push(i);
            from = s;
        }
    }

    (pieces, parents)
}

/// Move gaps from their original host onto the split piece that holds
/// their centre.
pub fn rehost_gaps(gaps: &[Gap], pieces: &[WallSegment], parents: &[usize]) -> Vec<Gap> {
    gaps.iter()
        .filter_map(|gap| {
            let host = (0..pieces.len())
                .filter(|&k| parents[k] == gap.host)
                .min_by(|&a, &b| {
                    let da = gap.center.distance_to_segment(&pieces[a].start, &pieces[a].end);
                    let db = gap.center.distance_to_segment(&pieces[b].start, &pieces[b].end);
                    da.total_cmp(&db)
                })?;
            Some(Gap { host, ..*gap })
        })
        .collect()
}
