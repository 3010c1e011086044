//! Grid hashes for tolerance lookups on the plan, plus disjoint sets
//! for grouping what they find.

use rustc_hash::FxHashMap;

use crate::model::Point2;

type Cell = (i64, i64);

fn cell_of(p: &Point2, size: f64) -> Cell {
    ((p.x / size).floor() as i64, (p.y / size).floor() as i64)
}

/// Merges points closer than a tolerance into shared vertices.
///
/// Vertex ids are handed out in insertion order, and a lookup always
/// answers with the lowest matching id so results do not depend on hash
/// iteration order.
#[derive(Debug)]
pub struct PointGrid {
    tolerance: f64,
    cells: FxHashMap<Cell, Vec<usize>>,
    points: Vec<Point2>,
}

impl PointGrid {
    /// `tolerance` doubles as the cell size.
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance: tolerance.max(f64::EPSILON),
            cells: FxHashMap::default(),
            points: Vec::new(),
        }
    }

    /// Id of an existing vertex within tolerance of `p`.
    pub fn find(&self, p: &Point2) -> Option<usize> {
        let (cx, cy) = cell_of(p, self.tolerance);
        let mut found: Option<usize> = None;
        for dx in -1..=1 {
            for dy in -1..=1 {
                let Some(ids) = self.cells.get(&(cx + dx, cy + dy)) else {
                    continue;
                };
                for &id in ids {
                    if self.points[id].distance_to(p) <= self.tolerance
                        && found.map_or(true, |f| id < f)
                    {
                        found = Some(id);
                    }
                }
            }
        }
        found
    }

    /// Snap `p` onto an existing vertex or register it as a new one.
    pub fn snap(&mut self, p: Point2) -> usize {
        if let Some(id) = self.find(&p) {
            return id;
        }
        let id = self.points.len();
        self.points.push(p);
        self.cells
            .entry(cell_of(&p, self.tolerance))
            .or_default()
            .push(id);
        id
    }

    pub fn point(&self, id: usize) -> Point2 {
        self.points[id]
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn into_points(self) -> Vec<Point2> {
        self.points
    }
}

/// Most cells along either side of the area a grid spans.
const MAX_CELLS_PER_AXIS: f64 = 4096.0;

/// Buckets segments by the cells they pass through.
///
/// The cell size never drops below 1/4096 of the drawing's extent, so a
/// mis-declared scale cannot blow up the number of cells.
#[derive(Debug)]
pub struct SegmentGrid {
    cell_size: f64,
    cells: FxHashMap<Cell, Vec<usize>>,
}

impl SegmentGrid {
    pub fn build(segments: &[(Point2, Point2)], cell_size: f64) -> Self {
        let mut grid = Self {
            cell_size: cell_size
                .max(extent(segments) / MAX_CELLS_PER_AXIS)
                .max(f64::EPSILON),
            cells: FxHashMap::default(),
        };
        for (i, (a, b)) in segments.iter().enumerate() {
            for cell in grid.cells_near(a, b, 0.0) {
                grid.cells.entry(cell).or_default().push(i);
            }
        }
        grid
    }

    /// Every cell holding a point within `margin` of `a`-`b`, plus a few
    /// neighbours.
    ///
    /// The segment is sampled in steps of at most half a cell (or the
    /// margin, when larger) so a long diagonal covers a band of cells
    /// instead of its whole bounding box.
    fn cells_near(&self, a: &Point2, b: &Point2, margin: f64) -> Vec<Cell> {
        let step = (self.cell_size / 2.0).max(margin);
        let reach = margin + step / 2.0;
        let samples = (a.distance_to(b) / step).ceil().max(1.0) as usize;

        let mut cells = Vec::new();
        for k in 0..=samples {
            let p = a.lerp(b, k as f64 / samples as f64);
            let (x0, y0) = cell_of(&Point2::new(p.x - reach, p.y - reach), self.cell_size);
            let (x1, y1) = cell_of(&Point2::new(p.x + reach, p.y + reach), self.cell_size);
            for cx in x0..=x1 {
                for cy in y0..=y1 {
                    cells.push((cx, cy));
                }
            }
        }
        cells.sort_unstable();
        cells.dedup();
        cells
    }

    /// Indices of segments that may come within `margin` of `a`-`b`,
    /// sorted and without duplicates.
    pub fn near(&self, a: &Point2, b: &Point2, margin: f64) -> Vec<usize> {
        let mut out: Vec<usize> = self
            .cells_near(a, b, margin)
            .iter()
            .filter_map(|cell| self.cells.get(cell))
            .flatten()
            .copied()
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }
}

/// Larger side of the box around a set of segments.
fn extent(segments: &[(Point2, Point2)]) -> f64 {
    let mut points = segments.iter().flat_map(|(a, b)| [a, b]);
    let Some(first) = points.next() else {
        return 0.0;
    };
    let (mut min, mut max) = (*first, *first);
    for p in points {
        min = Point2::new(min.x.min(p.x), min.y.min(p.y));
        max = Point2::new(max.x.max(p.x), max.y.max(p.y));
    }
    (max.x - min.x).max(max.y - min.y)
}

/// Union-find with path compression and union by rank.
#[derive(Debug, Clone)]
pub struct DisjointSets {
    parent: Vec<usize>,
    rank: Vec<usize>,
}

impl DisjointSets {
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    pub fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            let root = self.find(self.parent[x]);
            self.parent[x] = root;
        }
        self.parent[x]
    }

    /// Join the sets of `x` and `y`; false when already joined.
    pub fn union(&mut self, x: usize, y: usize) -> bool {
        let rx = self.find(x);
        let ry = self.find(y);
        if rx == ry {
            return false;
        }
        match self.rank[rx].cmp(&self.rank[ry]) {
            std::cmp::Ordering::Less => self.parent[rx] = ry,
            std::cmp::Ordering::Greater => self.parent[ry] = rx,
            std::cmp::Ordering::Equal => {
                self.parent[ry] = rx;
                self.rank[rx] += 1;
            }
        }
        true
    }

    /// Members of each set, sets ordered by their smallest member.
    pub fn groups(&mut self) -> Vec<Vec<usize>> {
        let mut slot: FxHashMap<usize, usize> = FxHashMap::default();
        let mut groups: Vec<Vec<usize>> = Vec::new();
        for i in 0..self.parent.len() {
            let root = self.find(i);
            let index = *slot.entry(root).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[index].push(i);
        }
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_grid_snaps_within_tolerance() {
        let mut grid = PointGrid::new(0.5);
        let a = grid.snap(Point2::new(0.0, 0.0));
        let b = grid.snap(Point2::new(0.3, 0.2));
        let c = grid.snap(Point2::new(2.0, 0.0));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(grid.len(), 2);
        assert_eq!(grid.point(a), Point2::new(0.0, 0.0));
        assert_eq!(grid.find(&Point2::new(2.4, 0.0)), Some(c));
        assert_eq!(grid.find(&Point2::new(5.0, 5.0)), None);
    }

    #[test]
    fn test_point_grid_across_cell_border() {
        let mut grid = PointGrid::new(1.0);
        let a = grid.snap(Point2::new(0.99, 0.0));
        assert_eq!(grid.snap(Point2::new(1.01, 0.0)), a);
        assert_eq!(grid.snap(Point2::new(-0.001, 0.0)), a);
    }

    #[test]
    fn test_segment_grid_neighbours() {
        let segments = vec![
            (Point2::new(0.0, 0.0), Point2::new(100.0, 0.0)),
            (Point2::new(0.0, 3.0), Point2::new(100.0, 3.0)),
            (Point2::new(0.0, 500.0), Point2::new(100.0, 500.0)),
        ];
        let grid = SegmentGrid::build(&segments, 10.0);
        let near = grid.near(&segments[0].0, &segments[0].1, 5.0);
        assert_eq!(near, vec![0, 1]);
    }

    #[test]
    fn test_segment_grid_long_diagonal_stays_sparse() {
        let segments = vec![
            (Point2::new(0.0, 0.0), Point2::new(1000.0, 1000.0)),
            (Point2::new(0.0, 0.5), Point2::new(1000.0, 1000.5)),
            (Point2::new(0.0, 900.0), Point2::new(100.0, 1000.0)),
        ];
        let grid = SegmentGrid::build(&segments, 0.001);
        assert!(grid.cells.len() < 100_000, "{} cells", grid.cells.len());
        assert_eq!(grid.near(&segments[0].0, &segments[0].1, 0.5), vec![0, 1]);
    }

    #[test]
    fn test_disjoint_sets_groups() {
        let mut sets = DisjointSets::new(5);
        assert!(sets.union(3, 1));
        assert!(sets.union(4, 0));
        assert!(!sets.union(1, 3));
        assert_eq!(sets.groups(), vec![vec![0, 4], vec![1, 3], vec![2]]);
    }
}
