//! Per-floor wall graph.

use super::{Opening, Point2, RoomBoundary, WallSegment};
use serde::{Deserialize, Serialize};

/// A wall placed in the graph between two snapped vertices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub wall: WallSegment,
    pub from: usize,
    pub to: usize,
}

/// Where a floor's wall height came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "source")]
pub enum HeightSource {
    /// `default_wall_height_mm` from the options
    #[default]
    Configured,
    /// Level annotations on an elevation page
    Elevation { page: usize },
}

/// Storey height read from an elevation page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeightHint {
    pub wall_height_mm: f64,
    pub page: usize,
}

/// Connected wall layout of one floor.
///
/// Every edge endpoint is an entry of `vertices`; openings index into
/// `edges`. Coordinates are page units, heights millimetres.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FloorGraph {
    pub floor_index: usize,
    /// Height of the floor level above floor 0, in millimetres
    pub elevation_offset: f64,
    /// Wall height in millimetres
    pub wall_height: f64,
    pub height_source: HeightSource,
    /// Source pages merged into this floor
    pub pages: Vec<usize>,
    pub vertices: Vec<Point2>,
    pub edges: Vec<GraphEdge>,
    pub openings: Vec<Opening>,
    pub rooms: Vec<RoomBoundary>,
    /// Number of connected components
    pub components: usize,
}

impl FloorGraph {
    /// Walls in edge order.
    pub fn walls(&self) -> impl Iterator<Item = &WallSegment> {
        self.edges.iter().map(|e| &e.wall)
    }

    /// Openings hosted by the given edge.
    pub fn openings_on(&self, edge: usize) -> impl Iterator<Item = &Opening> {
        self.openings.iter().filter(move |o| o.wall == edge)
    }

    /// Number of edges touching each vertex.
    pub fn degrees(&self) -> Vec<usize> {
        let mut degrees = vec![0; self.vertices.len()];
        for edge in &self.edges {
            degrees[edge.from] += 1;
            degrees[edge.to] += 1;
        }
        degrees
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::OpeningKind;

    #[test]
    fn test_degrees_and_openings() {
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(10.0, 0.0);
        let c = Point2::new(10.0, 10.0);
        let graph = FloorGraph {
            vertices: vec![a, b, c],
            edges: vec![
                GraphEdge {
                    wall: WallSegment::new(a, b, 1.0),
                    from: 0,
                    to: 1,
                },
                GraphEdge {
                    wall: WallSegment::new(b, c, 1.0),
                    from: 1,
                    to: 2,
                },
            ],
            openings: vec![Opening {
                wall: 1,
                position: 0.5,
                width: 3.0,
                kind: OpeningKind::Window,
            }],
            ..Default::default()
        };

        assert_eq!(graph.degrees(), vec![1, 2, 1]);
        assert_eq!(graph.openings_on(1).count(), 1);
        assert_eq!(graph.openings_on(0).count(), 0);
        assert_eq!(graph.walls().count(), 2);
    }
}
