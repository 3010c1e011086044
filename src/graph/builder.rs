//! Assembling per-floor wall graphs from page features.

use std::collections::{BTreeMap, BTreeSet};

use crate::extract::{DisjointSets, PointGrid};
use crate::model::{
    FloorGraph, GraphEdge, HeightSource, Opening, PageFeatures, RoomBoundary, ScaleFactor,
};
use crate::options::ConvertOptions;
use crate::warning::ConversionWarning;

/// Placement of a floor in the stack.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloorPlacement {
    pub floor_index: usize,
    /// Millimetres above floor 0
    pub elevation_offset: f64,
    /// Millimetres
    pub wall_height: f64,
    pub height_source: HeightSource,
}

/// Builds a [`FloorGraph`] from the features of the pages on one floor.
pub struct FloorGraphBuilder {
    epsilon: f64,
    ratio: f64,
}

impl FloorGraphBuilder {
    pub fn new(options: &ConvertOptions, scale: ScaleFactor) -> Self {
        Self {
            epsilon: scale.to_page(options.tolerance_epsilon_mm),
            ratio: scale.ratio,
        }
    }

    /// Snap, validate and merge `pages` into one floor graph.
    ///
    /// Problems are reported as warnings; building never fails. Walls,
    /// openings and rooms are numbered across pages in page order.
    pub fn build(
        &self,
        placement: FloorPlacement,
        pages: &[&PageFeatures],
    ) -> (FloorGraph, Vec<ConversionWarning>) {
        let floor = placement.floor_index;
        let mut warnings = Vec::new();
        let mut grid = PointGrid::new(self.epsilon);
        let mut edges: Vec<GraphEdge> = Vec::new();
        let mut openings: Vec<Opening> = Vec::new();
        let mut rooms: Vec<RoomBoundary> = Vec::new();
        let mut wall_number = 0;
        let mut room_number = 0;

        for features in pages {
            // page-local wall index -> edge index
            let mut edge_of: Vec<Option<usize>> = Vec::with_capacity(features.walls.len());
            for wall in &features.walls {
                let from = grid.snap(wall.start);
                let to = grid.snap(wall.end);
                if from == to {
                    warnings.push(ConversionWarning::DegenerateGeometry {
                        floor,
                        wall: wall_number,
                        length_mm: wall.length() * self.ratio,
                    });
                    edge_of.push(None);
                } else {
                    let mut wall = *wall;
                    wall.start = grid.point(from);
                    wall.end = grid.point(to);
                    wall.floor_index = floor;
                    edge_of.push(Some(edges.len()));
                    edges.push(GraphEdge { wall, from, to });
                }
                wall_number += 1;
            }

            for opening in &features.openings {
                if let Some(Some(edge)) = edge_of.get(opening.wall) {
                    openings.push(Opening {
                        wall: *edge,
                        ..*opening
                    });
                }
            }

            for room in &features.rooms {
                let walls: Option<Vec<usize>> = room
                    .walls
                    .iter()
                    .map(|&w| edge_of.get(w).copied().flatten())
                    .collect();
                match walls {
                    Some(walls) if room.is_closed(self.epsilon) => rooms.push(RoomBoundary {
                        walls,
                        ..room.clone()
                    }),
                    _ => warnings.push(ConversionWarning::UnclosedRoom {
                        floor,
                        room: room_number,
                    }),
                }
                room_number += 1;
            }
        }

        let vertices = grid.into_points();
        let mut graph = FloorGraph {
            floor_index: floor,
            elevation_offset: placement.elevation_offset,
            wall_height: placement.wall_height,
            height_source: placement.height_source,
            pages: pages.iter().map(|p| p.page).collect(),
            vertices,
            edges,
            openings,
            rooms,
            components: 0,
        };

        let degrees = graph.degrees();
        for (i, edge) in graph.edges.iter().enumerate() {
            if degrees[edge.from] == 1 || degrees[edge.to] == 1 {
                warnings.push(ConversionWarning::DanglingWall { floor, wall: i });
            }
        }

        graph.components = count_components(&graph);
        if graph.components > 1 {
            warnings.push(ConversionWarning::DisconnectedGraph {
                floor,
                components: graph.components,
            });
        }

        log::debug!(
            "Floor {}: {} vertices, {} edges, {} openings, {} rooms, {} components",
            floor,
            graph.vertices.len(),
            graph.edges.len(),
            graph.openings.len(),
            graph.rooms.len(),
            graph.components
        );
        (graph, warnings)
    }
}

fn count_components(graph: &FloorGraph) -> usize {
    let mut sets = DisjointSets::new(graph.vertices.len());
    let mut used = vec![false; graph.vertices.len()];
    for edge in &graph.edges {
        sets.union(edge.from, edge.to);
        used[edge.from] = true;
        used[edge.to] = true;
    }
    let roots: BTreeSet<usize> = (0..graph.vertices.len())
        .filter(|&v| used[v])
        .map(|v| sets.find(v))
        .collect();
    roots.len()
}

/// Assign plan pages to floors.
///
/// Pages listed in `page_floors` go where they are told; the others take
/// the next free floor index in page order. Returns floor → pages.
pub fn assign_floors(
    plan_pages: &[usize],
    page_floors: &BTreeMap<usize, usize>,
) -> BTreeMap<usize, Vec<usize>> {
    let mut taken: BTreeSet<usize> = plan_pages
        .iter()
        .filter_map(|p| page_floors.get(p).copied())
        .collect();
    let mut next = 0;
    let mut floors: BTreeMap<usize, Vec<usize>> = BTreeMap::new();

    for &page in plan_pages {
        let floor = match page_floors.get(&page) {
            Some(&floor) => floor,
            None => {
                while taken.contains(&next) {
                    next += 1;
                }
                taken.insert(next);
                next
            }
        };
        floors.entry(floor).or_default().push(page);
    }
    floors
}

/// Elevation of each floor: the sum of `height + slab` over the floors
/// below it.
pub fn elevation_offsets(heights: &BTreeMap<usize, f64>, slab_thickness_mm: f64) -> BTreeMap<usize, f64> {
    let mut offsets = BTreeMap::new();
    let mut level = 0.0;
    for (&floor, &height) in heights {
        offsets.insert(floor, level);
        level += height + slab_thickness_mm;
    }
    offsets
}
