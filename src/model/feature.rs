//! Architectural features recognised on a plan page.

use super::Point2;
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// How a scale factor was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleConfidence {
    /// Measured from a dimension annotation or given by the caller
    Declared,
    /// Read from a drawing-scale note such as "SCALE 1:100"
    Inferred,
    /// Configured fallback
    Default,
}

impl ScaleConfidence {
    /// Lower is better.
    pub fn rank(&self) -> u8 {
        match self {
            ScaleConfidence::Declared => 0,
            ScaleConfidence::Inferred => 1,
            ScaleConfidence::Default => 2,
        }
    }
}

impl std::fmt::Display for ScaleConfidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ScaleConfidence::Declared => "declared",
            ScaleConfidence::Inferred => "inferred",
            ScaleConfidence::Default => "default",
        };
        f.write_str(name)
    }
}

/// Conversion from page units to millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleFactor {
    /// Millimetres per page unit
    pub ratio: f64,
    pub confidence: ScaleConfidence,
}

impl ScaleFactor {
    pub fn new(ratio: f64, confidence: ScaleConfidence) -> Self {
        Self { ratio, confidence }
    }

    /// Page length to millimetres.
    pub fn to_mm(&self, page_length: f64) -> f64 {
        page_length * self.ratio
    }

    /// Millimetres to page length.
    pub fn to_page(&self, mm: f64) -> f64 {
        mm / self.ratio
    }

    pub fn point_to_mm(&self, p: Point2) -> Point2 {
        p.scaled(self.ratio)
    }
}

/// A straight wall on a plan.
///
/// The centerline runs from `start` to `end` in page units. Invariants:
/// `thickness > 0` and the endpoints are distinct.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WallSegment {
    pub start: Point2,
    pub end: Point2,
    /// Thickness in page units
    pub thickness: f64,
    pub floor_index: usize,
}

impl WallSegment {
    pub fn new(start: Point2, end: Point2, thickness: f64) -> Self {
        Self {
            start,
            end,
            thickness,
            floor_index: 0,
        }
    }

    pub fn length(&self) -> f64 {
        self.start.distance_to(&self.end)
    }

    /// Unit vector from start to end (zero for a collapsed wall).
    pub fn direction(&self) -> Vector2<f64> {
        let d = self.end.to_vector() - self.start.to_vector();
        let len = d.norm();
        if len < f64::EPSILON {
            Vector2::zeros()
        } else {
            d / len
        }
    }

    /// Point at parameter `t` along the centerline.
    pub fn point_at(&self, t: f64) -> Point2 {
        self.start.lerp(&self.end, t)
    }

    /// Whether the invariants hold.
    pub fn is_valid(&self) -> bool {
        self.thickness > 0.0 && self.length() > f64::EPSILON
    }
}

/// Kind of opening.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpeningKind {
    Door,
    Window,
    #[default]
    Unknown,
}

/// A door or window cut into exactly one wall.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Opening {
    /// Index of the host wall
    pub wall: usize,
    /// Centre of the opening as a parameter along the wall, in [0, 1]
    pub position: f64,
    /// Width in page units (never more than the wall length)
    pub width: f64,
    pub kind: OpeningKind,
}

impl Opening {
    /// Start and end distances from the wall start, clamped to the wall.
    pub fn span_on(&self, wall_length: f64) -> (f64, f64) {
        let center = self.position * wall_length;
        let half = self.width.min(wall_length) / 2.0;
        let lo = (center - half).max(0.0);
        let hi = (center + half).min(wall_length);
        (lo, hi)
    }
}

/// A closed polygon of walls enclosing a room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomBoundary {
    /// Wall indices in traversal order
    pub walls: Vec<usize>,
    /// Closed vertex ring (first == last), counter-clockwise, page units
    pub vertices: Vec<Point2>,
    /// Floor area in square millimetres
    pub area_mm2: f64,
    /// Room name found inside the polygon
    pub label: Option<String>,
}

impl RoomBoundary {
    /// Whether the ring closes within `epsilon`.
    pub fn is_closed(&self, epsilon: f64) -> bool {
        match (self.vertices.first(), self.vertices.last()) {
            (Some(first), Some(last)) => {
                self.walls.len() >= 3
                    && self.vertices.len() >= 4
                    && first.distance_to(last) <= epsilon
            }
            _ => false,
        }
    }

    /// Signed shoelace area of the ring (positive when counter-clockwise).
    pub fn signed_area(&self) -> f64 {
        signed_area(&self.vertices)
    }

    /// Ring without the closing duplicate vertex.
    pub fn open_ring(&self) -> &[Point2] {
        match self.vertices.len() {
            0 => &self.vertices,
            n => &self.vertices[..n - 1],
        }
    }
}

/// Shoelace area of a ring; the closing vertex may or may not be repeated.
pub fn signed_area(ring: &[Point2]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..ring.len() {
        let a = ring[i];
        let b = ring[(i + 1) % ring.len()];
        sum += a.x * b.y - b.x * a.y;
    }
    sum / 2.0
}

/// Everything the feature extractor found on one plan page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageFeatures {
    pub page: usize,
    pub walls: Vec<WallSegment>,
    pub openings: Vec<Opening>,
    pub rooms: Vec<RoomBoundary>,
}
