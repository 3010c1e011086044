//! Points, bounding boxes and length units shared by every stage.

use nalgebra::{Vector2, Vector3};
use serde::{Deserialize, Serialize};

/// A point on a page or plan (page units until scaled, millimetres after).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Point2) -> f64 {
        (self.to_vector() - other.to_vector()).norm()
    }

    pub fn midpoint(&self, other: &Point2) -> Point2 {
        Point2::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    /// Point at parameter `t` on the segment from `self` to `other`.
    pub fn lerp(&self, other: &Point2, t: f64) -> Point2 {
        Point2::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }

    pub fn scaled(&self, factor: f64) -> Point2 {
        Point2::new(self.x * factor, self.y * factor)
    }

    pub fn to_vector(&self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }

    pub fn from_vector(v: Vector2<f64>) -> Self {
        Self::new(v.x, v.y)
    }

    /// Distance to the closed segment `a`-`b`.
    pub fn distance_to_segment(&self, a: &Point2, b: &Point2) -> f64 {
        let ab = b.to_vector() - a.to_vector();
        let len2 = ab.norm_squared();
        if len2 < f64::EPSILON {
            return self.distance_to(a);
        }
        let t = ((self.to_vector() - a.to_vector()).dot(&ab) / len2).clamp(0.0, 1.0);
        self.distance_to(&a.lerp(b, t))
    }
}

/// A vertex of the 3D model. Z is up.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Lift a plan point to the given height.
    pub fn from_plan(p: Point2, z: f64) -> Self {
        Self::new(p.x, p.y, z)
    }

    pub fn to_vector(&self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }
}

/// Axis-aligned bounding box of a mesh or model.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point3,
    pub max: Point3,
}

impl BoundingBox {
    /// Box around a single point.
    pub fn around(p: Point3) -> Self {
        Self { min: p, max: p }
    }

    /// Smallest box containing every point, or `None` for an empty set.
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point3>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bbox = Self::around(*first);
        for p in iter {
            bbox.expand(p);
        }
        Some(bbox)
    }

    pub fn expand(&mut self, p: &Point3) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    pub fn merge(&self, other: &BoundingBox) -> BoundingBox {
        let mut merged = *self;
        merged.expand(&other.min);
        merged.expand(&other.max);
        merged
    }

    /// Extent along each axis.
    pub fn size(&self) -> Point3 {
        Point3::new(
            self.max.x - self.min.x,
            self.max.y - self.min.y,
            self.max.z - self.min.z,
        )
    }
}

/// Length unit of a mesh or an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthUnit {
    #[default]
    Millimetre,
    Centimetre,
    Metre,
    Foot,
    Inch,
}

impl LengthUnit {
    /// Millimetres in one unit.
    pub fn mm_per_unit(&self) -> f64 {
        match self {
            LengthUnit::Millimetre => 1.0,
            LengthUnit::Centimetre => 10.0,
            LengthUnit::Metre => 1000.0,
            LengthUnit::Foot => 304.8,
            LengthUnit::Inch => 25.4,
        }
    }

    /// Convert a value in this unit to `target`.
    pub fn convert(&self, value: f64, target: LengthUnit) -> f64 {
        value * self.mm_per_unit() / target.mm_per_unit()
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            LengthUnit::Millimetre => "mm",
            LengthUnit::Centimetre => "cm",
            LengthUnit::Metre => "m",
            LengthUnit::Foot => "ft",
            LengthUnit::Inch => "in",
        }
    }
}

impl std::fmt::Display for LengthUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}
