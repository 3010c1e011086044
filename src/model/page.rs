//! Page-level types produced by the decoder.

use super::Point2;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    /// `NORTH ELEVATION`, `Section B-B`; not `intersection`
    static ref RE_VIEW_TITLE: Regex = Regex::new(r"(?i)\b(?:elevations?|sections?)\b").unwrap();
}

/// An atomic drawing element read from a page, in page units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PagePrimitive {
    /// A straight painted edge
    LineSegment {
        p0: Point2,
        p1: Point2,
        stroke_width: f64,
    },

    /// An axis-aligned rectangle (`re` under an unrotated CTM)
    Rectangle { min: Point2, max: Point2 },

    /// A positioned run of text
    TextRun {
        text: String,
        origin: Point2,
        font_size: f64,
    },
}

impl PagePrimitive {
    /// Whether the primitive carries line geometry rather than text.
    pub fn is_geometry(&self) -> bool {
        !matches!(self, PagePrimitive::TextRun { .. })
    }

    /// Straight edges of the primitive: the segment itself or the four
    /// sides of a rectangle.
    pub fn edges(&self) -> Vec<(Point2, Point2)> {
        match self {
            PagePrimitive::LineSegment { p0, p1, .. } => vec![(*p0, *p1)],
            PagePrimitive::Rectangle { min, max } => {
                let a = *min;
                let b = Point2::new(max.x, min.y);
                let c = *max;
                let d = Point2::new(min.x, max.y);
                vec![(a, b), (b, c), (c, d), (d, a)]
            }
            PagePrimitive::TextRun { .. } => Vec::new(),
        }
    }
}

/// Borrowed view of a text run.
#[derive(Debug, Clone, Copy)]
pub struct TextSpan<'a> {
    pub text: &'a str,
    pub origin: Point2,
    pub font_size: f64,
}

impl TextSpan<'_> {
    /// Approximate centre of the rendered run.
    pub fn center(&self) -> Point2 {
        let width = self.text.chars().count() as f64 * self.font_size * 0.5;
        Point2::new(
            self.origin.x + width / 2.0,
            self.origin.y + self.font_size * 0.3,
        )
    }
}

/// One decoded page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecodedPage {
    /// Page index (0-based, document order)
    pub index: usize,

    /// Page width in page units
    pub width: f64,

    /// Page height in page units
    pub height: f64,

    /// `/UserUnit` of the page (1.0 = 1/72 inch)
    pub user_unit: f64,

    /// Primitives in content-stream order
    pub primitives: Vec<PagePrimitive>,

    /// Number of raster images painted on the page
    pub image_count: usize,
}

impl DecodedPage {
    /// Create an empty page with the given dimensions.
    pub fn new(index: usize, width: f64, height: f64) -> Self {
        Self {
            index,
            width,
            height,
            user_unit: 1.0,
            primitives: Vec::new(),
            image_count: 0,
        }
    }

    /// Text runs in content order.
    pub fn texts(&self) -> impl Iterator<Item = TextSpan<'_>> {
        self.primitives.iter().filter_map(|p| match p {
            PagePrimitive::TextRun {
                text,
                origin,
                font_size,
            } => Some(TextSpan {
                text,
                origin: *origin,
                font_size: *font_size,
            }),
            _ => None,
        })
    }

    /// Straight edges of every geometric primitive.
    pub fn edges(&self) -> Vec<(Point2, Point2)> {
        self.primitives.iter().flat_map(|p| p.edges()).collect()
    }

    /// Number of geometric (non-text) primitives.
    pub fn geometry_count(&self) -> usize {
        self.primitives.iter().filter(|p| p.is_geometry()).count()
    }

    /// Whether the page has anything the pipeline can read.
    pub fn has_vector_content(&self) -> bool {
        !self.primitives.is_empty()
    }

    /// All text joined with spaces.
    pub fn plain_text(&self) -> String {
        self.texts()
            .map(|t| t.text)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// How a page takes part in the conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageRole {
    /// Floor plan: source of walls, openings and rooms
    Plan,
    /// Elevation or section view: source of height hints only
    Elevation,
}

impl PageRole {
    /// Role suggested by the page's annotation text alone.
    ///
    /// Section cut markers on a plan also read as a view title here;
    /// [`crate::Converter::page_roles`] checks the line work before an
    /// elevation title is trusted.
    pub fn classify(page: &DecodedPage) -> Self {
        if page.texts().any(|t| RE_VIEW_TITLE.is_match(t.text)) {
            PageRole::Elevation
        } else {
            PageRole::Plan
        }
    }
}
