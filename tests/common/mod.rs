//! Small plan-set PDFs built with lopdf.
//!
//! Rooms are laid out in millimetres and placed at a chosen number of
//! millimetres per page unit. Plan pages carry a 4000 mm dimension over a
//! 400 unit line, so they resolve to 10 mm per unit.

#![allow(dead_code)]

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

/// Lower-left corner of the room on the page.
pub const ORIGIN: i64 = 100;

/// Millimetres per point at a 1:100 drawing scale.
pub const MM_PER_UNIT_1_100: f64 = 100.0 * 25.4 / 72.0;

/// Content of one page.
#[derive(Default)]
pub struct PageSpec {
    ops: Vec<Operation>,
}

fn int(v: i64) -> Object {
    Object::Integer(v)
}

fn num(v: f64) -> Object {
    if v.fract() == 0.0 {
        Object::Integer(v as i64)
    } else {
        Object::Real(v as _)
    }
}

impl PageSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stroke an open polyline.
    pub fn polyline(mut self, points: &[(i64, i64)]) -> Self {
        let Some((&(x, y), rest)) = points.split_first() else {
            return self;
        };
        self.ops.push(Operation::new("m", vec![int(x), int(y)]));
        for &(x, y) in rest {
            self.ops.push(Operation::new("l", vec![int(x), int(y)]));
        }
        self.ops.push(Operation::new("S", vec![]));
        self
    }

    /// Stroke a polyline given in millimetres from [`ORIGIN`].
    pub fn polyline_mm(mut self, points: &[(f64, f64)], mm_per_unit: f64) -> Self {
        let at = |mm: f64| ORIGIN as f64 + mm / mm_per_unit;
        let Some((&(x, y), rest)) = points.split_first() else {
            return self;
        };
        self.ops.push(Operation::new("m", vec![num(at(x)), num(at(y))]));
        for &(x, y) in rest {
            self.ops.push(Operation::new("l", vec![num(at(x)), num(at(y))]));
        }
        self.ops.push(Operation::new("S", vec![]));
        self
    }

    /// Place text at millimetres from [`ORIGIN`].
    pub fn text_mm(self, s: &str, x: f64, y: f64, mm_per_unit: f64) -> Self {
        let at = |mm: f64| ORIGIN + (mm / mm_per_unit).round() as i64;
        self.text(s, at(x), at(y), 8)
    }

    pub fn line(self, x0: i64, y0: i64, x1: i64, y1: i64) -> Self {
        self.polyline(&[(x0, y0), (x1, y1)])
    }

    pub fn text(mut self, s: &str, x: i64, y: i64, size: i64) -> Self {
        self.ops.push(Operation::new("BT", vec![]));
        self.ops
            .push(Operation::new("Tf", vec!["F1".into(), int(size)]));
        self.ops.push(Operation::new("Td", vec![int(x), int(y)]));
        self.ops
            .push(Operation::new("Tj", vec![Object::string_literal(s)]));
        self.ops.push(Operation::new("ET", vec![]));
        self
    }

    /// Paint the shared 1x1 raster image.
    pub fn image(mut self) -> Self {
        self.ops.push(Operation::new("q", vec![]));
        self.ops.push(Operation::new(
            "cm",
            vec![int(200), int(0), int(0), int(200), int(50), int(50)],
        ));
        self.ops.push(Operation::new("Do", vec!["Im1".into()]));
        self.ops.push(Operation::new("Q", vec![]));
        self
    }

    /// The 4000 mm dimension under the room.
    pub fn dimension(self) -> Self {
        let o = ORIGIN;
        self.line(o, o - 80, o + 400, o - 80)
            .text("4000", o + 192, o - 76, 8)
    }

    /// A wall pair 80 mm long and 60 mm thick, away from the room.
    pub fn short_wall(self) -> Self {
        let o = ORIGIN;
        self.line(o + 600, o + 100, o + 608, o + 100)
            .line(o + 600, o + 106, o + 608, o + 106)
    }
}

/// A 4 x 3 m room (wall centerlines) with 100 mm walls and a 900 mm
/// door from 1000 to 1900 mm in the bottom wall.
pub fn room_mm(mm_per_unit: f64) -> PageSpec {
    PageSpec::new()
        .polyline_mm(
            &[
                (1900.0, -50.0),
                (4050.0, -50.0),
                (4050.0, 3050.0),
                (-50.0, 3050.0),
                (-50.0, -50.0),
                (1000.0, -50.0),
            ],
            mm_per_unit,
        )
        .polyline_mm(
            &[
                (1900.0, 50.0),
                (3950.0, 50.0),
                (3950.0, 2950.0),
                (50.0, 2950.0),
                (50.0, 50.0),
                (1000.0, 50.0),
            ],
            mm_per_unit,
        )
        .polyline_mm(&[(1000.0, -50.0), (1000.0, 50.0)], mm_per_unit)
        .polyline_mm(&[(1900.0, -50.0), (1900.0, 50.0)], mm_per_unit)
        .text_mm("DOOR", 1300.0, 300.0, mm_per_unit)
        .text_mm("LIVING", 1500.0, 1500.0, mm_per_unit)
}

/// The same room at 10 mm per unit, without any scale information.
pub fn bare_room_page() -> PageSpec {
    room_mm(10.0)
}

/// Room whose 900 mm door runs from the left wall's inner face to
/// x = 950 mm, with no wall stub beside the corner.
pub fn corner_door_page() -> PageSpec {
    let u = 10.0;
    PageSpec::new()
        .polyline_mm(
            &[
                (950.0, -50.0),
                (4050.0, -50.0),
                (4050.0, 3050.0),
                (-50.0, 3050.0),
                (-50.0, -50.0),
                (50.0, -50.0),
            ],
            u,
        )
        .polyline_mm(
            &[
                (950.0, 50.0),
                (3950.0, 50.0),
                (3950.0, 2950.0),
                (50.0, 2950.0),
                (50.0, -50.0),
            ],
            u,
        )
        .polyline_mm(&[(950.0, -50.0), (950.0, 50.0)], u)
        .text_mm("DOOR", 450.0, 300.0, u)
        .text_mm("LIVING", 1500.0, 1500.0, u)
        .dimension()
}

/// The room drawn at 1:100 on points, with only a scale note.
pub fn scale_note_page() -> PageSpec {
    room_mm(MM_PER_UNIT_1_100).text("SCALE 1:100", ORIGIN, ORIGIN - 40, 8)
}

/// [`bare_room_page`] with its dimension line.
pub fn room_page() -> PageSpec {
    bare_room_page().dimension()
}

/// Elevation with levels +0.000 and +3.000.
pub fn elevation_page() -> PageSpec {
    PageSpec::new()
        .line(100, 100, 500, 100)
        .line(100, 400, 500, 400)
        .text("NORTH ELEVATION", 100, 500, 12)
        .text("+0.000", 600, 100, 8)
        .text("+3.000", 600, 400, 8)
}

/// Page with nothing but a raster image.
pub fn scanned_page() -> PageSpec {
    PageSpec::new().image()
}

/// Assemble the pages into a PDF file.
pub fn build_pdf(pages: Vec<PageSpec>) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => 1,
            "Height" => 1,
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => 8,
        },
        vec![0u8],
    ));
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
        "XObject" => dictionary! { "Im1" => image_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for page in pages {
        let content = Content {
            operations: page.ops,
        };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().unwrap(),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
        "Resources" => resources_id,
        "MediaBox" => vec![int(0), int(0), int(1191), int(842)],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal("Test House"),
    });
    doc.trailer.set("Info", info_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}
