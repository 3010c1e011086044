//! Content stream interpreter.
//!
//! Walks the operators of a page, tracking the graphics and text state, and
//! turns painted paths and shown text into [`PagePrimitive`]s. Coordinates
//! come out in page units: user space mapped through the CTM, scaled by
//! `/UserUnit`.

use unicode_normalization::UnicodeNormalization;

use super::backend::{ContentOp, PageId, PdfBackend, PdfValue, XObject};
use crate::error::Result;
use crate::model::{PagePrimitive, Point2};

/// Nesting limit for form XObjects.
const MAX_FORM_DEPTH: usize = 8;

/// Segments shorter than this are dropped.
const MIN_SEGMENT_LENGTH: f64 = 1e-6;

/// 2D affine transform `[a b c d e f]` in PDF convention.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for Matrix {
    fn default() -> Self {
        Self::identity()
    }
}

impl Matrix {
    pub fn identity() -> Self {
        Self::new([1.0, 0.0, 0.0, 1.0, 0.0, 0.0])
    }

    pub fn new(m: [f64; 6]) -> Self {
        Self {
            a: m[0],
            b: m[1],
            c: m[2],
            d: m[3],
            e: m[4],
            f: m[5],
        }
    }

    pub fn scale(s: f64) -> Self {
        Self::new([s, 0.0, 0.0, s, 0.0, 0.0])
    }

    pub fn translation(tx: f64, ty: f64) -> Self {
        Self::new([1.0, 0.0, 0.0, 1.0, tx, ty])
    }

    /// `self` applied first, then `other`.
    pub fn then(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    pub fn apply(&self, x: f64, y: f64) -> Point2 {
        Point2::new(
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    /// Uniform scale estimate (square root of the determinant).
    pub fn scale_factor(&self) -> f64 {
        (self.a * self.d - self.b * self.c).abs().sqrt()
    }

    /// Whether the transform keeps axis-aligned rectangles axis-aligned.
    pub fn is_axis_aligned(&self) -> bool {
        (self.b.abs() < 1e-9 && self.c.abs() < 1e-9) || (self.a.abs() < 1e-9 && self.d.abs() < 1e-9)
    }
}

#[derive(Debug, Clone, Copy)]
struct GraphicsState {
    ctm: Matrix,
    line_width: f64,
}

#[derive(Debug, Clone)]
struct TextState {
    font: Vec<u8>,
    font_size: f64,
    leading: f64,
    matrix: Matrix,
    line_matrix: Matrix,
    /// A run is open until the text position changes.
    run_open: bool,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font: Vec::new(),
            font_size: 12.0,
            leading: 0.0,
            matrix: Matrix::identity(),
            line_matrix: Matrix::identity(),
            run_open: false,
        }
    }
}

impl TextState {
    fn move_line(&mut self, tx: f64, ty: f64) {
        self.line_matrix = Matrix::translation(tx, ty).then(&self.line_matrix);
        self.matrix = self.line_matrix;
        self.run_open = false;
    }

    fn next_line(&mut self) {
        let leading = self.leading;
        self.move_line(0.0, -leading);
    }
}

/// Path under construction, already in page units.
#[derive(Debug, Default)]
struct PathBuilder {
    segments: Vec<(Point2, Point2)>,
    rects: Vec<(Point2, Point2)>,
    current: Option<Point2>,
    subpath_start: Option<Point2>,
}

impl PathBuilder {
    fn move_to(&mut self, p: Point2) {
        self.current = Some(p);
        self.subpath_start = Some(p);
    }

    fn line_to(&mut self, p: Point2) {
        if let Some(from) = self.current {
            self.segments.push((from, p));
        }
        self.current = Some(p);
        if self.subpath_start.is_none() {
            self.subpath_start = Some(p);
        }
    }

    fn close(&mut self) {
        if let (Some(current), Some(start)) = (self.current, self.subpath_start) {
            if current.distance_to(&start) > MIN_SEGMENT_LENGTH {
                self.segments.push((current, start));
            }
            self.current = Some(start);
        }
    }

    fn clear(&mut self) {
        *self = PathBuilder::default();
    }
}

/// Interprets the content of one page.
pub struct ContentInterpreter<'a, B: PdfBackend> {
    backend: &'a B,
    page: PageId,
    state: GraphicsState,
    stack: Vec<GraphicsState>,
    text: TextState,
    path: PathBuilder,
    primitives: Vec<PagePrimitive>,
    image_count: usize,
}

impl<'a, B: PdfBackend> ContentInterpreter<'a, B> {
    /// Create an interpreter for `page` with `/UserUnit` applied.
    pub fn new(backend: &'a B, page: PageId, user_unit: f64) -> Self {
        Self {
            backend,
            page,
            state: GraphicsState {
                ctm: Matrix::scale(user_unit),
                line_width: 1.0,
            },
            stack: Vec::new(),
            text: TextState::default(),
            path: PathBuilder::default(),
            primitives: Vec::new(),
            image_count: 0,
        }
    }

    /// Run the page's content stream.
    pub fn run(mut self) -> Result<(Vec<PagePrimitive>, usize)> {
        let data = self.backend.page_content(self.page)?;
        let ops = self.backend.decode_content(&data)?;
        self.execute(&ops, 0);
        Ok((self.primitives, self.image_count))
    }

    fn execute(&mut self, ops: &[ContentOp], depth: usize) {
        for op in ops {
            self.step(op, depth);
        }
    }

    fn point(&self, x: f64, y: f64) -> Point2 {
        self.state.ctm.apply(x, y)
    }

    fn step(&mut self, op: &ContentOp, depth: usize) {
        match op.operator.as_str() {
            // Graphics state
            "q" => self.stack.push(self.state),
            "Q" => {
                if let Some(state) = self.stack.pop() {
                    self.state = state;
                }
            }
            "cm" => {
                if let Some(m) = op.numbers::<6>() {
                    self.state.ctm = Matrix::new(m).then(&self.state.ctm);
                }
            }
            "w" => {
                if let Some([w]) = op.numbers::<1>() {
                    self.state.line_width = w;
                }
            }

            // Path construction
            "m" => {
                if let Some([x, y]) = op.numbers::<2>() {
                    let p = self.point(x, y);
                    self.path.move_to(p);
                }
            }
            "l" => {
                if let Some([x, y]) = op.numbers::<2>() {
                    let p = self.point(x, y);
                    self.path.line_to(p);
                }
            }
            "c" => {
                // Curves are not part of the plan geometry; only the
                // current point moves.
                if let Some([_, _, _, _, x, y]) = op.numbers::<6>() {
                    let p = self.point(x, y);
                    self.path.current = Some(p);
                }
            }
            "v" | "y" => {
                if let Some([_, _, x, y]) = op.numbers::<4>() {
                    let p = self.point(x, y);
                    self.path.current = Some(p);
                }
            }
            "re" => {
                if let Some([x, y, w, h]) = op.numbers::<4>() {
                    self.rectangle(x, y, w, h);
                }
            }
            "h" => self.path.close(),

            // Path painting
            "S" => self.paint(false),
            "s" | "f" | "F" | "f*" | "B" | "B*" | "b" | "b*" => self.paint(true),
            "n" => self.path.clear(),

            // Text
            "BT" => {
                self.text.matrix = Matrix::identity();
                self.text.line_matrix = Matrix::identity();
                self.text.run_open = false;
            }
            "ET" => self.text.run_open = false,
            "Tf" => {
                if let Some(PdfValue::Name(name)) = op.operands.first() {
                    self.text.font = name.clone();
                }
                if let Some(size) = op.operands.get(1).and_then(PdfValue::as_number) {
                    self.text.font_size = size;
                }
            }
            "TL" => {
                if let Some([tl]) = op.numbers::<1>() {
                    self.text.leading = tl;
                }
            }
            "Td" => {
                if let Some([tx, ty]) = op.numbers::<2>() {
                    self.text.move_line(tx, ty);
                }
            }
            "TD" => {
                if let Some([tx, ty]) = op.numbers::<2>() {
                    self.text.leading = -ty;
                    self.text.move_line(tx, ty);
                }
            }
            "Tm" => {
                if let Some(m) = op.numbers::<6>() {
                    self.text.line_matrix = Matrix::new(m);
                    self.text.matrix = self.text.line_matrix;
                    self.text.run_open = false;
                }
            }
            "T*" => self.text.next_line(),
            "Tj" => {
                if let Some(PdfValue::Str(bytes)) = op.operands.first() {
                    let text = self.decode(bytes);
                    self.show_text(text);
                }
            }
            "TJ" => {
                if let Some(PdfValue::Array(items)) = op.operands.first() {
                    let mut combined = String::new();
                    for item in items {
                        match item {
                            PdfValue::Str(bytes) => combined.push_str(&self.decode(bytes)),
                            // Large negative adjustments are word gaps.
                            other => {
                                if other.as_number().is_some_and(|n| n < -200.0)
                                    && !combined.ends_with(' ')
                                {
                                    combined.push(' ');
                                }
                            }
                        }
                    }
                    self.show_text(combined);
                }
            }
            "'" | "\"" => {
                self.text.next_line();
                let index = if op.operator == "\"" { 2 } else { 0 };
                if let Some(PdfValue::Str(bytes)) = op.operands.get(index) {
                    let text = self.decode(bytes);
                    self.show_text(text);
                }
            }

            // External objects
            "Do" => {
                if let Some(PdfValue::Name(name)) = op.operands.first() {
                    self.paint_xobject(name, depth);
                }
            }
            _ => {}
        }
    }

    fn rectangle(&mut self, x: f64, y: f64, w: f64, h: f64) {
        let ctm = self.state.ctm;
        let corners = [
            ctm.apply(x, y),
            ctm.apply(x + w, y),
            ctm.apply(x + w, y + h),
            ctm.apply(x, y + h),
        ];
        if ctm.is_axis_aligned() {
            let (a, c) = (corners[0], corners[2]);
            self.path.rects.push((
                Point2::new(a.x.min(c.x), a.y.min(c.y)),
                Point2::new(a.x.max(c.x), a.y.max(c.y)),
            ));
        } else {
            for i in 0..4 {
                self.path.segments.push((corners[i], corners[(i + 1) % 4]));
            }
        }
        self.path.move_to(corners[0]);
    }

    fn paint(&mut self, close: bool) {
        if close {
            self.path.close();
        }
        let stroke_width = self.state.line_width * self.state.ctm.scale_factor();
        let path = std::mem::take(&mut self.path);

        for (min, max) in path.rects {
            if max.x - min.x > MIN_SEGMENT_LENGTH || max.y - min.y > MIN_SEGMENT_LENGTH {
                self.primitives.push(PagePrimitive::Rectangle { min, max });
            }
        }
        for (p0, p1) in path.segments {
            if p0.distance_to(&p1) > MIN_SEGMENT_LENGTH {
                self.primitives.push(PagePrimitive::LineSegment {
                    p0,
                    p1,
                    stroke_width,
                });
            }
        }
    }

    fn decode(&self, bytes: &[u8]) -> String {
        self.backend.decode_text(self.page, &self.text.font, bytes)
    }

    fn show_text(&mut self, raw: String) {
        let text: String = raw.nfkc().collect();
        if text.trim().is_empty() {
            return;
        }

        if self.text.run_open {
            if let Some(PagePrimitive::TextRun { text: existing, .. }) = self.primitives.last_mut() {
                existing.push_str(&text);
                return;
            }
        }

        let render = self.text.matrix.then(&self.state.ctm);
        let origin = render.apply(0.0, 0.0);
        let font_size = self.text.font_size * render.scale_factor();
        self.primitives.push(PagePrimitive::TextRun {
            text: text.trim().to_string(),
            origin,
            font_size,
        });
        self.text.run_open = true;
    }

    fn paint_xobject(&mut self, name: &[u8], depth: usize) {
        match self.backend.xobject(self.page, name) {
            Some(XObject::Image) => self.image_count += 1,
            Some(XObject::Form { content, matrix }) => {
                if depth >= MAX_FORM_DEPTH {
                    log::warn!(
                        "Form XObject {} nested too deep, skipped",
                        String::from_utf8_lossy(name)
                    );
                    return;
                }
                let ops = match self.backend.decode_content(&content) {
                    Ok(ops) => ops,
                    Err(e) => {
                        log::warn!("Form XObject {}: {}", String::from_utf8_lossy(name), e);
                        return;
                    }
                };
                let saved = self.state;
                let saved_depth = self.stack.len();
                self.state.ctm = Matrix::new(matrix).then(&self.state.ctm);
                self.execute(&ops, depth + 1);
                self.stack.truncate(saved_depth);
                self.state = saved;
            }
            None => {}
        }
    }
}
