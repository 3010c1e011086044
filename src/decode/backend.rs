//! Thin access layer over the PDF object model.
//!
//! The content interpreter talks to a [`PdfBackend`] so that it never sees
//! lopdf types directly. [`LopdfBackend`] is the production implementation.

use std::collections::BTreeMap;

use lopdf::{Dictionary, Document as LopdfDocument, Object, Stream};

use crate::error::{Error, Result};
use crate::model::Metadata;

/// Object reference of a page.
pub type PageId = (u32, u16);

/// Operand of a content-stream operator.
#[derive(Debug, Clone, PartialEq)]
pub enum PdfValue {
    Integer(i64),
    Real(f64),
    Name(Vec<u8>),
    Str(Vec<u8>),
    Array(Vec<PdfValue>),
    Other,
}

impl PdfValue {
    /// Numeric value of an integer or real operand.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            PdfValue::Integer(i) => Some(*i as f64),
            PdfValue::Real(r) => Some(*r),
            _ => None,
        }
    }
}

/// One operator with its operands.
#[derive(Debug, Clone)]
pub struct ContentOp {
    pub operator: String,
    pub operands: Vec<PdfValue>,
}

impl ContentOp {
    /// The first `N` operands as numbers, if they all are numbers.
    pub fn numbers<const N: usize>(&self) -> Option<[f64; N]> {
        if self.operands.len() < N {
            return None;
        }
        let mut out = [0.0; N];
        for (slot, value) in out.iter_mut().zip(&self.operands) {
            *slot = value.as_number()?;
        }
        Some(out)
    }
}

/// Physical size of a page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBox {
    /// Width in PDF points
    pub width: f64,
    /// Height in PDF points
    pub height: f64,
    /// `/UserUnit` multiplier (1.0 when absent)
    pub user_unit: f64,
}

impl Default for PageBox {
    fn default() -> Self {
        // US Letter
        Self {
            width: 612.0,
            height: 792.0,
            user_unit: 1.0,
        }
    }
}

/// An external object painted with `Do`.
#[derive(Debug, Clone)]
pub enum XObject {
    /// Raster image
    Image,
    /// Form XObject with its content stream and `/Matrix`
    Form { content: Vec<u8>, matrix: [f64; 6] },
}

/// Document access needed by the decoder. Mocked in tests.
pub trait PdfBackend {
    /// Return all pages as (page_number → PageId), 1-based.
    fn pages(&self) -> BTreeMap<u32, PageId>;

    /// Size of a page, following `/Parent` inheritance.
    fn page_box(&self, page: PageId) -> PageBox;

    /// The raw (decompressed) content stream bytes for a page.
    fn page_content(&self, page: PageId) -> Result<Vec<u8>>;

    /// Split a content stream into operators.
    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>>;

    /// Decode a shown string with the encoding of `font_name` on `page`.
    /// Unknown fonts decode as Latin-1 or UTF-16BE.
    fn decode_text(&self, page: PageId, font_name: &[u8], bytes: &[u8]) -> String;

    /// Resolve an XObject name from the page resources.
    fn xobject(&self, page: PageId, name: &[u8]) -> Option<XObject>;

    /// Document information dictionary.
    fn metadata(&self) -> Metadata;
}

/// UTF-16BE when the string has a BOM, Latin-1 otherwise.
pub fn decode_text_simple(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&utf16);
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    // Latin-1
    bytes.iter().map(|&b| b as char).collect()
}

/// Parse a content stream without a document (used by tests and forms).
pub fn parse_content(data: &[u8]) -> Result<Vec<ContentOp>> {
    let content = lopdf::content::Content::decode(data)
        .map_err(|e| Error::Decode(format!("content stream: {}", e)))?;

    Ok(content
        .operations
        .into_iter()
        .map(|op| ContentOp {
            operands: op.operands.iter().map(convert_object).collect(),
            operator: op.operator,
        })
        .collect())
}

// ---------------------------------------------------------------------------
// LopdfBackend
// ---------------------------------------------------------------------------

/// Concrete [`PdfBackend`] backed by `lopdf::Document`.
pub struct LopdfBackend {
    doc: LopdfDocument,
}

impl LopdfBackend {
    /// Parse a document held in memory.
    pub fn load_bytes(data: &[u8]) -> Result<Self> {
        let doc = LopdfDocument::load_mem(data)?;
        Ok(Self { doc })
    }

    /// Whether the trailer has an `/Encrypt` entry.
    pub fn is_encrypted(&self) -> bool {
        self.doc.is_encrypted()
    }

    /// Header version, e.g. `1.7`.
    pub fn version(&self) -> String {
        self.doc.version.to_string()
    }

    fn resolve<'a>(&'a self, obj: &'a Object) -> &'a Object {
        match obj {
            Object::Reference(id) => self.doc.get_object(*id).unwrap_or(obj),
            _ => obj,
        }
    }

    /// Look up a page attribute, walking up the page tree when it is inherited.
    fn inherited(&self, page: PageId, key: &[u8]) -> Option<&Object> {
        let mut dict = self.doc.get_dictionary(page).ok()?;
        // Depth guard against cyclic /Parent chains.
        for _ in 0..64 {
            if let Ok(value) = dict.get(key) {
                return Some(self.resolve(value));
            }
            let parent = dict.get(b"Parent").ok()?.as_reference().ok()?;
            dict = self.doc.get_dictionary(parent).ok()?;
        }
        None
    }

    fn xobject_dict(&self, page: PageId) -> Option<&Dictionary> {
        let resources = self.inherited(page, b"Resources")?.as_dict().ok()?;
        self.resolve(resources.get(b"XObject").ok()?).as_dict().ok()
    }
}

fn stream_bytes(stream: &Stream) -> Vec<u8> {
    stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone())
}

fn object_number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

impl PdfBackend for LopdfBackend {
    fn pages(&self) -> BTreeMap<u32, PageId> {
        self.doc.get_pages()
    }

    fn page_box(&self, page: PageId) -> PageBox {
        let mut page_box = PageBox::default();

        let media_box = self
            .inherited(page, b"MediaBox")
            .and_then(|o| o.as_array().ok())
            .map(|arr| arr.iter().filter_map(object_number).collect::<Vec<_>>());
        if let Some(values) = media_box {
            if values.len() >= 4 {
                page_box.width = (values[2] - values[0]).abs();
                page_box.height = (values[3] - values[1]).abs();
            }
        }

        if let Some(unit) = self
            .doc
            .get_dictionary(page)
            .ok()
            .and_then(|d| d.get(b"UserUnit").ok())
            .and_then(object_number)
        {
            if unit > 0.0 {
                page_box.user_unit = unit;
            }
        }

        page_box
    }

    fn page_content(&self, page: PageId) -> Result<Vec<u8>> {
        let page_dict = self
            .doc
            .get_dictionary(page)
            .map_err(|e| Error::Decode(e.to_string()))?;

        let contents = match page_dict.get(b"Contents") {
            Ok(obj) => self.resolve(obj),
            // A page without /Contents is blank.
            Err(_) => return Ok(Vec::new()),
        };

        match contents {
            Object::Stream(s) => Ok(stream_bytes(s)),
            Object::Array(arr) => {
                let mut content = Vec::new();
                for obj in arr {
                    if let Object::Stream(s) = self.resolve(obj) {
                        content.extend_from_slice(&stream_bytes(s));
                        content.push(b'\n');
                    }
                }
                Ok(content)
            }
            _ => Err(Error::Decode("Invalid content stream".to_string())),
        }
    }

    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>> {
        parse_content(data)
    }

    fn decode_text(&self, page: PageId, font_name: &[u8], bytes: &[u8]) -> String {
        if let Ok(fonts) = self.doc.get_page_fonts(page) {
            if let Some(font_dict) = fonts.get(font_name) {
                if let Ok(enc) = font_dict.get_font_encoding(&self.doc) {
                    if let Ok(text) = LopdfDocument::decode_text(&enc, bytes) {
                        return text;
                    }
                }
            }
        }
        decode_text_simple(bytes)
    }

    fn xobject(&self, page: PageId, name: &[u8]) -> Option<XObject> {
        let entry = self.xobject_dict(page)?.get(name).ok()?;
        let stream = self.resolve(entry).as_stream().ok()?;
        match stream.dict.get(b"Subtype").ok()?.as_name().ok()? {
            b"Image" => Some(XObject::Image),
            b"Form" => {
                let mut matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];
                if let Some(values) = stream
                    .dict
                    .get(b"Matrix")
                    .ok()
                    .and_then(|m| m.as_array().ok())
                {
                    let numbers: Vec<f64> = values.iter().filter_map(object_number).collect();
                    if numbers.len() == 6 {
                        matrix.copy_from_slice(&numbers);
                    }
                }
                Some(XObject::Form {
                    content: stream_bytes(stream),
                    matrix,
                })
            }
            _ => None,
        }
    }

    fn metadata(&self) -> Metadata {
        let mut metadata = Metadata::with_version(self.version());
        metadata.page_count = self.doc.get_pages().len();

        let info = self
            .doc
            .trailer
            .get(b"Info")
            .ok()
            .map(|o| self.resolve(o))
            .and_then(|o| o.as_dict().ok());
        if let Some(info) = info {
            metadata.title = info_string(info, b"Title");
            metadata.author = info_string(info, b"Author");
            metadata.subject = info_string(info, b"Subject");
            metadata.creator = info_string(info, b"Creator");
            metadata.producer = info_string(info, b"Producer");
            metadata.created = info_string(info, b"CreationDate").and_then(|s| parse_pdf_date(&s));
            metadata.modified = info_string(info, b"ModDate").and_then(|s| parse_pdf_date(&s));
        }

        metadata
    }
}

/// Map an operand object into [`PdfValue`].
fn convert_object(obj: &Object) -> PdfValue {
    match obj {
        Object::Integer(i) => PdfValue::Integer(*i),
        Object::Real(r) => PdfValue::Real(*r as f64),
        Object::Name(n) => PdfValue::Name(n.clone()),
        Object::String(b, _) => PdfValue::Str(b.clone()),
        Object::Array(arr) => PdfValue::Array(arr.iter().map(convert_object).collect()),
        _ => PdfValue::Other,
    }
}

fn info_string(dict: &Dictionary, key: &[u8]) -> Option<String> {
    let text = match dict.get(key).ok()? {
        Object::String(bytes, _) => decode_text_simple(bytes),
        Object::Name(bytes) => String::from_utf8_lossy(bytes).to_string(),
        _ => return None,
    };
    let text = text.trim().to_string();
    (!text.is_empty()).then_some(text)
}

/// Parse a PDF date string (D:YYYYMMDDHHmmSSOHH'mm').
pub fn parse_pdf_date(s: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    let s = s.strip_prefix("D:").unwrap_or(s);
    let field = |range: std::ops::Range<usize>, default: u32| -> u32 {
        s.get(range).and_then(|v| v.parse().ok()).unwrap_or(default)
    };

    let year: i32 = s.get(0..4)?.parse().ok()?;
    chrono::NaiveDate::from_ymd_opt(year, field(4..6, 1), field(6..8, 1))
        .and_then(|date| date.and_hms_opt(field(8..10, 0), field(10..12, 0), field(12..14, 0)))
        .map(|dt| chrono::DateTime::from_naive_utc_and_offset(dt, chrono::Utc))
}
