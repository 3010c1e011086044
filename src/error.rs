//! Error types for the plan3d library.

use std::io;
use thiserror::Error;

/// Result type alias for plan3d operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Name used by the pipeline for the fatal error returned from `convert`.
pub type ConversionError = Error;

/// Error types that can occur while converting a drawing.
///
/// Most variants abort the conversion. `InsufficientGeometry` and
/// `DegenerateGeometry` are raised by single stages and recorded as
/// warnings by the pipeline; see [`Error::is_fatal`].
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input is not recognized as PDF.
    #[error("Unknown file format: not a valid PDF")]
    UnknownFormat,

    /// The PDF version is not supported.
    #[error("Unsupported PDF version: {0}")]
    UnsupportedVersion(String),

    /// The document structure or a content stream could not be decoded.
    #[error("PDF decode error: {0}")]
    Decode(String),

    /// The PDF document is encrypted.
    #[error("Document is encrypted")]
    Encrypted,

    /// No page carries vector or text content (raster-only drawings).
    #[error("No vector content on pages {pages:?}")]
    UnsupportedContent {
        /// Zero-based indices of the rejected pages.
        pages: Vec<usize>,
    },

    /// A plan page produced no walls.
    #[error("No walls found on page {page}")]
    InsufficientGeometry { page: usize },

    /// A wall could not be turned into a valid prism.
    #[error("Degenerate wall {wall} on floor {floor}: length {length_mm:.1} mm")]
    DegenerateGeometry {
        floor: usize,
        wall: usize,
        length_mm: f64,
    },

    /// Page index is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(usize, usize),

    /// The conversion options are inconsistent.
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    /// Error while writing or reading an export format.
    #[error("Export error: {0}")]
    Export(String),

    /// Polygon triangulation failed.
    #[error("Triangulation error: {0}")]
    Triangulation(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this error aborts a whole conversion.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Error::InsufficientGeometry { .. } | Error::DegenerateGeometry { .. }
        )
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::Decode(err.to_string()),
        }
    }
}
