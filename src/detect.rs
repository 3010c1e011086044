//! PDF header detection.

use crate::error::{Error, Result};

/// Format information read from the file header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfFormat {
    /// PDF version (e.g., "1.7", "2.0")
    pub version: String,
}

impl std::fmt::Display for PdfFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PDF {}", self.version)
    }
}

const PDF_MAGIC: &[u8] = b"%PDF-";
const VERSION_LEN: usize = 3; // e.g., "1.7"

/// Detect the PDF format from the leading bytes of a document.
///
/// # Returns
/// * `Ok(PdfFormat)` if the data starts with a valid PDF header
/// * `Err(Error::UnknownFormat)` if the data is not a PDF
/// * `Err(Error::UnsupportedVersion)` if the version is not `major.minor`
///   with a major version of 1 or 2
pub fn detect_format_from_bytes(data: &[u8]) -> Result<PdfFormat> {
    // Some producers emit a few junk bytes before the header.
    let start = data
        .windows(PDF_MAGIC.len())
        .take(1024)
        .position(|w| w == PDF_MAGIC)
        .ok_or(Error::UnknownFormat)?;

    let version_start = start + PDF_MAGIC.len();
    let version_bytes = data
        .get(version_start..version_start + VERSION_LEN)
        .ok_or(Error::UnknownFormat)?;
    let version = String::from_utf8_lossy(version_bytes).to_string();

    if !is_supported_version(&version) {
        return Err(Error::UnsupportedVersion(version));
    }

    Ok(PdfFormat { version })
}

/// Check if bytes start like a supported PDF.
pub fn is_pdf_bytes(data: &[u8]) -> bool {
    detect_format_from_bytes(data).is_ok()
}

fn is_supported_version(version: &str) -> bool {
    let bytes = version.as_bytes();
    bytes.len() == 3
        && matches!(bytes[0], b'1' | b'2')
        && bytes[1] == b'.'
        && bytes[2].is_ascii_digit()
}
