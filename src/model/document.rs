//! Document-level types.

use super::DecodedPage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A decoded drawing set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecodedDocument {
    /// Document metadata (title, author, etc.)
    pub metadata: Metadata,

    /// Pages that carry vector or text content, in document order
    pub pages: Vec<DecodedPage>,

    /// Pages left out of the conversion
    pub skipped_pages: Vec<SkippedPage>,
}

impl DecodedDocument {
    /// Total number of pages in the source document.
    pub fn page_count(&self) -> usize {
        self.metadata.page_count
    }

    /// Get a decoded page by its 0-based index in the source document.
    pub fn page(&self, index: usize) -> Option<&DecodedPage> {
        self.pages.iter().find(|p| p.index == index)
    }
}

/// A page the decoder could not use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedPage {
    pub index: usize,
    pub reason: SkipReason,
}

/// Why a page was skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Only raster images (or nothing at all) on the page
    NoVectorContent,
    /// Content stream could not be decoded (lenient mode only)
    Undecodable(String),
}

/// Document metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Document title
    pub title: Option<String>,

    /// Document author
    pub author: Option<String>,

    /// Document subject
    pub subject: Option<String>,

    /// Creator application
    pub creator: Option<String>,

    /// PDF producer
    pub producer: Option<String>,

    /// Creation date
    pub created: Option<DateTime<Utc>>,

    /// Last modification date
    pub modified: Option<DateTime<Utc>>,

    /// PDF version (e.g., "1.7")
    pub pdf_version: String,

    /// Total number of pages
    pub page_count: usize,
}

impl Metadata {
    /// Create new metadata with PDF version.
    pub fn with_version(version: impl Into<String>) -> Self {
        Self {
            pdf_version: version.into(),
            ..Default::default()
        }
    }
}
