//! Page decoding: PDF bytes to positioned drawing primitives.

pub mod backend;
pub mod content;
mod decoder;

pub use backend::{LopdfBackend, PdfBackend};
pub use decoder::{decode, PageDecoder};
