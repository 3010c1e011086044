//! Document-level decoding: header check, page loop and skip policy.

use crate::detect::detect_format_from_bytes;
use crate::error::{Error, Result};
use crate::model::{DecodedDocument, DecodedPage, SkipReason, SkippedPage};
use crate::options::ErrorMode;

use super::backend::{LopdfBackend, PageId, PdfBackend};
use super::content::ContentInterpreter;

/// Turns PDF bytes into [`DecodedPage`]s.
pub struct PageDecoder<B: PdfBackend = LopdfBackend> {
    backend: B,
    error_mode: ErrorMode,
}

impl PageDecoder<LopdfBackend> {
    /// Validate the header and load the document.
    pub fn from_bytes(data: &[u8], error_mode: ErrorMode) -> Result<Self> {
        let format = detect_format_from_bytes(data)?;
        log::debug!("Decoding {} ({} bytes)", format, data.len());

        let backend = LopdfBackend::load_bytes(data)?;
        if backend.is_encrypted() {
            return Err(Error::Encrypted);
        }
        Ok(Self::with_backend(backend, error_mode))
    }
}

impl<B: PdfBackend> PageDecoder<B> {
    /// Wrap an already opened backend.
    pub fn with_backend(backend: B, error_mode: ErrorMode) -> Self {
        Self {
            backend,
            error_mode,
        }
    }

    fn page_ids(&self) -> Vec<PageId> {
        self.backend.pages().into_values().collect()
    }

    pub fn page_count(&self) -> usize {
        self.backend.pages().len()
    }

    /// Decode a single page by 0-based index.
    ///
    /// Fails with [`Error::UnsupportedContent`] when the page carries no
    /// vector or text primitives (raster-only or blank).
    pub fn decode_page(&self, index: usize) -> Result<DecodedPage> {
        let ids = self.page_ids();
        let id = *ids
            .get(index)
            .ok_or(Error::PageOutOfRange(index, ids.len()))?;
        self.decode_page_id(index, id)
    }

    fn decode_page_id(&self, index: usize, id: PageId) -> Result<DecodedPage> {
        let page_box = self.backend.page_box(id);
        let (primitives, image_count) =
            ContentInterpreter::new(&self.backend, id, page_box.user_unit).run()?;

        let mut page = DecodedPage::new(
            index,
            page_box.width * page_box.user_unit,
            page_box.height * page_box.user_unit,
        );
        page.user_unit = page_box.user_unit;
        page.primitives = primitives;
        page.image_count = image_count;

        if !page.has_vector_content() {
            log::debug!(
                "Page {} has no vector content ({} images)",
                index,
                page.image_count
            );
            return Err(Error::UnsupportedContent { pages: vec![index] });
        }

        log::debug!(
            "Page {}: {} primitives, {} images",
            index,
            page.primitives.len(),
            page.image_count
        );
        Ok(page)
    }

    /// Decode every page.
    ///
    /// Pages without vector content are skipped; the call fails only when
    /// no page is usable. Undecodable content streams abort in strict mode
    /// and are skipped in lenient mode.
    pub fn decode(&self) -> Result<DecodedDocument> {
        let mut document = DecodedDocument {
            metadata: self.backend.metadata(),
            ..Default::default()
        };

        for (index, id) in self.page_ids().into_iter().enumerate() {
            match self.decode_page_id(index, id) {
                Ok(page) => document.pages.push(page),
                Err(Error::UnsupportedContent { .. }) => document.skipped_pages.push(SkippedPage {
                    index,
                    reason: SkipReason::NoVectorContent,
                }),
                Err(Error::Decode(msg)) if self.error_mode == ErrorMode::Lenient => {
                    log::warn!("Skipping page {}: {}", index, msg);
                    document.skipped_pages.push(SkippedPage {
                        index,
                        reason: SkipReason::Undecodable(msg),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        if document.pages.is_empty() {
            let unsupported: Vec<usize> = document
                .skipped_pages
                .iter()
                .filter(|p| p.reason == SkipReason::NoVectorContent)
                .map(|p| p.index)
                .collect();
            if unsupported.is_empty() && !document.skipped_pages.is_empty() {
                return Err(Error::Decode("no page could be decoded".to_string()));
            }
            return Err(Error::UnsupportedContent { pages: unsupported });
        }

        Ok(document)
    }
}

/// Decode a PDF document from bytes.
pub fn decode(data: &[u8], error_mode: ErrorMode) -> Result<DecodedDocument> {
    PageDecoder::from_bytes(data, error_mode)?.decode()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::backend::{parse_content, ContentOp, PageBox, XObject};
    use crate::model::Metadata;
    use std::collections::BTreeMap;

    /// Backend with one literal content stream per page.
    struct PagesBackend {
        pages: Vec<&'static [u8]>,
    }

    impl PdfBackend for PagesBackend {
        fn pages(&self) -> BTreeMap<u32, PageId> {
            (0..self.pages.len())
                .map(|i| (i as u32 + 1, (i as u32 + 10, 0)))
                .collect()
        }

        fn page_box(&self, _page: PageId) -> PageBox {
            PageBox {
                width: 100.0,
                height: 50.0,
                user_unit: 1.0,
            }
        }

        fn page_content(&self, page: PageId) -> Result<Vec<u8>> {
            match self.pages[(page.0 - 10) as usize] {
                b"!corrupt" => Err(Error::Decode("bad stream".to_string())),
                content => Ok(content.to_vec()),
            }
        }

        fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>> {
            parse_content(data)
        }

        fn decode_text(&self, _page: PageId, _font: &[u8], bytes: &[u8]) -> String {
            String::from_utf8_lossy(bytes).to_string()
        }

        fn xobject(&self, _page: PageId, _name: &[u8]) -> Option<XObject> {
            Some(XObject::Image)
        }

        fn metadata(&self) -> Metadata {
            Metadata::with_version("1.7")
        }
    }

    fn decoder(pages: Vec<&'static [u8]>, mode: ErrorMode) -> PageDecoder<PagesBackend> {
        PageDecoder::with_backend(PagesBackend { pages }, mode)
    }

    #[test]
    fn test_raster_page_is_skipped() {
        let doc = decoder(vec![&b"/Im0 Do"[..], &b"0 0 m 10 0 l S"[..]], ErrorMode::Strict)
            .decode()
            .unwrap();
        assert_eq!(doc.pages.len(), 1);
        assert_eq!(doc.pages[0].index, 1);
        assert_eq!(
            doc.skipped_pages,
            vec![SkippedPage {
                index: 0,
                reason: SkipReason::NoVectorContent
            }]
        );
        assert_eq!(doc.metadata.pdf_version, "1.7");
    }

    #[test]
    fn test_all_raster_is_fatal() {
        let result = decoder(vec![&b"/Im0 Do"[..], &b""[..]], ErrorMode::Strict).decode();
        assert!(matches!(
            result,
            Err(Error::UnsupportedContent { pages }) if pages == vec![0, 1]
        ));
    }

    #[test]
    fn test_single_page_decode() {
        let d = decoder(vec![&b"/Im0 Do"[..]], ErrorMode::Strict);
        assert!(matches!(
            d.decode_page(0),
            Err(Error::UnsupportedContent { .. })
        ));
        assert!(matches!(d.decode_page(5), Err(Error::PageOutOfRange(5, 1))));
    }

    #[test]
    fn test_lenient_skips_undecodable() {
        let pages: Vec<&'static [u8]> = vec![&b"0 0 m 10 0 l S"[..], &b"!corrupt"[..]];
        let doc = decoder(pages.clone(), ErrorMode::Lenient).decode().unwrap();
        assert_eq!(doc.pages.len(), 1);
        assert!(matches!(
            doc.skipped_pages[0].reason,
            SkipReason::Undecodable(_)
        ));

        assert!(matches!(
            decoder(pages, ErrorMode::Strict).decode(),
            Err(Error::Decode(_))
        ));
    }

    #[test]
    fn test_rejects_non_pdf_bytes() {
        assert!(matches!(
            decode(b"hello world", ErrorMode::Strict),
            Err(Error::UnknownFormat)
        ));
    }
}
