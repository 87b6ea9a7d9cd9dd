use crate::error::ExtractionError;
use crate::extractor::r#trait::TextExtractor;
use crate::models::{DocumentFormat, Segment, SegmentSource};
use tracing::debug;

/// PDF text extractor: lopdf page-by-page, with a pdf-extract whole-document
/// fallback when no page yields text. A page that fails to decode (scanned
/// image, broken content stream) becomes an empty segment instead of failing
/// the whole document.
pub struct PdfExtractor;

impl PdfExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl TextExtractor for PdfExtractor {
    async fn extract(&self, bytes: &[u8]) -> Result<Vec<Segment>, ExtractionError> {
        let bytes = bytes.to_vec();
        tokio::task::spawn_blocking(move || -> Result<Vec<Segment>, ExtractionError> {
            use lopdf::Document;

            let doc = Document::load_mem(&bytes)
                .map_err(|e| ExtractionError::CorruptDocument(format!("failed to open PDF: {e}")))?;

            let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
            let mut segments = Vec::with_capacity(page_numbers.len());

            for page_num in &page_numbers {
                let text = doc.extract_text(&[*page_num]).unwrap_or_default();
                segments.push(Segment::new(
                    SegmentSource::Page(*page_num as usize),
                    text.trim().to_string(),
                ));
            }

            if segments.iter().all(|s| s.text.is_empty()) {
                // lopdf found no text on any page; pdf-extract handles some
                // encodings lopdf does not.
                debug!("no per-page text found, falling back to pdf-extract");
                if let Ok(text) = pdf_extract::extract_text_from_mem(&bytes) {
                    let trimmed = text.trim();
                    if !trimmed.is_empty() {
                        segments =
                            vec![Segment::new(SegmentSource::Document, trimmed.to_string())];
                    }
                }
            }

            Ok(segments)
        })
        .await
        .map_err(|e| ExtractionError::CorruptDocument(format!("extraction task failed: {e}")))?
    }

    fn supports_format(&self, format: DocumentFormat) -> bool {
        matches!(format, DocumentFormat::Pdf)
    }
}
