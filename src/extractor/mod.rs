pub mod docx;
pub mod factory;
pub mod json;
pub mod pdf;
pub mod r#trait;
pub mod txt;

pub use factory::ExtractorFactory;
pub use r#trait::TextExtractor;

use crate::config::ExtractConfig;
use crate::error::ExtractionError;
use crate::models::{Document, ExtractedText};

/// Run the format-appropriate extractor over a document. A document whose
/// segments carry no visible text at all is reported as `EmptyDocument`,
/// distinct from a malformed one.
pub async fn extract_document(
    document: &Document,
    config: &ExtractConfig,
) -> Result<ExtractedText, ExtractionError> {
    let extractor = ExtractorFactory::create(document.format, config);
    let segments = extractor.extract(&document.bytes).await?;
    if segments.is_empty() || segments.iter().all(|s| s.text.trim().is_empty()) {
        return Err(ExtractionError::EmptyDocument);
    }
    Ok(ExtractedText::new(segments))
}
