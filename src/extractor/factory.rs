use crate::config::ExtractConfig;
use crate::extractor::docx::DocxExtractor;
use crate::extractor::json::JsonExtractor;
use crate::extractor::pdf::PdfExtractor;
use crate::extractor::r#trait::TextExtractor;
use crate::extractor::txt::TxtExtractor;
use crate::models::DocumentFormat;
use std::sync::Arc;

/// Factory for creating TextExtractor instances based on the declared format
/// tag. Unsupported tags are rejected earlier, when the tag is parsed into a
/// `DocumentFormat`.
pub struct ExtractorFactory;

impl ExtractorFactory {
    pub fn create(format: DocumentFormat, config: &ExtractConfig) -> Arc<dyn TextExtractor> {
        match format {
            DocumentFormat::Pdf => Arc::new(PdfExtractor::new()),
            DocumentFormat::Docx => Arc::new(DocxExtractor::new()),
            DocumentFormat::Txt => Arc::new(TxtExtractor::new(config.txt_split_threshold)),
            DocumentFormat::Json => Arc::new(JsonExtractor::new()),
        }
    }
}
