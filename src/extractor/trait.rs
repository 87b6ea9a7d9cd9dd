use crate::error::ExtractionError;
use crate::models::{DocumentFormat, Segment};

/// Trait for text extractors that turn raw document bytes into
/// provenance-tagged segments
#[async_trait::async_trait]
pub trait TextExtractor: Send + Sync {
    /// Extract text segments from raw document bytes. Implementations must
    /// not retain a reference to the bytes after returning.
    async fn extract(&self, bytes: &[u8]) -> Result<Vec<Segment>, ExtractionError>;

    /// Check if this extractor handles the given declared format
    fn supports_format(&self, format: DocumentFormat) -> bool;
}
