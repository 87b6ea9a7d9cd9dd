use crate::error::ExtractionError;
use crate::extractor::r#trait::TextExtractor;
use crate::models::{DocumentFormat, Segment, SegmentSource};

/// JSON extractor: the payload is validated and pretty-printed into a single
/// segment. Invalid JSON is a corrupt document, never a silent empty result.
pub struct JsonExtractor;

impl JsonExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JsonExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl TextExtractor for JsonExtractor {
    async fn extract(&self, bytes: &[u8]) -> Result<Vec<Segment>, ExtractionError> {
        let parsed: serde_json::Value = serde_json::from_slice(bytes)
            .map_err(|e| ExtractionError::CorruptDocument(format!("invalid JSON: {e}")))?;

        let pretty = serde_json::to_string_pretty(&parsed)
            .map_err(|e| ExtractionError::CorruptDocument(format!("failed to render JSON: {e}")))?;

        Ok(vec![Segment::new(SegmentSource::Document, pretty)])
    }

    fn supports_format(&self, format: DocumentFormat) -> bool {
        matches!(format, DocumentFormat::Json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_json_pretty_printed() {
        let extractor = JsonExtractor::new();
        let segments = extractor
            .extract(br#"{"name":"test","value":42}"#)
            .await
            .unwrap();
        assert_eq!(segments.len(), 1);
        assert!(segments[0].text.contains('\n'));
        assert!(segments[0].text.contains("\"name\""));
        assert!(segments[0].text.contains("42"));
    }

    #[tokio::test]
    async fn test_malformed_json_is_corrupt() {
        let extractor = JsonExtractor::new();
        let err = extractor.extract(b"{not json").await.unwrap_err();
        assert!(matches!(err, ExtractionError::CorruptDocument(_)));
    }

    #[test]
    fn test_json_supports_format() {
        let extractor = JsonExtractor::new();
        assert!(extractor.supports_format(DocumentFormat::Json));
        assert!(!extractor.supports_format(DocumentFormat::Txt));
    }
}
