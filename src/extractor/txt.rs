use crate::error::ExtractionError;
use crate::extractor::r#trait::TextExtractor;
use crate::models::{DocumentFormat, Segment, SegmentSource};

/// Plain text extractor. Small files become a single segment; files above
/// the split threshold are broken on blank-line boundaries so individual
/// blocks stay addressable from the prompt.
pub struct TxtExtractor {
    split_threshold: usize,
}

impl TxtExtractor {
    pub fn new(split_threshold: usize) -> Self {
        Self { split_threshold }
    }
}

#[async_trait::async_trait]
impl TextExtractor for TxtExtractor {
    async fn extract(&self, bytes: &[u8]) -> Result<Vec<Segment>, ExtractionError> {
        let text = std::str::from_utf8(bytes).map_err(|e| {
            ExtractionError::CorruptDocument(format!("text file is not valid UTF-8: {e}"))
        })?;
        // Normalize CRLF so blank-line boundaries are found in Windows files too
        let text = text.replace("\r\n", "\n");

        if bytes.len() <= self.split_threshold {
            return Ok(vec![Segment::new(
                SegmentSource::Document,
                text.trim().to_string(),
            )]);
        }

        let blocks: Vec<&str> = text
            .split("\n\n")
            .map(str::trim)
            .filter(|block| !block.is_empty())
            .collect();

        if blocks.is_empty() {
            return Ok(vec![Segment::new(
                SegmentSource::Document,
                text.trim().to_string(),
            )]);
        }

        Ok(blocks
            .into_iter()
            .enumerate()
            .map(|(idx, block)| Segment::new(SegmentSource::Block(idx + 1), block.to_string()))
            .collect())
    }

    fn supports_format(&self, format: DocumentFormat) -> bool {
        matches!(format, DocumentFormat::Txt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_small_file_single_segment() {
        let extractor = TxtExtractor::new(1024);
        let segments = extractor.extract(b"one\n\ntwo\n\nthree").await.unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].source, SegmentSource::Document);
        assert_eq!(segments[0].text, "one\n\ntwo\n\nthree");
    }

    #[tokio::test]
    async fn test_large_file_splits_on_blank_lines() {
        let extractor = TxtExtractor::new(8);
        let segments = extractor
            .extract(b"first block\n\nsecond block\n\nthird block")
            .await
            .unwrap();
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].source, SegmentSource::Block(1));
        assert_eq!(segments[1].text, "second block");
    }

    #[tokio::test]
    async fn test_large_crlf_file_splits_on_blank_lines() {
        let extractor = TxtExtractor::new(8);
        let segments = extractor
            .extract(b"first block\r\n\r\nsecond block\r\n\r\nthird block")
            .await
            .unwrap();
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].source, SegmentSource::Block(1));
        assert_eq!(segments[1].text, "second block");
        assert_eq!(segments[2].text, "third block");
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_corrupt() {
        let extractor = TxtExtractor::new(1024);
        let err = extractor.extract(&[0xff, 0xfe, 0x00, 0x80]).await.unwrap_err();
        assert!(matches!(err, ExtractionError::CorruptDocument(_)));
    }

    #[test]
    fn test_txt_supports_format() {
        let extractor = TxtExtractor::new(1024);
        assert!(extractor.supports_format(DocumentFormat::Txt));
        assert!(!extractor.supports_format(DocumentFormat::Json));
    }
}
