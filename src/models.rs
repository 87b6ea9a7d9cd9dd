use std::fmt;

use crate::error::ExtractionError;

/// Declared format of an uploaded document. Selection is by tag, never by
/// content sniffing, so unsupported formats are rejected explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Txt,
    Json,
}

impl DocumentFormat {
    /// Parse a declared format tag ("pdf", "docx", ...). A leading dot is
    /// tolerated so file extensions can be passed through directly.
    pub fn from_tag(tag: &str) -> Result<Self, ExtractionError> {
        match tag.trim().trim_start_matches('.').to_lowercase().as_str() {
            "pdf" => Ok(Self::Pdf),
            "docx" => Ok(Self::Docx),
            "txt" | "text" => Ok(Self::Txt),
            "json" => Ok(Self::Json),
            other => Err(ExtractionError::UnsupportedFormat(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Txt => "txt",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An uploaded document: raw bytes plus the declared format tag. Owned by the
/// session store for the duration of extraction only; the bytes are scrubbed
/// as soon as extraction has produced the text.
#[derive(Debug)]
pub struct Document {
    pub bytes: Vec<u8>,
    pub format: DocumentFormat,
}

impl Document {
    pub fn new(bytes: Vec<u8>, format: DocumentFormat) -> Self {
        Self { bytes, format }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Where a segment of extracted text came from within its document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentSource {
    /// A PDF page, 1-based.
    Page(usize),
    /// A DOCX paragraph, 1-based, in document order.
    Paragraph(usize),
    /// A DOCX table row, 1-based, in document order.
    TableRow(usize),
    /// A blank-line-delimited block of a large text file, 1-based.
    Block(usize),
    /// The whole document as a single unit.
    Document,
}

impl fmt::Display for SegmentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Page(n) => write!(f, "page {n}"),
            Self::Paragraph(n) => write!(f, "paragraph {n}"),
            Self::TableRow(n) => write!(f, "table row {n}"),
            Self::Block(n) => write!(f, "block {n}"),
            Self::Document => f.write_str("document"),
        }
    }
}

/// A provenance-tagged unit of extracted text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub source: SegmentSource,
    pub text: String,
}

impl Segment {
    pub fn new(source: SegmentSource, text: impl Into<String>) -> Self {
        Self {
            source,
            text: text.into(),
        }
    }
}

/// Ordered text segments derived from exactly one document. Replaces any
/// prior extracted text for the session and never outlives it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    pub segments: Vec<Segment>,
}

impl ExtractedText {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn total_chars(&self) -> usize {
        self.segments.iter().map(|s| s.text.len()).sum()
    }

    /// True when no segment carries any visible text.
    pub fn is_blank(&self) -> bool {
        self.segments.iter().all(|s| s.text.trim().is_empty())
    }
}

/// A model-ready prompt in fixed template order: instruction preamble,
/// document context, question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub context: String,
    pub question: String,
}

/// Model output plus the model that produced it. Transient; never stored in
/// the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub text: String,
    pub model: String,
}
