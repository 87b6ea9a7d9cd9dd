use crate::error::ExtractionError;
use crate::extractor::r#trait::TextExtractor;
use crate::models::{DocumentFormat, Segment, SegmentSource};
use serde_json::Value;

/// DOCX text extractor built on docx-rs: one segment per paragraph and one
/// per table row, preserving document order.
pub struct DocxExtractor;

impl DocxExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DocxExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl TextExtractor for DocxExtractor {
    async fn extract(&self, bytes: &[u8]) -> Result<Vec<Segment>, ExtractionError> {
        let bytes = bytes.to_vec();
        tokio::task::spawn_blocking(move || -> Result<Vec<Segment>, ExtractionError> {
            let docx = docx_rs::read_docx(&bytes).map_err(|e| {
                ExtractionError::CorruptDocument(format!("failed to open DOCX: {e:?}"))
            })?;

            let json: Value = serde_json::from_str(&docx.json()).map_err(|e| {
                ExtractionError::CorruptDocument(format!("unreadable DOCX structure: {e}"))
            })?;

            Ok(segments_from_document(&json))
        })
        .await
        .map_err(|e| ExtractionError::CorruptDocument(format!("extraction task failed: {e}")))?
    }

    fn supports_format(&self, format: DocumentFormat) -> bool {
        matches!(format, DocumentFormat::Docx)
    }
}

/// Walk the docx-rs JSON tree: document.children[] is a flat list of
/// paragraphs and tables in document order.
fn segments_from_document(json: &Value) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut paragraph_idx = 0usize;
    let mut row_idx = 0usize;

    let children = json
        .get("document")
        .and_then(|d| d.get("children"))
        .and_then(|c| c.as_array());
    let Some(children) = children else {
        return segments;
    };

    for child in children {
        match child.get("type").and_then(|t| t.as_str()) {
            Some("paragraph") => {
                paragraph_idx += 1;
                let text = paragraph_text(child);
                if !text.is_empty() {
                    segments.push(Segment::new(SegmentSource::Paragraph(paragraph_idx), text));
                }
            }
            Some("table") => {
                let rows = child
                    .get("data")
                    .and_then(|d| d.get("rows"))
                    .and_then(|r| r.as_array());
                for row in rows.into_iter().flatten() {
                    row_idx += 1;
                    let text = row_text(row);
                    if !text.is_empty() {
                        segments.push(Segment::new(SegmentSource::TableRow(row_idx), text));
                    }
                }
            }
            // Other node types (sections, bookmarks) carry no body text
            _ => {}
        }
    }

    segments
}

/// Text of one paragraph: its runs joined with single spaces.
fn paragraph_text(paragraph: &Value) -> String {
    let mut text = String::new();
    if let Some(children) = paragraph
        .get("data")
        .and_then(|d| d.get("children"))
        .and_then(|c| c.as_array())
    {
        for run in children {
            if run.get("type").and_then(|t| t.as_str()) == Some("run") {
                let run_text = text_from_run(run);
                if !run_text.is_empty() {
                    if !text.is_empty() {
                        text.push(' ');
                    }
                    text.push_str(&run_text);
                }
            }
        }
    }
    text
}

/// Text content of a run node: run.data.children[] text nodes.
fn text_from_run(run: &Value) -> String {
    let mut text = String::new();
    if let Some(children) = run
        .get("data")
        .and_then(|d| d.get("children"))
        .and_then(|c| c.as_array())
    {
        for child in children {
            if child.get("type").and_then(|t| t.as_str()) == Some("text") {
                if let Some(content) = child
                    .get("data")
                    .and_then(|d| d.get("text"))
                    .and_then(|t| t.as_str())
                {
                    if !text.is_empty() {
                        text.push(' ');
                    }
                    text.push_str(content);
                }
            }
        }
    }
    text
}

/// Text of one table row: cell paragraphs joined with tabs.
fn row_text(row: &Value) -> String {
    let mut cell_texts = Vec::new();
    if let Some(cells) = row.get("cells").and_then(|c| c.as_array()) {
        for cell in cells {
            let mut cell_text = String::new();
            if let Some(children) = cell.get("children").and_then(|c| c.as_array()) {
                for content in children {
                    if content.get("type").and_then(|t| t.as_str()) == Some("paragraph") {
                        let paragraph = paragraph_text(content);
                        if !paragraph.is_empty() {
                            if !cell_text.is_empty() {
                                cell_text.push(' ');
                            }
                            cell_text.push_str(&paragraph);
                        }
                    }
                }
            }
            cell_texts.push(cell_text);
        }
    }
    let joined = cell_texts.join("\t");
    if joined.trim().is_empty() {
        String::new()
    } else {
        joined
    }
}
