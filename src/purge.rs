//! In-memory scrubbing of document state.
//!
//! Deletion of session content never relies on drop timing: buffers are
//! overwritten in place, the overwrite is verified, and only then is the
//! memory released. Every session-ending path funnels through these routines.

use tracing::{debug, error, warn};

use crate::models::{Document, ExtractedText};

/// Bounded retries for a scrub whose verification fails.
const SCRUB_ATTEMPTS: usize = 3;

/// Overwrite a byte buffer with zeros, verify, then release it.
pub fn scrub_bytes(buf: &mut Vec<u8>) {
    for attempt in 1..=SCRUB_ATTEMPTS {
        buf.iter_mut().for_each(|b| *b = 0);
        if buf.iter().all(|&b| b == 0) {
            buf.clear();
            buf.shrink_to_fit();
            return;
        }
        warn!(attempt, "byte scrub verification failed, retrying");
    }
    error!("byte scrub could not be confirmed after {SCRUB_ATTEMPTS} attempts");
    buf.clear();
    buf.shrink_to_fit();
}

/// Overwrite a string's buffer with NUL bytes, verify, then release it.
/// `clear` keeps the allocation, so the overwrite lands in the same memory
/// the text occupied.
pub fn scrub_string(s: &mut String) {
    let len = s.len();
    for attempt in 1..=SCRUB_ATTEMPTS {
        s.clear();
        for _ in 0..len {
            s.push('\0');
        }
        if s.as_bytes().iter().all(|&b| b == 0) {
            s.clear();
            s.shrink_to_fit();
            return;
        }
        warn!(attempt, "string scrub verification failed, retrying");
    }
    error!("string scrub could not be confirmed after {SCRUB_ATTEMPTS} attempts");
    s.clear();
    s.shrink_to_fit();
}

/// Scrub a document's raw bytes. Called as soon as extraction has finished
/// with them, well before session end.
pub fn purge_document(document: &mut Document) {
    let size = document.size();
    scrub_bytes(&mut document.bytes);
    debug!(size, format = %document.format, "raw document bytes purged");
}

/// Scrub every segment of extracted text and drop the segment list.
pub fn purge_text(text: &mut ExtractedText) {
    let segments = text.segment_count();
    for segment in &mut text.segments {
        scrub_string(&mut segment.text);
    }
    text.segments.clear();
    text.segments.shrink_to_fit();
    debug!(segments, "extracted text purged");
}
