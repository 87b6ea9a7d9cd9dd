use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::ExtractConfig;
use crate::error::{ExtractionError, SessionError};
use crate::extractor;
use crate::models::{Document, ExtractedText};
use crate::purge;

/// Ephemeral, in-memory holder of the current session's document state.
///
/// At most one Document/ExtractedText pair exists at a time. `clear` is the
/// enforcement point for the privacy guarantee: every session-ending path
/// (explicit end, replacement upload, disconnect) goes through it, and it
/// scrubs the held text before releasing it.
pub struct SessionStore {
    extract_config: ExtractConfig,
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    text: Option<ExtractedText>,
    model: Option<String>,
    /// Bumped on every put and clear; an in-flight query compares the
    /// generation it snapshotted to detect that its text is gone.
    generation: u64,
}

impl SessionStore {
    pub fn new(extract_config: ExtractConfig) -> Self {
        Self {
            extract_config,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Extract and store a new document, purging any prior pair first.
    ///
    /// The raw bytes are scrubbed as soon as extraction finishes with them;
    /// only the extracted text stays behind for querying. A failed extraction
    /// leaves the prior state untouched. The session lock is held across
    /// extraction, so a replacement upload is serialized against reads.
    pub async fn put(&self, mut document: Document) -> Result<(), ExtractionError> {
        let size = document.size();
        let format = document.format;

        let mut inner = self.inner.lock().await;
        let result = extractor::extract_document(&document, &self.extract_config).await;
        purge::purge_document(&mut document);
        let text = result?;

        if let Some(mut old) = inner.text.take() {
            purge::purge_text(&mut old);
            debug!("replaced document text purged");
        }
        info!(
            format = %format,
            size,
            segments = text.segment_count(),
            "document stored in session"
        );
        inner.text = Some(text);
        inner.generation += 1;
        Ok(())
    }

    /// Snapshot of the current extracted text plus the generation it belongs
    /// to. The snapshot stays consistent even if a replacement upload lands
    /// while a query runs against it.
    pub async fn get(&self) -> Result<(ExtractedText, u64), SessionError> {
        let inner = self.inner.lock().await;
        match &inner.text {
            Some(text) => Ok((text.clone(), inner.generation)),
            None => Err(SessionError::NotFound),
        }
    }

    pub async fn generation(&self) -> u64 {
        self.inner.lock().await.generation
    }

    /// Purge the held document state. Synchronous with respect to the caller:
    /// when this returns, the scrub has been performed and verified.
    pub async fn clear(&self) {
        let mut inner = self.inner.lock().await;
        if let Some(mut text) = inner.text.take() {
            purge::purge_text(&mut text);
            inner.generation += 1;
            info!("session document purged");
        }
    }

    pub async fn select_model(&self, id: impl Into<String>) {
        let mut inner = self.inner.lock().await;
        inner.model = Some(id.into());
    }

    pub async fn current_model(&self) -> Result<String, SessionError> {
        let inner = self.inner.lock().await;
        inner.model.clone().ok_or(SessionError::NotFound)
    }

    /// Full session teardown: document state purged, model selection dropped.
    pub async fn end_session(&self) {
        self.clear().await;
        let mut inner = self.inner.lock().await;
        inner.model = None;
    }
}
