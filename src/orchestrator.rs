use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{ExtractionError, ModelError, SessionError};
use crate::llm::ModelClient;
use crate::models::{Answer, Document, DocumentFormat};
use crate::prompt::PromptBuilder;
use crate::session::SessionStore;

/// Session lifecycle state as observed between operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Empty,
    DocumentLoaded,
    Querying,
}

/// Coordinates extraction, prompt assembly and model calls for one session.
///
/// Transitions: `upload` moves any state to `DocumentLoaded` (or leaves it
/// unchanged on extraction failure), `ask` loops
/// `DocumentLoaded → Querying → DocumentLoaded`, and `end_session` purges to
/// `Empty` from anywhere, including mid-query.
pub struct Orchestrator {
    store: Arc<SessionStore>,
    prompt_builder: PromptBuilder,
    client: Arc<dyn ModelClient>,
    timeout: Duration,
    state: Mutex<SessionState>,
}

impl Orchestrator {
    pub fn new(config: &Config, client: Arc<dyn ModelClient>) -> Self {
        Self {
            store: Arc::new(SessionStore::new(config.extract.clone())),
            prompt_builder: PromptBuilder::new(config.prompt.clone()),
            client,
            timeout: Duration::from_secs(config.ollama.timeout_secs),
            state: Mutex::new(SessionState::Empty),
        }
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub async fn state(&self) -> SessionState {
        *self.state.lock().await
    }

    /// Upload a document under its declared format tag. On extraction failure
    /// the session keeps its prior state and the error is surfaced.
    pub async fn upload(&self, bytes: Vec<u8>, tag: &str) -> Result<(), ExtractionError> {
        let format = DocumentFormat::from_tag(tag)?;
        self.store.put(Document::new(bytes, format)).await?;
        *self.state.lock().await = SessionState::DocumentLoaded;
        Ok(())
    }

    pub async fn select_model(&self, id: &str) {
        self.store.select_model(id).await;
    }

    /// Ask a question against the loaded document. Valid only from
    /// `DocumentLoaded`; the session returns there (or to `Empty`, if it was
    /// purged mid-query) whatever the outcome.
    pub async fn ask(&self, question: &str) -> Result<Answer> {
        {
            let mut state = self.state.lock().await;
            match *state {
                SessionState::DocumentLoaded => *state = SessionState::Querying,
                SessionState::Empty => return Err(SessionError::NotFound.into()),
                SessionState::Querying => {
                    return Err(anyhow!("another question is already in flight"))
                }
            }
        }

        let result = self.run_query(question).await;

        let mut state = self.state.lock().await;
        *state = if self.store.get().await.is_ok() {
            SessionState::DocumentLoaded
        } else {
            SessionState::Empty
        };
        result
    }

    async fn run_query(&self, question: &str) -> Result<Answer> {
        let (text, generation) = self.store.get().await?;
        let model = self
            .store
            .current_model()
            .await
            .map_err(|_| anyhow!("no model selected for this session"))?;

        let built = self.prompt_builder.build(&text, question);
        if built.truncated {
            warn!("document text truncated to fit the context budget");
        }

        let answer = match self.client.generate(&built.prompt, &model, self.timeout).await {
            Ok(answer) => answer,
            Err(ModelError::Timeout(_)) => {
                // One retry with a fresh deadline. InferenceFailure is not
                // considered transient at this layer and is never retried.
                warn!(model = %model, "model call timed out, retrying once");
                self.client.generate(&built.prompt, &model, self.timeout).await?
            }
            Err(e) => return Err(e.into()),
        };

        // The answer only counts if the text it ran against is still the
        // session's text. On a mismatch the purge has already happened and
        // the result is discarded.
        if self.store.generation().await != generation {
            return match self.store.get().await {
                Err(SessionError::NotFound) => Err(SessionError::NotFound.into()),
                _ => Err(SessionError::SessionReplaced.into()),
            };
        }

        info!(model = %model, chars = answer.len(), "answer produced");
        Ok(Answer { text: answer, model })
    }

    /// End the session, purging all document state before returning.
    pub async fn end_session(&self) {
        self.store.end_session().await;
        *self.state.lock().await = SessionState::Empty;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Prompt;
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Behavior {
        Answer(String),
        /// Sleep this long before answering.
        SlowAnswer(Duration, String),
        /// Report a timeout on every call.
        Timeout,
        /// Time out on the first call, answer on the second.
        TimeoutThenAnswer(String),
        Unavailable,
        Malformed,
    }

    struct MockClient {
        behavior: Behavior,
        calls: AtomicUsize,
    }

    impl MockClient {
        fn new(behavior: Behavior) -> Arc<Self> {
            Arc::new(Self {
                behavior,
                calls: AtomicUsize::new(0),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl ModelClient for MockClient {
        async fn generate(
            &self,
            _prompt: &Prompt,
            model: &str,
            timeout: Duration,
        ) -> Result<String, ModelError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.behavior {
                Behavior::Answer(text) => Ok(text.clone()),
                Behavior::SlowAnswer(delay, text) => {
                    tokio::time::sleep(*delay).await;
                    Ok(text.clone())
                }
                Behavior::Timeout => Err(ModelError::Timeout(timeout)),
                Behavior::TimeoutThenAnswer(text) => {
                    if call == 0 {
                        Err(ModelError::Timeout(timeout))
                    } else {
                        Ok(text.clone())
                    }
                }
                Behavior::Unavailable => {
                    Err(ModelError::ModelUnavailable(model.to_string()))
                }
                Behavior::Malformed => Err(ModelError::InferenceFailure(
                    "empty output".to_string(),
                )),
            }
        }

        async fn list_models(&self) -> Result<Vec<String>, ModelError> {
            Ok(vec!["mock".to_string()])
        }
    }

    fn orchestrator(client: Arc<MockClient>) -> Orchestrator {
        Orchestrator::new(&Config::default(), client)
    }

    /// Three-paragraph DOCX built in memory.
    fn sample_docx() -> Vec<u8> {
        use docx_rs::{Docx, Paragraph, Run};
        let mut docx = Docx::new();
        for text in [
            "The committee met on Tuesday.",
            "Budget approval was deferred.",
            "The next session is in March.",
        ] {
            docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(text)));
        }
        let mut buf = std::io::Cursor::new(Vec::new());
        docx.build().pack(&mut buf).unwrap();
        buf.into_inner()
    }

    #[tokio::test]
    async fn test_docx_end_to_end() {
        let client = MockClient::new(Behavior::Answer("They met on Tuesday.".to_string()));
        let orchestrator = orchestrator(client);
        orchestrator.select_model("mock").await;

        assert_eq!(orchestrator.state().await, SessionState::Empty);
        orchestrator.upload(sample_docx(), "docx").await.unwrap();
        assert_eq!(orchestrator.state().await, SessionState::DocumentLoaded);

        let answer = orchestrator.ask("when did the committee meet?").await.unwrap();
        assert_eq!(answer.text, "They met on Tuesday.");
        assert_eq!(answer.model, "mock");

        // The extracted text persists after answering; only raw bytes were dropped.
        let (text, _) = orchestrator.store().get().await.unwrap();
        assert_eq!(text.segment_count(), 3);
        assert_eq!(orchestrator.state().await, SessionState::DocumentLoaded);

        orchestrator.end_session().await;
        assert!(matches!(
            orchestrator.store().get().await,
            Err(SessionError::NotFound)
        ));
        assert_eq!(orchestrator.state().await, SessionState::Empty);
    }

    #[tokio::test]
    async fn test_ask_without_document() {
        let client = MockClient::new(Behavior::Answer("unreachable".to_string()));
        let orchestrator = orchestrator(client);
        let err = orchestrator.ask("anything?").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SessionError>(),
            Some(SessionError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_failed_upload_leaves_session_unchanged() {
        let client = MockClient::new(Behavior::Answer("ok".to_string()));
        let orchestrator = orchestrator(client);

        let err = orchestrator.upload(b"{broken".to_vec(), "json").await.unwrap_err();
        assert!(matches!(err, ExtractionError::CorruptDocument(_)));
        assert_eq!(orchestrator.state().await, SessionState::Empty);

        let err = orchestrator.upload(b"data".to_vec(), "csv").await.unwrap_err();
        assert!(matches!(err, ExtractionError::UnsupportedFormat(_)));
    }

    #[tokio::test]
    async fn test_timeout_is_retried_once() {
        let client = MockClient::new(Behavior::TimeoutThenAnswer("late answer".to_string()));
        let orchestrator = orchestrator(client.clone());
        orchestrator.select_model("mock").await;
        orchestrator.upload(b"some text".to_vec(), "txt").await.unwrap();

        let answer = orchestrator.ask("question?").await.unwrap();
        assert_eq!(answer.text, "late answer");
        assert_eq!(client.call_count(), 2);
    }

    #[tokio::test]
    async fn test_persistent_timeout_surfaces_and_keeps_session() {
        let client = MockClient::new(Behavior::Timeout);
        let orchestrator = orchestrator(client.clone());
        orchestrator.select_model("mock").await;
        orchestrator.upload(b"some text".to_vec(), "txt").await.unwrap();

        let err = orchestrator.ask("question?").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ModelError>(),
            Some(ModelError::Timeout(_))
        ));
        // First attempt plus exactly one retry
        assert_eq!(client.call_count(), 2);
        assert_eq!(orchestrator.state().await, SessionState::DocumentLoaded);
    }

    #[tokio::test]
    async fn test_inference_failure_is_not_retried() {
        let client = MockClient::new(Behavior::Malformed);
        let orchestrator = orchestrator(client.clone());
        orchestrator.select_model("mock").await;
        orchestrator.upload(b"some text".to_vec(), "txt").await.unwrap();

        let err = orchestrator.ask("question?").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ModelError>(),
            Some(ModelError::InferenceFailure(_))
        ));
        assert_eq!(client.call_count(), 1);
        assert_eq!(orchestrator.state().await, SessionState::DocumentLoaded);
    }

    #[tokio::test]
    async fn test_model_unavailable_surfaces() {
        let client = MockClient::new(Behavior::Unavailable);
        let orchestrator = orchestrator(client);
        orchestrator.select_model("ghost-model").await;
        orchestrator.upload(b"some text".to_vec(), "txt").await.unwrap();

        let err = orchestrator.ask("question?").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ModelError>(),
            Some(ModelError::ModelUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_replacement_during_query_is_detected() {
        let client = MockClient::new(Behavior::SlowAnswer(
            Duration::from_millis(200),
            "stale answer".to_string(),
        ));
        let orchestrator = Arc::new(orchestrator(client));
        orchestrator.select_model("mock").await;
        orchestrator.upload(b"first document".to_vec(), "txt").await.unwrap();

        let asking = {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move { orchestrator.ask("question?").await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        orchestrator
            .store()
            .put(Document::new(b"second document".to_vec(), DocumentFormat::Txt))
            .await
            .unwrap();

        let err = asking.await.unwrap().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SessionError>(),
            Some(SessionError::SessionReplaced)
        ));
    }

    #[tokio::test]
    async fn test_end_session_during_query_discards_answer() {
        let client = MockClient::new(Behavior::SlowAnswer(
            Duration::from_millis(200),
            "stale answer".to_string(),
        ));
        let orchestrator = Arc::new(orchestrator(client));
        orchestrator.select_model("mock").await;
        orchestrator.upload(b"the document".to_vec(), "txt").await.unwrap();

        let asking = {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move { orchestrator.ask("question?").await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        // Purge happens immediately, mid-query
        orchestrator.store().clear().await;
        assert!(matches!(
            orchestrator.store().get().await,
            Err(SessionError::NotFound)
        ));

        let err = asking.await.unwrap().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SessionError>(),
            Some(SessionError::NotFound)
        ));
    }
}
