pub mod config;
pub mod error;
pub mod extractor;
pub mod llm;
pub mod models;
pub mod orchestrator;
pub mod prompt;
pub mod purge;
pub mod session;

pub use config::Config;
pub use error::{ExtractionError, ModelError, SessionError};
pub use llm::{ModelClient, OllamaClient};
pub use models::{Answer, Document, DocumentFormat, ExtractedText, Prompt, Segment, SegmentSource};
pub use orchestrator::{Orchestrator, SessionState};
pub use prompt::{BuiltPrompt, PromptBuilder};
pub use session::SessionStore;
