pub mod ollama;
pub mod r#trait;

pub use ollama::OllamaClient;
pub use r#trait::ModelClient;
