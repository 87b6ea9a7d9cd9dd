use std::time::Duration;

use crate::error::ModelError;
use crate::models::Prompt;

/// Trait for clients of the local inference backend
#[async_trait::async_trait]
pub trait ModelClient: Send + Sync {
    /// Submit a prompt to the named model and return the generated text.
    /// Every call carries a deadline; implementations must never wait on the
    /// backend unboundedly.
    async fn generate(
        &self,
        prompt: &Prompt,
        model: &str,
        timeout: Duration,
    ) -> Result<String, ModelError>;

    /// List the models installed on the local backend
    async fn list_models(&self) -> Result<Vec<String>, ModelError>;
}
