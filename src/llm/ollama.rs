use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ModelError;
use crate::llm::r#trait::ModelClient;
use crate::models::Prompt;

/// Deadline for the model listing call; it only hits local metadata.
const LIST_MODELS_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for a locally running Ollama server, reached over its HTTP API
/// (`/api/chat` for generation, `/api/tags` for the installed model list).
/// Model download and lifecycle stay outside this crate.
pub struct OllamaClient {
    base_url: String,
    client: reqwest::Client,
}

impl OllamaClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[derive(Deserialize)]
struct TagsResponse {
    models: Vec<TagModel>,
}

#[derive(Deserialize)]
struct TagModel {
    name: String,
}

#[async_trait::async_trait]
impl ModelClient for OllamaClient {
    async fn generate(
        &self,
        prompt: &Prompt,
        model: &str,
        timeout: Duration,
    ) -> Result<String, ModelError> {
        let url = format!("{}/api/chat", self.base_url);
        let request = ChatRequest {
            model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: prompt.system.clone(),
                },
                ChatMessage {
                    role: "user",
                    content: format!(
                        "Here are the document contents you should reference:\n\n{}",
                        prompt.context
                    ),
                },
                ChatMessage {
                    role: "user",
                    content: prompt.question.clone(),
                },
            ],
            stream: false,
        };

        let started = Instant::now();
        let call = async {
            let response = self
                .client
                .post(&url)
                .json(&request)
                .send()
                .await
                .map_err(|e| {
                    ModelError::ModelUnavailable(format!(
                        "cannot reach Ollama at {}: {e}",
                        self.base_url
                    ))
                })?;

            if response.status() == reqwest::StatusCode::NOT_FOUND {
                return Err(ModelError::ModelUnavailable(format!(
                    "model '{model}' is not installed (run `ollama pull {model}`)"
                )));
            }
            if !response.status().is_success() {
                return Err(ModelError::InferenceFailure(format!(
                    "Ollama returned HTTP {}",
                    response.status()
                )));
            }

            let body: ChatResponse = response.json().await.map_err(|e| {
                ModelError::InferenceFailure(format!("malformed response body: {e}"))
            })?;
            Ok::<String, ModelError>(body.message.content)
        };

        let answer = tokio::time::timeout(timeout, call)
            .await
            .map_err(|_| ModelError::Timeout(timeout))??;

        let answer = answer.trim().to_string();
        if answer.is_empty() {
            return Err(ModelError::InferenceFailure(
                "backend returned empty output".to_string(),
            ));
        }

        debug!(
            model,
            elapsed_ms = started.elapsed().as_millis() as u64,
            chars = answer.len(),
            "model answered"
        );
        Ok(answer)
    }

    async fn list_models(&self) -> Result<Vec<String>, ModelError> {
        let url = format!("{}/api/tags", self.base_url);
        let call = async {
            let response = self.client.get(&url).send().await.map_err(|e| {
                ModelError::ModelUnavailable(format!(
                    "cannot reach Ollama at {}: {e}",
                    self.base_url
                ))
            })?;

            if !response.status().is_success() {
                return Err(ModelError::InferenceFailure(format!(
                    "Ollama returned HTTP {}",
                    response.status()
                )));
            }

            let body: TagsResponse = response.json().await.map_err(|e| {
                ModelError::InferenceFailure(format!("malformed model list: {e}"))
            })?;
            Ok::<Vec<String>, ModelError>(body.models.into_iter().map(|m| m.name).collect())
        };

        tokio::time::timeout(LIST_MODELS_TIMEOUT, call)
            .await
            .map_err(|_| ModelError::Timeout(LIST_MODELS_TIMEOUT))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = OllamaClient::new("http://127.0.0.1:11434/");
        assert_eq!(client.base_url(), "http://127.0.0.1:11434");
    }

    #[test]
    fn test_chat_request_shape() {
        let request = ChatRequest {
            model: "phi3:mini",
            messages: vec![ChatMessage {
                role: "system",
                content: "preamble".to_string(),
            }],
            stream: false,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "phi3:mini");
        assert_eq!(json["stream"], false);
        assert_eq!(json["messages"][0]["role"], "system");
    }
}
