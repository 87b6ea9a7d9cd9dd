use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration loaded from settings.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ollama: OllamaConfig,
    #[serde(default)]
    pub prompt: PromptConfig,
    #[serde(default)]
    pub extract: ExtractConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    pub url: String,
    pub model: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:11434".to_string(),
            model: "llama3.2".to_string(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    /// Maximum characters of document text per prompt.
    #[serde(default = "default_context_budget")]
    pub context_budget: usize,
    /// How many of the most recent segments to keep when truncating.
    #[serde(default = "default_keep_recent")]
    pub keep_recent_segments: usize,
    /// Instruction preamble placed before the document text.
    #[serde(default = "default_preamble")]
    pub preamble: String,
}

fn default_context_budget() -> usize {
    8_000
}

fn default_keep_recent() -> usize {
    8
}

fn default_preamble() -> String {
    "You are an expert Document Analysis Assistant. \
     You have been given the content of one or more documents. \
     Answer the user's questions based solely on that content. \
     If the answer cannot be found in the documents, say so clearly."
        .to_string()
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            context_budget: default_context_budget(),
            keep_recent_segments: default_keep_recent(),
            preamble: default_preamble(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Plain text files larger than this are split on blank-line boundaries.
    #[serde(default = "default_txt_split_threshold")]
    pub txt_split_threshold: usize,
}

fn default_txt_split_threshold() -> usize {
    16 * 1024
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            txt_split_threshold: default_txt_split_threshold(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Load configuration from default locations or return defaults
    pub fn load() -> Result<Self> {
        let default_paths = [
            PathBuf::from("config/settings.toml"),
            PathBuf::from("./settings.toml"),
        ];

        for path in &default_paths {
            if path.exists() {
                return Self::from_file(path);
            }
        }

        Ok(Self::default())
    }
}
