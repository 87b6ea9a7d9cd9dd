use anydoc::config::Config;
use anydoc::llm::{ModelClient, OllamaClient};
use anydoc::orchestrator::Orchestrator;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "anydoc")]
#[command(about = "Ask questions about your documents with local Ollama models — nothing is kept")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Ollama server URL (overrides config)
    #[arg(long)]
    ollama_url: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List locally installed Ollama models
    #[command(name = "models")]
    Models,
    /// Ask a single question about a document, then purge the session
    #[command(name = "ask")]
    Ask {
        /// Document to load (pdf, docx, txt or json)
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// The question to ask
        #[arg(value_name = "QUESTION")]
        question: String,
        /// Model to use (overrides config)
        #[arg(long)]
        model: Option<String>,
        /// Model call deadline in seconds (overrides config)
        #[arg(long)]
        timeout: Option<u64>,
    },
    /// Interactive question loop over one document
    #[command(name = "chat")]
    Chat {
        /// Document to load (pdf, docx, txt or json)
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Model to use (overrides config)
        #[arg(long)]
        model: Option<String>,
        /// Model call deadline in seconds (overrides config)
        #[arg(long)]
        timeout: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = Config::load()?;
    if let Some(url) = cli.ollama_url {
        config.ollama.url = url;
    }

    match cli.command {
        Commands::Models => {
            let client = OllamaClient::new(&config.ollama.url);
            let models = client.list_models().await?;
            if models.is_empty() {
                println!("No models installed. Run `ollama pull <model>` first.");
            }
            for model in models {
                println!("{model}");
            }
        }
        Commands::Ask {
            file,
            question,
            model,
            timeout,
        } => {
            apply_overrides(&mut config, model, timeout);
            let orchestrator = build_orchestrator(&config);
            load_document(&orchestrator, &config, &file).await?;

            let result = orchestrator.ask(&question).await;
            // The session is purged before anything is reported.
            orchestrator.end_session().await;
            let answer = result?;
            println!("{}", answer.text);
        }
        Commands::Chat {
            file,
            model,
            timeout,
        } => {
            apply_overrides(&mut config, model, timeout);
            let orchestrator = build_orchestrator(&config);
            load_document(&orchestrator, &config, &file).await?;
            println!("Document loaded. Empty question ends the session.");

            chat_loop(&orchestrator, || {
                let question: String = dialoguer::Input::new()
                    .with_prompt("question")
                    .allow_empty(true)
                    .interact_text()?;
                Ok(question)
            })
            .await;
            orchestrator.end_session().await;
            println!("Session ended, document purged.");
        }
    }

    Ok(())
}

fn apply_overrides(config: &mut Config, model: Option<String>, timeout: Option<u64>) {
    if let Some(model) = model {
        config.ollama.model = model;
    }
    if let Some(timeout) = timeout {
        config.ollama.timeout_secs = timeout;
    }
}

fn build_orchestrator(config: &Config) -> Orchestrator {
    let client = Arc::new(OllamaClient::new(&config.ollama.url));
    Orchestrator::new(config, client)
}

/// Run questions against the session until the source yields an empty
/// question or fails. A failing source (end of stdin, closed pipe) counts as
/// a disconnect and ends the loop normally, so the caller's `end_session`
/// still runs; input errors never propagate past this function.
async fn chat_loop<F>(orchestrator: &Orchestrator, mut next_question: F)
where
    F: FnMut() -> Result<String>,
{
    loop {
        let question = match next_question() {
            Ok(question) => question.trim().to_string(),
            Err(e) => {
                eprintln!("input closed: {e:#}");
                break;
            }
        };
        if question.is_empty() {
            break;
        }
        match orchestrator.ask(&question).await {
            Ok(answer) => println!("\n{}\n", answer.text),
            Err(e) => eprintln!("error: {e:#}"),
        }
    }
}

async fn load_document(orchestrator: &Orchestrator, config: &Config, file: &Path) -> Result<()> {
    orchestrator.select_model(&config.ollama.model).await;
    let tag = file
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .context("file has no extension; cannot determine its format")?;
    let bytes =
        std::fs::read(file).with_context(|| format!("Failed to read file: {}", file.display()))?;
    orchestrator.upload(bytes, &tag).await?;
    Ok(())
}
