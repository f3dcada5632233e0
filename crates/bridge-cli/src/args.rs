//! CLI argument definitions

use std::path::PathBuf;

use clap::Parser;

/// CLI arguments for toolbridge
#[derive(Parser, Debug)]
#[command(name = "toolbridge")]
#[command(author, version, about = "Send a conversation to an OpenAI-compatible endpoint and reconcile tool calls")]
#[command(long_about = r#"
Sends one conversation to an OpenAI-compatible chat/completions endpoint and
prints the assistant turn as JSON: either plain text or tool invocations,
including calls recovered from text when the model skipped the tool_calls field.

Endpoint settings come from TOOLBRIDGE_* environment variables (a .env file in
the working directory is loaded first); the flags below override them.

Example:
  toolbridge --messages history.json --tools tools.json
"#)]
pub struct Cli {
    /// JSON file with the conversation: [{"role": "...", "content": "..."}, ...]
    #[arg(short = 'i', long, value_name = "PATH")]
    pub messages: PathBuf,

    /// JSON file with tool specifications: [{"name": "...", "parameters": {...}}, ...]
    #[arg(short, long, value_name = "PATH")]
    pub tools: Option<PathBuf>,

    /// Endpoint base URL (overrides TOOLBRIDGE_BASE_URL)
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Model name (overrides TOOLBRIDGE_MODEL)
    #[arg(short, long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Sampling temperature (overrides TOOLBRIDGE_TEMPERATURE)
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Request timeout in seconds (overrides TOOLBRIDGE_TIMEOUT_SECS)
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Print single-line JSON instead of pretty output
    #[arg(long)]
    pub compact: bool,
}

impl Cli {
    /// Flag values keyed by the environment variable they replace
    pub fn overrides(&self) -> Vec<(&'static str, String)> {
        let mut overrides = Vec::new();
        if let Some(url) = &self.base_url {
            overrides.push(("TOOLBRIDGE_BASE_URL", url.clone()));
        }
        if let Some(model) = &self.model {
            overrides.push(("TOOLBRIDGE_MODEL", model.clone()));
        }
        if let Some(temperature) = self.temperature {
            overrides.push(("TOOLBRIDGE_TEMPERATURE", temperature.to_string()));
        }
        if let Some(timeout) = self.timeout {
            overrides.push(("TOOLBRIDGE_TIMEOUT_SECS", timeout.to_string()));
        }
        overrides
    }
}
