//! toolbridge CLI
//!
//! Sends one conversation to an OpenAI-compatible endpoint and prints the
//! reconciled assistant turn as JSON on stdout. Logs go to stderr.

mod args;
mod input;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bridge_core::ChatModel;
use bridge_runtime::{BridgeConfig, OpenAiCompatModel};

use crate::args::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let overrides = cli.overrides();
    let config = BridgeConfig::from_lookup(|key| {
        overrides
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| value.clone())
            .or_else(|| std::env::var(key).ok())
    })
    .context("loading endpoint configuration")?;

    let messages = input::load_messages(&cli.messages)?;
    let tools = input::load_tools(cli.tools.as_deref())?;

    let model = OpenAiCompatModel::new(config).context("creating chat model")?;
    tracing::info!(
        model = model.name(),
        messages = messages.len(),
        tools = tools.len(),
        "Sending conversation"
    );

    let result = match model.generate(&messages, &tools).await {
        Ok(result) => result,
        Err(err) => {
            tracing::error!(kind = ?err.kind(), "{}", err.user_message());
            return Err(err).with_context(|| format!("calling {}", model.config().completions_url()));
        }
    };

    if result.has_tool_calls() {
        for call in result.invocations() {
            tracing::info!(tool = %call.name, id = %call.id, "Received tool call");
        }
    } else if let Some(text) = result.as_text() {
        tracing::info!(chars = text.chars().count(), "Received text response");
    }
    tracing::info!(
        prompt = result.usage.prompt_tokens,
        completion = result.usage.completion_tokens,
        total = result.usage.total_tokens,
        "Token usage"
    );

    let output = if cli.compact {
        serde_json::to_string(&result)?
    } else {
        serde_json::to_string_pretty(&result)?
    };
    println!("{output}");

    Ok(())
}
