//! Conversation and tool files

use std::path::Path;

use anyhow::{Context, Result};
use bridge_core::{ConversationMessage, ToolSpecification};

pub fn load_messages(path: &Path) -> Result<Vec<ConversationMessage>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading messages from {}", path.display()))?;
    let messages: Vec<ConversationMessage> = serde_json::from_str(&raw)
        .with_context(|| format!("parsing messages in {}", path.display()))?;
    anyhow::ensure!(!messages.is_empty(), "{} contains no messages", path.display());
    Ok(messages)
}

pub fn load_tools(path: Option<&Path>) -> Result<Vec<ToolSpecification>> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading tools from {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing tools in {}", path.display()))
}
