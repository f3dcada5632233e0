//! Chat Model Abstraction
//!
//! Defines the single entry point of the bridge: a [`ChatModel`] turns a
//! conversation plus the advertised tools into one [`GenerationResult`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bridge_core::provider::ChatModel;
//!
//! let model = OpenAiCompatModel::from_env()?;
//! let result = model.generate(&messages, &tools).await?;
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::message::ConversationMessage;
use crate::tool::{ToolInvocation, ToolSpecification};
use crate::usage::TokenUsage;

/// Sampling parameters sent with every request
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Model identifier understood by the remote endpoint
    pub model: String,

    /// Temperature for sampling (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Top-p nucleus sampling
    #[serde(default = "default_top_p")]
    pub top_p: f32,

    #[serde(default = "default_frequency_penalty")]
    pub frequency_penalty: f32,

    #[serde(default = "default_presence_penalty")]
    pub presence_penalty: f32,

    /// Sampling seed, -1 lets the server choose
    #[serde(default = "default_seed")]
    pub seed: i64,

    /// Passthrough fields sent as the request `metadata` object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

pub(crate) const fn default_temperature() -> f32 { 0.1 }
pub(crate) const fn default_max_tokens() -> u32 { 1500 }
pub(crate) const fn default_top_p() -> f32 { 0.9 }
pub(crate) const fn default_frequency_penalty() -> f32 { 0.5 }
pub(crate) const fn default_presence_penalty() -> f32 { 0.3 }
pub(crate) const fn default_seed() -> i64 { -1 }

impl GenerationOptions {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            top_p: default_top_p(),
            frequency_penalty: default_frequency_penalty(),
            presence_penalty: default_presence_penalty(),
            seed: default_seed(),
            metadata: None,
        }
    }

    /// Attach credentials the endpoint expects in `metadata`
    #[must_use]
    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        let metadata = self.metadata.get_or_insert_with(Map::new);
        metadata.insert("username".into(), Value::String(username.into()));
        metadata.insert("pwd".into(), Value::String(password.into()));
        self
    }
}

/// What the assistant produced
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GenerationContent {
    /// Plain text answer
    Text { content: String },
    /// Structured (or reconstructed) tool invocations, in order
    ToolCalls { invocations: Vec<ToolInvocation> },
}

/// Response from one bridge call
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    #[serde(flatten)]
    pub content: GenerationContent,

    /// Token usage statistics (all zero when the server omitted them)
    pub usage: TokenUsage,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,

    /// Model name reported by the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl GenerationResult {
    pub fn text(content: impl Into<String>, usage: TokenUsage) -> Self {
        Self {
            content: GenerationContent::Text {
                content: content.into(),
            },
            usage,
            finish_reason: None,
            model: None,
        }
    }

    pub fn tool_calls(invocations: Vec<ToolInvocation>, usage: TokenUsage) -> Self {
        Self {
            content: GenerationContent::ToolCalls { invocations },
            usage,
            finish_reason: None,
            model: None,
        }
    }

    pub const fn has_tool_calls(&self) -> bool {
        matches!(self.content, GenerationContent::ToolCalls { .. })
    }

    /// Text content, if this is a plain-text result
    pub fn as_text(&self) -> Option<&str> {
        match &self.content {
            GenerationContent::Text { content } => Some(content.as_str()),
            GenerationContent::ToolCalls { .. } => None,
        }
    }

    /// Tool invocations (empty for a plain-text result)
    pub fn invocations(&self) -> &[ToolInvocation] {
        match &self.content {
            GenerationContent::ToolCalls { invocations } => invocations.as_slice(),
            GenerationContent::Text { .. } => &[],
        }
    }

    /// Turn the result into the assistant turn to append to history
    pub fn into_message(self) -> ConversationMessage {
        match self.content {
            GenerationContent::Text { content } => ConversationMessage::assistant(content),
            GenerationContent::ToolCalls { invocations } => {
                ConversationMessage::assistant_with_tool_calls(invocations)
            }
        }
    }
}

/// Bridge to a remote chat-completion endpoint
///
/// Implementations hold only read-only configuration and are safe to share
/// across concurrent calls.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Short identifier for logs (e.g. the model name)
    fn name(&self) -> &str;

    /// Generate one assistant turn; an empty `tools` slice sends no tools
    async fn generate(
        &self,
        messages: &[ConversationMessage],
        tools: &[ToolSpecification],
    ) -> Result<GenerationResult>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_options_defaults() {
        let opts = GenerationOptions::new("gpt-4o");
        assert!((opts.temperature - 0.1).abs() < f32::EPSILON);
        assert_eq!(opts.max_tokens, 1500);
        assert_eq!(opts.seed, -1);
        assert!(opts.metadata.is_none());
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let opts: GenerationOptions = serde_json::from_str(r#"{"model": "m", "top_p": 0.5}"#).unwrap();
        assert_eq!(opts.model, "m");
        assert!((opts.top_p - 0.5).abs() < f32::EPSILON);
        assert_eq!(opts.max_tokens, 1500);
    }

    #[test]
    fn test_credentials_metadata() {
        let opts = GenerationOptions::new("m").with_credentials("alice", "secret");
        let metadata = opts.metadata.unwrap();
        assert_eq!(metadata["username"], "alice");
        assert_eq!(metadata["pwd"], "secret");
    }

    #[test]
    fn test_result_serialization() {
        let result = GenerationResult::tool_calls(
            vec![ToolInvocation::new("call_1", "ping", "{}")],
            TokenUsage::new(3, 4),
        );
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["kind"], "tool_calls");
        assert_eq!(value["invocations"][0]["name"], "ping");
        assert_eq!(value["usage"]["total_tokens"], 7);
    }

    #[test]
    fn test_has_tool_calls() {
        let calls = GenerationResult::tool_calls(vec![ToolInvocation::new("call_1", "ping", "{}")], TokenUsage::default());
        assert!(calls.has_tool_calls());
        assert!(!GenerationResult::text("hello", TokenUsage::default()).has_tool_calls());
    }

    #[test]
    fn test_into_message() {
        let result = GenerationResult::text("hello", TokenUsage::default());
        assert_eq!(result.as_text(), Some("hello"));
        assert!(result.invocations().is_empty());

        let message = result.into_message();
        assert_eq!(message.content(), Some("hello"));
    }
}
