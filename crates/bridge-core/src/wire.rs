//! Wire Request Encoding
//!
//! Maps conversation messages and tool specifications onto the
//! OpenAI-style `chat/completions` request body.

use std::collections::HashSet;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{BridgeError, Result};
use crate::message::{ConversationMessage, Role};
use crate::provider::GenerationOptions;
use crate::tool::{ToolInvocation, ToolSpecification};

const FUNCTION_TYPE: &str = "function";
const DEFAULT_SCHEMA_TYPE: &str = "object";

/// Complete request body
#[derive(Clone, Debug, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<WireMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
    pub seed: i64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<WireTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

/// One message as the endpoint sees it
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WireMessage {
    pub role: Role,
    /// Serialized as `null` when absent
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<WireToolCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WireToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub call_type: &'static str,
    pub function: WireFunctionCall,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WireFunctionCall {
    pub name: String,
    /// Raw argument JSON text
    pub arguments: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WireTool {
    #[serde(rename = "type")]
    pub tool_type: &'static str,
    pub function: WireFunction,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WireFunction {
    pub name: String,
    pub description: String,
    pub parameters: WireParameters,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WireParameters {
    #[serde(rename = "type")]
    pub schema_type: String,
    pub properties: Map<String, Value>,
    pub required: Vec<String>,
}

impl ChatRequest {
    /// Build the request body for one call.
    ///
    /// Fails with `ProtocolViolation` on an assistant message with neither
    /// content nor tool calls, or on duplicate tool names.
    pub fn build(
        messages: &[ConversationMessage],
        tools: &[ToolSpecification],
        options: &GenerationOptions,
    ) -> Result<Self> {
        let messages = messages
            .iter()
            .map(WireMessage::from_message)
            .collect::<Result<Vec<_>>>()?;

        let mut seen = HashSet::with_capacity(tools.len());
        for spec in tools {
            if !seen.insert(spec.name.as_str()) {
                return Err(BridgeError::protocol(format!(
                    "duplicate tool name '{}'",
                    spec.name
                )));
            }
        }
        let tools: Vec<WireTool> = tools.iter().map(WireTool::from_spec).collect();

        if tools.is_empty() {
            tracing::debug!("No tools provided to the model");
        } else {
            let names: Vec<&str> = tools.iter().map(|t| t.function.name.as_str()).collect();
            tracing::info!(count = tools.len(), tools = ?names, "Sending tools to the model");
        }

        Ok(Self {
            model: options.model.clone(),
            messages,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            top_p: options.top_p,
            frequency_penalty: options.frequency_penalty,
            presence_penalty: options.presence_penalty,
            seed: options.seed,
            tools,
            metadata: options.metadata.clone(),
        })
    }

    /// Encode as a JSON value
    pub fn to_value(&self) -> Result<Value> {
        serde_json::to_value(self).map_err(BridgeError::Serialize)
    }
}

impl WireMessage {
    pub fn from_message(message: &ConversationMessage) -> Result<Self> {
        let wire = match message {
            ConversationMessage::System { content } => Self::plain(Role::System, content),
            ConversationMessage::User { content } => Self::plain(Role::User, content),
            ConversationMessage::Assistant {
                content,
                tool_invocations,
            } if !tool_invocations.is_empty() => Self {
                role: Role::Assistant,
                content: content.clone().filter(|c| !c.is_empty()),
                tool_calls: tool_invocations.iter().map(WireToolCall::from_invocation).collect(),
                tool_call_id: None,
            },
            ConversationMessage::Assistant { content, .. } => match content {
                Some(text) if !text.is_empty() => Self::plain(Role::Assistant, text),
                _ => {
                    return Err(BridgeError::protocol(
                        "assistant message has neither content nor tool calls",
                    ));
                }
            },
            ConversationMessage::Tool {
                tool_call_id,
                content,
            } => Self {
                role: Role::Tool,
                content: Some(content.clone()),
                tool_calls: Vec::new(),
                tool_call_id: Some(tool_call_id.clone()),
            },
        };
        Ok(wire)
    }

    fn plain(role: Role, content: &str) -> Self {
        Self {
            role,
            content: Some(content.to_string()),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }
}

impl WireToolCall {
    fn from_invocation(invocation: &ToolInvocation) -> Self {
        Self {
            id: invocation.id.clone(),
            call_type: FUNCTION_TYPE,
            function: WireFunctionCall {
                name: invocation.name.clone(),
                arguments: invocation.arguments.clone(),
            },
        }
    }
}

impl WireTool {
    /// Fill in the defaults the endpoint needs even for parameterless tools
    pub fn from_spec(spec: &ToolSpecification) -> Self {
        let parameters = spec.parameters.as_ref().map_or_else(
            || WireParameters {
                schema_type: DEFAULT_SCHEMA_TYPE.into(),
                properties: Map::new(),
                required: Vec::new(),
            },
            |p| WireParameters {
                schema_type: p
                    .schema_type
                    .clone()
                    .unwrap_or_else(|| DEFAULT_SCHEMA_TYPE.into()),
                properties: p.properties.clone(),
                required: p.required.clone(),
            },
        );

        Self {
            tool_type: FUNCTION_TYPE,
            function: WireFunction {
                name: spec.name.clone(),
                description: spec.description.clone().unwrap_or_default(),
                parameters,
            },
        }
    }
}
