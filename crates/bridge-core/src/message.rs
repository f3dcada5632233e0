//! Conversation Messages
//!
//! Role-tagged conversation turns as handed to the bridge by the
//! orchestration layer.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BridgeError;
use crate::tool::ToolInvocation;

/// Role of a message sender
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System prompt/instructions
    System,
    /// User input
    User,
    /// Assistant (LLM) response
    Assistant,
    /// Tool result answering an earlier invocation
    Tool,
}

impl Role {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "system" => Ok(Self::System),
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            "tool" => Ok(Self::Tool),
            other => Err(BridgeError::protocol(format!("unknown message role '{other}'"))),
        }
    }
}

/// A single message in a conversation
///
/// Deserializes from `{role, content?, tool_calls?, tool_call_id?}` records;
/// an unknown role is rejected rather than coerced.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "MessageRecord", into = "MessageRecord")]
pub enum ConversationMessage {
    System {
        content: String,
    },
    User {
        content: String,
    },
    Assistant {
        content: Option<String>,
        tool_invocations: Vec<ToolInvocation>,
    },
    Tool {
        /// ID of the invocation this message answers
        tool_call_id: String,
        content: String,
    },
}

impl ConversationMessage {
    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::System {
            content: content.into(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::User {
            content: content.into(),
        }
    }

    /// Create a plain-text assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant {
            content: Some(content.into()),
            tool_invocations: Vec::new(),
        }
    }

    /// Create an assistant message that requested tool calls
    pub fn assistant_with_tool_calls(invocations: Vec<ToolInvocation>) -> Self {
        Self::Assistant {
            content: None,
            tool_invocations: invocations,
        }
    }

    /// Create a tool result message
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::Tool {
            tool_call_id: tool_call_id.into(),
            content: content.into(),
        }
    }

    pub const fn role(&self) -> Role {
        match self {
            Self::System { .. } => Role::System,
            Self::User { .. } => Role::User,
            Self::Assistant { .. } => Role::Assistant,
            Self::Tool { .. } => Role::Tool,
        }
    }

    pub fn content(&self) -> Option<&str> {
        match self {
            Self::System { content } | Self::User { content } | Self::Tool { content, .. } => {
                Some(content.as_str())
            }
            Self::Assistant { content, .. } => content.as_deref(),
        }
    }

    /// Tool invocations carried by an assistant message (empty otherwise)
    pub fn tool_invocations(&self) -> &[ToolInvocation] {
        match self {
            Self::Assistant {
                tool_invocations, ..
            } => tool_invocations.as_slice(),
            _ => &[],
        }
    }

    pub fn tool_call_id(&self) -> Option<&str> {
        match self {
            Self::Tool { tool_call_id, .. } => Some(tool_call_id.as_str()),
            _ => None,
        }
    }
}

/// Flat storage form of a message
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct MessageRecord {
    role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<ToolInvocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl TryFrom<MessageRecord> for ConversationMessage {
    type Error = BridgeError;

    fn try_from(record: MessageRecord) -> Result<Self, Self::Error> {
        let message = match record.role.parse::<Role>()? {
            Role::System => Self::System {
                content: record.content.unwrap_or_default(),
            },
            Role::User => Self::User {
                content: record.content.unwrap_or_default(),
            },
            Role::Assistant => Self::Assistant {
                content: record.content,
                tool_invocations: record.tool_calls,
            },
            Role::Tool => Self::Tool {
                tool_call_id: record.tool_call_id.ok_or_else(|| {
                    BridgeError::protocol("tool message is missing tool_call_id")
                })?,
                content: record.content.unwrap_or_default(),
            },
        };
        Ok(message)
    }
}

impl From<ConversationMessage> for MessageRecord {
    fn from(message: ConversationMessage) -> Self {
        let role = message.role().as_str().to_string();
        match message {
            ConversationMessage::System { content } | ConversationMessage::User { content } => {
                Self {
                    role,
                    content: Some(content),
                    ..Default::default()
                }
            }
            ConversationMessage::Assistant {
                content,
                tool_invocations,
            } => Self {
                role,
                content,
                tool_calls: tool_invocations,
                tool_call_id: None,
            },
            ConversationMessage::Tool {
                tool_call_id,
                content,
            } => Self {
                role,
                content: Some(content),
                tool_calls: Vec::new(),
                tool_call_id: Some(tool_call_id),
            },
        }
    }
}
