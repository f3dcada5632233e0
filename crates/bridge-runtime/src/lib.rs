//! # bridge-runtime
//!
//! HTTP transport for the toolbridge protocol bridge.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bridge_runtime::OpenAiCompatModel;
//! use bridge_core::{ChatModel, ConversationMessage};
//!
//! let model = OpenAiCompatModel::from_env()?;
//! let result = model
//!     .generate(&[ConversationMessage::user("Hello")], &[])
//!     .await?;
//! ```

pub mod config;
pub mod openai;

pub use config::{BridgeConfig, DEFAULT_TIMEOUT_SECS};
pub use openai::OpenAiCompatModel;

// Re-export core types for convenience
pub use bridge_core::{
    BridgeError, ChatModel, ConversationMessage, GenerationContent, GenerationResult, Result,
    Role, TokenUsage, ToolInvocation, ToolParameters, ToolSpecification,
};
