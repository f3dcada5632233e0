//! # bridge-core
//!
//! Protocol core of toolbridge: translates role-tagged conversations and tool
//! specifications into an OpenAI-style chat-completion request, and
//! reconciles the response back into text or tool invocations.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        ChatModel                              │
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────────────┐  │
//! │  │    wire     │   │  transport  │   │     reconcile       │  │
//! │  │ (messages,  │──▶│  (runtime   │──▶│ (structured calls,  │  │
//! │  │   tools)    │   │   crate)    │   │  text fallback)     │  │
//! │  └─────────────┘   └─────────────┘   └─────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! This crate does no I/O. The HTTP transport lives in `bridge-runtime`.

pub mod error;
pub mod message;
pub mod provider;
pub mod reconcile;
pub mod tool;
pub mod usage;
pub mod wire;

pub use error::{BridgeError, ErrorKind, Result};
pub use message::{ConversationMessage, Role};
pub use provider::{ChatModel, GenerationContent, GenerationOptions, GenerationResult};
pub use reconcile::{
    DEFAULT_MATCH_THRESHOLD, DEFAULT_MAX_NESTING_DEPTH, ReconcileConfig, Reconciler,
};
pub use tool::{ToolInvocation, ToolParameters, ToolSpecification};
pub use usage::TokenUsage;
pub use wire::ChatRequest;
