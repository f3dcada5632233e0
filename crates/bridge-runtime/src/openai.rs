//! OpenAI-Compatible Chat Model
//!
//! Implementation of `ChatModel` for any endpoint speaking the
//! `chat/completions` wire format.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::Value;

use bridge_core::{
    BridgeError, ChatModel, ChatRequest, ConversationMessage, GenerationResult, Reconciler,
    Result, ToolSpecification, reconcile::parse_body,
};

use crate::config::BridgeConfig;

/// Longest slice of an error body kept in a transport error message
const ERROR_BODY_EXCERPT: usize = 512;

/// Chat model backed by an OpenAI-compatible HTTP endpoint
///
/// Holds only read-only state; share it behind an `Arc` across tasks.
pub struct OpenAiCompatModel {
    client: reqwest::Client,
    config: BridgeConfig,
    reconciler: Reconciler,
    url: String,
}

impl OpenAiCompatModel {
    /// Create from configuration
    pub fn new(config: BridgeConfig) -> Result<Self> {
        config.validate()?;

        if config.accept_invalid_certs {
            tracing::warn!(url = %config.base_url, "TLS certificate verification is disabled");
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| BridgeError::Config(format!("failed to build HTTP client: {e}")))?;

        let reconciler = Reconciler::new(config.reconcile);
        tracing::debug!(
            threshold = reconciler.config().match_threshold,
            max_depth = reconciler.config().max_nesting_depth,
            "Reconciler configured"
        );

        Ok(Self {
            client,
            reconciler,
            url: config.completions_url(),
            config,
        })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(BridgeConfig::from_env()?)
    }

    pub const fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// POST the request and parse the JSON body
    async fn send(&self, request: &ChatRequest) -> Result<Value> {
        let body = serde_json::to_vec(request).map_err(BridgeError::Serialize)?;

        tracing::debug!(url = %self.url, bytes = body.len(), "Calling completion endpoint");

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.config.api_key)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .body(body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let text = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Completion endpoint returned an error status");
            return Err(BridgeError::transport(
                format!("HTTP {status}: {}", excerpt(&text)),
                Some(status.as_u16()),
            ));
        }

        parse_body(&text)
    }
}

#[async_trait]
impl ChatModel for OpenAiCompatModel {
    fn name(&self) -> &str {
        &self.config.generation.model
    }

    async fn generate(
        &self,
        messages: &[ConversationMessage],
        tools: &[ToolSpecification],
    ) -> Result<GenerationResult> {
        let request = ChatRequest::build(messages, tools, &self.config.generation)?;
        let response = self.send(&request).await?;
        self.reconciler.reconcile(&response, tools)
    }
}

fn transport_error(e: reqwest::Error) -> BridgeError {
    let message = if e.is_timeout() {
        "request timed out".to_string()
    } else if e.is_connect() {
        "connection failed".to_string()
    } else {
        e.to_string()
    };
    let status = e.status().map(|s| s.as_u16());
    BridgeError::transport(message, status).with_source(e)
}

fn excerpt(body: &str) -> &str {
    if body.len() <= ERROR_BODY_EXCERPT {
        return body;
    }
    let mut end = ERROR_BODY_EXCERPT;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
