//! Error Types

use thiserror::Error;

/// Result type alias for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Boxed underlying cause of a transport failure
pub type BoxedCause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Bridge error types
///
/// Every failure of a bridge call surfaces as one of these variants with the
/// underlying cause preserved. The bridge never retries; see
/// [`BridgeError::is_transport`] for callers that implement their own policy.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Connection failure, timeout, or non-2xx response
    #[error("Transport error: {message}")]
    Transport {
        message: String,
        /// HTTP status, when the server answered at all
        status: Option<u16>,
        #[source]
        source: Option<BoxedCause>,
    },

    /// Response body is not valid JSON
    #[error("Wire parse error: {0}")]
    WireParse(#[source] serde_json::Error),

    /// Valid JSON with the wrong shape, or a malformed outgoing message
    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Outgoing request could not be encoded
    #[error("Serialization error: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Coarse classification of a [`BridgeError`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    WireParse,
    ProtocolViolation,
    Config,
}

impl BridgeError {
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::ProtocolViolation(msg.into())
    }

    pub fn transport(msg: impl Into<String>, status: Option<u16>) -> Self {
        Self::Transport {
            message: msg.into(),
            status,
            source: None,
        }
    }

    /// Attach the underlying cause to a transport error
    #[must_use]
    pub fn with_source(self, cause: impl Into<BoxedCause>) -> Self {
        match self {
            Self::Transport { message, status, .. } => Self::Transport {
                message,
                status,
                source: Some(cause.into()),
            },
            other => other,
        }
    }

    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport { .. } => ErrorKind::Transport,
            Self::WireParse(_) => ErrorKind::WireParse,
            Self::ProtocolViolation(_) | Self::Serialize(_) => ErrorKind::ProtocolViolation,
            Self::Config(_) => ErrorKind::Config,
        }
    }

    /// Check if error came from the transport (connection, timeout, status)
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// HTTP status of a transport error, if one was received
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => *status,
            _ => None,
        }
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            Self::Transport { status: Some(code), .. } => {
                format!("The AI service answered with HTTP {code}. Please try again.")
            }
            Self::Transport { .. } => {
                "The AI service is currently unavailable. Please try again.".into()
            }
            Self::WireParse(_) | Self::ProtocolViolation(_) => {
                "The AI service returned a response that could not be understood.".into()
            }
            Self::Config(msg) => format!("The AI service is misconfigured: {msg}"),
            Self::Serialize(_) => "The request could not be encoded.".into(),
        }
    }
}
