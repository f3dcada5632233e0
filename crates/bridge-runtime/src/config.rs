//! Bridge Configuration
//!
//! Endpoint, credentials, and sampling parameters, read from `TOOLBRIDGE_*`
//! environment variables.

use std::str::FromStr;
use std::time::Duration;

use bridge_core::{BridgeError, GenerationOptions, ReconcileConfig, Result};

/// Default request timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

const COMPLETIONS_PATH: &str = "chat/completions";

/// Configuration of one OpenAI-compatible endpoint
#[derive(Clone)]
pub struct BridgeConfig {
    /// Base URL, e.g. `https://llm.internal/v1`
    pub base_url: String,

    /// Bearer token
    pub api_key: String,

    /// Sampling parameters and metadata passthrough
    pub generation: GenerationOptions,

    /// Whole-request timeout in seconds
    pub timeout_secs: u64,

    /// Skip TLS certificate verification (self-signed internal endpoints)
    pub accept_invalid_certs: bool,

    /// Fallback extraction tunables
    pub reconcile: ReconcileConfig,
}

impl BridgeConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            generation: GenerationOptions::new(model),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            accept_invalid_certs: false,
            reconcile: ReconcileConfig::default(),
        }
    }

    /// Load from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup (the environment in production)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| BridgeError::Config(format!("{key} is not set")))
        };

        let mut config = Self::new(
            required("TOOLBRIDGE_BASE_URL")?,
            required("TOOLBRIDGE_API_KEY")?,
            required("TOOLBRIDGE_MODEL")?,
        );

        let generation = &mut config.generation;
        if let Some(v) = parsed(&lookup, "TOOLBRIDGE_TEMPERATURE")? {
            generation.temperature = v;
        }
        if let Some(v) = parsed(&lookup, "TOOLBRIDGE_MAX_TOKENS")? {
            generation.max_tokens = v;
        }
        if let Some(v) = parsed(&lookup, "TOOLBRIDGE_TOP_P")? {
            generation.top_p = v;
        }
        if let Some(v) = parsed(&lookup, "TOOLBRIDGE_FREQUENCY_PENALTY")? {
            generation.frequency_penalty = v;
        }
        if let Some(v) = parsed(&lookup, "TOOLBRIDGE_PRESENCE_PENALTY")? {
            generation.presence_penalty = v;
        }
        if let Some(v) = parsed(&lookup, "TOOLBRIDGE_SEED")? {
            generation.seed = v;
        }

        if let (Some(username), Some(password)) =
            (lookup("TOOLBRIDGE_USERNAME"), lookup("TOOLBRIDGE_PASSWORD"))
        {
            config.generation = config.generation.with_credentials(username, password);
        }

        if let Some(v) = parsed(&lookup, "TOOLBRIDGE_TIMEOUT_SECS")? {
            config.timeout_secs = v;
        }
        if let Some(v) = parsed(&lookup, "TOOLBRIDGE_ACCEPT_INVALID_CERTS")? {
            config.accept_invalid_certs = v;
        }
        if let Some(v) = parsed(&lookup, "TOOLBRIDGE_MATCH_THRESHOLD")? {
            config.reconcile.match_threshold = v;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject values the endpoint or reconciler cannot work with
    pub fn validate(&self) -> Result<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(BridgeError::Config(format!(
                "base URL must be http(s): {}",
                self.base_url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(BridgeError::Config("timeout must be at least one second".into()));
        }
        let threshold = self.reconcile.match_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(BridgeError::Config(format!(
                "match threshold must be within 0..=1, got {threshold}"
            )));
        }
        Ok(())
    }

    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// `<base_url>/chat/completions`, with exactly one slash between
    pub fn completions_url(&self) -> String {
        format!("{}/{COMPLETIONS_PATH}", self.base_url.trim_end_matches('/'))
    }
}

impl std::fmt::Debug for BridgeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"***")
            .field("model", &self.generation.model)
            .field("timeout_secs", &self.timeout_secs)
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .field("reconcile", &self.reconcile)
            .finish_non_exhaustive()
    }
}

fn parsed<F, T>(lookup: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| BridgeError::Config(format!("{key}={raw:?}: {e}")))
        })
        .transpose()
}
