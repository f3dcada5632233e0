//! Token usage accounting.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Token usage statistics
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl TokenUsage {
    pub const fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
        }
    }

    /// Read the optional `usage` object of a completion response.
    ///
    /// Never fails: missing or non-numeric counters read as zero and a
    /// missing total is the sum of the other two.
    pub fn from_response(response: &Value) -> Self {
        let Some(usage) = response.get("usage").filter(|u| u.is_object()) else {
            return Self::default();
        };

        let prompt_tokens = counter(usage, "prompt_tokens").unwrap_or(0);
        let completion_tokens = counter(usage, "completion_tokens").unwrap_or(0);
        let total_tokens = counter(usage, "total_tokens")
            .unwrap_or_else(|| prompt_tokens.saturating_add(completion_tokens));

        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens,
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn counter(usage: &Value, key: &str) -> Option<u32> {
    let value = usage.get(key)?;
    let n = value
        .as_u64()
        .or_else(|| value.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))?;
    Some(u32::try_from(n).unwrap_or(u32::MAX))
}
