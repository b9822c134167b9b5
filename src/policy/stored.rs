//! Stored policy rows as handed back by the policy store.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Policy;

/// One row from the policy store: the raw policy body plus the row-level
/// fields the matcher and prompt selection need.
///
/// The body stays raw (`serde_json::Value`) because stored policies may be
/// malformed; parsing happens per row and a failed parse skips the row
/// without aborting the pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredPolicy {
    /// Raw policy body; an object, or a string holding embedded JSON
    pub content: Value,
    /// Natural-language instruction surfaced to prompt assembly on match
    #[serde(default)]
    pub distilled_prompt: String,
    /// Row priority (higher evaluates first)
    #[serde(default)]
    pub priority: i32,
}

impl StoredPolicy {
    /// Create a stored policy row.
    pub fn new(content: Value, distilled_prompt: impl Into<String>, priority: i32) -> Self {
        Self {
            content,
            distilled_prompt: distilled_prompt.into(),
            priority,
        }
    }

    /// Create a row from an already-typed policy.
    pub fn from_policy(policy: &Policy, distilled_prompt: impl Into<String>, priority: i32) -> Self {
        let content = serde_json::to_value(policy).unwrap_or(Value::Null);
        Self::new(content, distilled_prompt, priority)
    }

    /// Parse the raw body into a typed policy, or `None` if it is malformed.
    pub fn parse(&self) -> Option<Policy> {
        match &self.content {
            Value::String(raw) => serde_json::from_str(raw).ok(),
            other => serde_json::from_value(other.clone()).ok(),
        }
    }
}
