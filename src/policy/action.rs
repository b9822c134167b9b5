//! Policy action definitions.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Message used when a block action carries none of its own.
pub const DEFAULT_BLOCK_MESSAGE: &str = "Blocked.";

/// The action a policy applies when its when-clause matches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// The type of action (block, rewrite)
    #[serde(rename = "type", default)]
    pub action_type: ActionType,
    /// Human-readable message returned with a block decision
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Filter changes applied by a rewrite action
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<FilterSpec>,
}

impl Action {
    /// Create a block action with a message.
    pub fn block(message: impl Into<String>) -> Self {
        Self {
            action_type: ActionType::Block,
            message: Some(message.into()),
            filters: None,
        }
    }

    /// Create a rewrite action adding the given filters.
    pub fn rewrite(add: Map<String, Value>) -> Self {
        Self {
            action_type: ActionType::Rewrite,
            message: None,
            filters: Some(FilterSpec { add }),
        }
    }

    /// The message to surface for a block, falling back to the default.
    pub fn block_message(&self) -> String {
        self.message
            .clone()
            .unwrap_or_else(|| DEFAULT_BLOCK_MESSAGE.to_string())
    }
}

/// The type of action to take.
///
/// Unknown wire values deserialize to `Other` so the surrounding policy
/// still participates in when-clause matching (and prompt selection) while
/// staying inert in the matcher.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    /// Block the request outright
    Block,
    /// Rewrite the request (filter additions)
    Rewrite,
    /// Anything else; inert
    #[default]
    Other,
}

impl<'de> Deserialize<'de> for ActionType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(match s.as_str() {
            "block" => ActionType::Block,
            "rewrite" => ActionType::Rewrite,
            _ => ActionType::Other,
        })
    }
}

/// Filter changes declared by a rewrite action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    /// Filter entries to add; values may be `${token}` templates
    #[serde(default)]
    pub add: Map<String, Value>,
}
