//! Evaluation decisions, changes, and traces.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// The decision of one evaluation pass. Exactly one per evaluation: block
/// short-circuits and wins outright, modify accumulates across matching
/// rewrite policies, allow is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    /// No matching policy changed the request
    Allowed,
    /// One or more rewrite policies changed the request
    Modified,
    /// A block policy stopped the request
    Blocked,
}

impl Decision {
    /// The wire name of the decision.
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Allowed => "allowed",
            Decision::Modified => "modified",
            Decision::Blocked => "blocked",
        }
    }

    /// Whether the request may proceed (possibly modified).
    pub fn is_allowed(&self) -> bool {
        !matches!(self, Decision::Blocked)
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry in the audit trace: which policy fired and what it did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEntry {
    /// Name of the policy that fired
    pub policy: String,
    /// The action it took (`block`, `rewrite_filters`)
    pub action: String,
    /// Additional detail, currently unused
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub details: Map<String, Value>,
}

impl TraceEntry {
    /// Create a trace entry.
    pub fn new(policy: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            policy: policy.into(),
            action: action.into(),
            details: Map::new(),
        }
    }
}

/// The result of one evaluation pass: `(decision, changes, trace)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationOutcome {
    /// The decision for this request
    pub decision: Decision,
    /// Changes to apply: `{message}` for blocks,
    /// `{request: {filters}}` for rewrites
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub changes: Map<String, Value>,
    /// Ordered record of which policies fired
    #[serde(default)]
    pub trace: Vec<TraceEntry>,
}

impl EvaluationOutcome {
    /// An outcome with no matching policies.
    pub fn allowed() -> Self {
        Self {
            decision: Decision::Allowed,
            changes: Map::new(),
            trace: Vec::new(),
        }
    }

    /// The block message, when this outcome is a block.
    pub fn block_message(&self) -> Option<&str> {
        self.changes.get("message").and_then(Value::as_str)
    }

    /// The rewritten filters object, when this outcome carries one.
    pub fn rewritten_filters(&self) -> Option<&Map<String, Value>> {
        self.changes
            .get("request")
            .and_then(|r| r.get("filters"))
            .and_then(Value::as_object)
    }
}

impl Default for EvaluationOutcome {
    fn default() -> Self {
        Self::allowed()
    }
}
