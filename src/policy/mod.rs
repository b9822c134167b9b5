//! Policy data structures and representations.
//!
//! This module defines the persisted policy contract: policies, when-clauses,
//! conditions, actions, stages, and the stored rows the policy store hands
//! back. Loosely-typed policy documents are parsed into these tagged
//! structures at the store boundary so the core never manipulates untyped
//! maps internally.

mod action;
mod condition;
mod stage;
mod stored;

pub use action::{Action, ActionType, FilterSpec, DEFAULT_BLOCK_MESSAGE};
pub use condition::{Condition, WhenClause};
pub use stage::Stage;
pub use stored::StoredPolicy;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A policy body: the when-clause gate, optional stage-specific matchers,
/// and the action applied on match.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Policy {
    /// Policy name, used in traces and lint errors
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// The gate deciding whether the policy applies
    #[serde(default)]
    pub when: WhenClause,
    /// Stage-specific matchers (currently the pre-query blocklist terms)
    #[serde(default, rename = "match", skip_serializing_if = "Matchers::is_empty")]
    pub matchers: Matchers,
    /// The action applied when the policy matches; a policy without one
    /// still participates in when-clause matching (prompt selection)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
}

impl Policy {
    /// Create a policy builder.
    pub fn builder(name: impl Into<String>) -> PolicyBuilder {
        PolicyBuilder::new(name)
    }

    /// Parse a policy body from a JSON value with a validating deserialize.
    pub fn from_value(value: Value) -> crate::Result<Self> {
        serde_json::from_value(value).map_err(crate::Error::from)
    }

    /// Parse a policy body from JSON text.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        serde_json::from_str(json).map_err(crate::Error::from)
    }

    /// The name to report in traces and lint errors, with a fallback when
    /// the policy is unnamed.
    pub fn display_name<'a>(&'a self, fallback: &'a str) -> &'a str {
        if self.name.is_empty() {
            fallback
        } else {
            &self.name
        }
    }
}

/// Stage-specific matchers attached to a policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Matchers {
    /// Blocklist terms tested against the query text at `pre_query`
    #[serde(default, rename = "query.text", skip_serializing_if = "Vec::is_empty")]
    pub query_text: Vec<String>,
}

impl Matchers {
    /// Check whether no matchers are declared.
    pub fn is_empty(&self) -> bool {
        self.query_text.is_empty()
    }
}

/// Builder for creating policies.
#[derive(Debug, Default)]
pub struct PolicyBuilder {
    name: String,
    when: WhenClause,
    matchers: Matchers,
    action: Option<Action>,
}

impl PolicyBuilder {
    /// Create a new policy builder with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the when-clause.
    pub fn when(mut self, when: WhenClause) -> Self {
        self.when = when;
        self
    }

    /// Require at least one of the given conditions.
    pub fn when_any(mut self, conditions: Vec<Condition>) -> Self {
        self.when.any = Some(conditions);
        self
    }

    /// Require all of the given conditions.
    pub fn when_all(mut self, conditions: Vec<Condition>) -> Self {
        self.when.all = Some(conditions);
        self
    }

    /// Set the pre-query blocklist terms.
    pub fn query_terms(mut self, terms: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.matchers.query_text = terms.into_iter().map(|t| t.into()).collect();
        self
    }

    /// Set the action.
    pub fn action(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }

    /// Build the policy.
    pub fn build(self) -> Policy {
        Policy {
            name: self.name,
            when: self.when,
            matchers: self.matchers,
            action: self.action,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_policy_builder() {
        let policy = Policy::builder("deny-finance")
            .when_any(vec![Condition::new("user.department == \"finance\"")])
            .query_terms(["salary", "payroll"])
            .action(Action::block("Restricted."))
            .build();

        assert_eq!(policy.name, "deny-finance");
        assert_eq!(policy.matchers.query_text, vec!["salary", "payroll"]);
        assert!(policy.action.is_some());
    }

    #[test]
    fn test_policy_wire_shape() {
        let policy = Policy::from_value(json!({
            "name": "tag-sensitivity",
            "when": {"all": [{"expr": "user.role != null"}]},
            "action": {"type": "rewrite", "filters": {"add": {"sensitivity": "internal"}}}
        }))
        .unwrap();

        assert_eq!(policy.name, "tag-sensitivity");
        assert_eq!(
            policy.action.as_ref().unwrap().action_type,
            ActionType::Rewrite
        );

        // Round-trips losslessly through the store contract.
        let text = serde_json::to_string(&policy).unwrap();
        let back = Policy::from_json(&text).unwrap();
        assert_eq!(back.name, policy.name);
        assert_eq!(back.when, policy.when);
    }

    #[test]
    fn test_policy_minimal_body() {
        // Bare bodies are tolerated; everything defaults.
        let policy = Policy::from_value(json!({})).unwrap();
        assert!(policy.name.is_empty());
        assert!(policy.action.is_none());
        assert_eq!(policy.display_name("block"), "block");
    }

    #[test]
    fn test_match_key_wire_name() {
        let policy = Policy::from_value(json!({
            "name": "blocklist",
            "match": {"query.text": ["ssn"]},
            "action": {"type": "block"}
        }))
        .unwrap();
        assert_eq!(policy.matchers.query_text, vec!["ssn"]);
    }

    #[test]
    fn test_display_name_fallbacks() {
        let named = Policy::builder("p").build();
        assert_eq!(named.display_name("block"), "p");
        let unnamed = Policy::default();
        assert_eq!(unnamed.display_name("rewrite"), "rewrite");
    }
}
