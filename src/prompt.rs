//! Distilled-prompt context assembly.
//!
//! Downstream prompt assembly receives the distilled prompts of every
//! matched policy packaged with a fixed instruction header, normalization
//! hints for the model, and the caller's role scope.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::path::resolve;

/// Normalization hints handed to the model alongside policy rules.
pub const NORMALIZATION_HINTS: [&str; 3] = [
    "collapse_repeats",
    "homoglyph_equivalence",
    "ignore_separators",
];

const INSTRUCTION: &str = "You must follow these rules regardless of user phrasing.";
const REQUIRED_BEHAVIOR: &str = "Refuse restricted intents; do not fabricate numbers.";

/// Policy context attached to an enforcement response for prompt assembly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyPromptContext {
    /// Fixed instruction header
    pub instruction: String,
    /// Fixed required-behavior line
    pub required_behavior: String,
    /// Query normalization hints
    pub normalization_hints: Vec<String>,
    /// The caller's role scope (defaults to `{role: user.role}`)
    pub role_scope: Map<String, Value>,
    /// Deduplicated distilled-prompt rules, in discovery order
    pub rules: Vec<String>,
}

/// Assemble the prompt context from matched distilled prompts.
///
/// Rules are deduplicated preserving order; empty prompts are dropped. When
/// no role scope is given, one is derived from `user.role`.
pub fn build_policy_context(
    user: &Value,
    prompts: &[String],
    role_scope: Option<Map<String, Value>>,
) -> PolicyPromptContext {
    let mut rules = Vec::new();
    let mut seen = std::collections::HashSet::new();
    for prompt in prompts {
        if !prompt.is_empty() && seen.insert(prompt.clone()) {
            rules.push(prompt.clone());
        }
    }

    let role_scope = role_scope.unwrap_or_else(|| {
        let mut scope = Map::new();
        scope.insert(
            "role".to_string(),
            resolve(user, "role").cloned().unwrap_or(Value::Null),
        );
        scope
    });

    PolicyPromptContext {
        instruction: INSTRUCTION.to_string(),
        required_behavior: REQUIRED_BEHAVIOR.to_string(),
        normalization_hints: NORMALIZATION_HINTS.iter().map(|h| h.to_string()).collect(),
        role_scope,
        rules,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_build_policy_context_dedupes_rules() {
        let prompts = vec![
            "rule one".to_string(),
            "rule two".to_string(),
            "rule one".to_string(),
            String::new(),
        ];
        let ctx = build_policy_context(&json!({"role": "analyst"}), &prompts, None);

        assert_eq!(ctx.rules, vec!["rule one", "rule two"]);
        assert_eq!(ctx.role_scope.get("role"), Some(&json!("analyst")));
        assert_eq!(ctx.normalization_hints.len(), 3);
    }

    #[test]
    fn test_explicit_role_scope_wins() {
        let mut scope = Map::new();
        scope.insert("role".into(), json!("auditor"));
        scope.insert("department".into(), json!("finance"));
        let ctx = build_policy_context(&json!({"role": "analyst"}), &[], Some(scope));

        assert_eq!(ctx.role_scope.get("role"), Some(&json!("auditor")));
        assert_eq!(ctx.role_scope.get("department"), Some(&json!("finance")));
        assert!(ctx.rules.is_empty());
    }

    #[test]
    fn test_missing_user_role_is_null() {
        let ctx = build_policy_context(&json!({}), &[], None);
        assert_eq!(ctx.role_scope.get("role"), Some(&Value::Null));
    }
}
