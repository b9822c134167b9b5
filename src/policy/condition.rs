//! Policy condition and when-clause definitions.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::expr;

/// A single condition carrying one expression string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    /// The condition expression (e.g. `user.role == "admin"`)
    #[serde(default)]
    pub expr: String,
}

impl Condition {
    /// Create a condition from an expression string.
    pub fn new(expr: impl Into<String>) -> Self {
        Self { expr: expr.into() }
    }

    /// Evaluate this condition against a context.
    pub fn evaluate(&self, context: &Value) -> bool {
        expr::evaluate(context, &self.expr)
    }
}

/// The when-clause gating a policy.
///
/// `any` and `all` are independent gates; a policy matches only if every
/// present gate passes. A clause with neither key is vacuously true. An
/// explicitly empty `any` list can never pass, which is why the keys are
/// optional rather than defaulted to empty lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhenClause {
    /// At least one listed condition must hold
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub any: Option<Vec<Condition>>,
    /// Every listed condition must hold
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all: Option<Vec<Condition>>,
}

impl WhenClause {
    /// A when-clause that matches every context.
    pub fn always() -> Self {
        Self::default()
    }

    /// A when-clause requiring at least one of the given conditions.
    pub fn any_of(conditions: Vec<Condition>) -> Self {
        Self {
            any: Some(conditions),
            all: None,
        }
    }

    /// A when-clause requiring all of the given conditions.
    pub fn all_of(conditions: Vec<Condition>) -> Self {
        Self {
            any: None,
            all: Some(conditions),
        }
    }

    /// Check whether this clause matches a context.
    ///
    /// Short-circuits on the first true condition for `any` and the first
    /// false condition for `all`.
    pub fn matches(&self, context: &Value) -> bool {
        if let Some(any) = &self.any {
            if !any.iter().any(|c| c.evaluate(context)) {
                return false;
            }
        }
        if let Some(all) = &self.all {
            if !all.iter().all(|c| c.evaluate(context)) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx() -> Value {
        json!({
            "user": {"role": "admin", "department": "finance"},
            "request": {"query": "numbers"}
        })
    }

    #[test]
    fn test_vacuous_when_clause() {
        assert!(WhenClause::always().matches(&ctx()));
    }

    #[test]
    fn test_any_gate() {
        let when = WhenClause::any_of(vec![
            Condition::new("user.role == \"guest\""),
            Condition::new("user.department == \"finance\""),
        ]);
        assert!(when.matches(&ctx()));

        let when = WhenClause::any_of(vec![Condition::new("user.role == \"guest\"")]);
        assert!(!when.matches(&ctx()));
    }

    #[test]
    fn test_all_gate() {
        let when = WhenClause::all_of(vec![
            Condition::new("user.role == \"admin\""),
            Condition::new("user.department == \"finance\""),
        ]);
        assert!(when.matches(&ctx()));

        let when = WhenClause::all_of(vec![
            Condition::new("user.role == \"admin\""),
            Condition::new("user.department == \"legal\""),
        ]);
        assert!(!when.matches(&ctx()));
    }

    #[test]
    fn test_all_is_order_independent() {
        let a = Condition::new("user.role == \"admin\"");
        let b = Condition::new("user.department == \"legal\"");
        let c = Condition::new("request.query != null");
        let perms: [[&Condition; 3]; 6] = [
            [&a, &b, &c],
            [&a, &c, &b],
            [&b, &a, &c],
            [&b, &c, &a],
            [&c, &a, &b],
            [&c, &b, &a],
        ];
        for perm in perms {
            let when = WhenClause::all_of(perm.iter().map(|c| (*c).clone()).collect());
            assert!(!when.matches(&ctx()));
        }
    }

    #[test]
    fn test_both_gates_must_pass() {
        let when = WhenClause {
            any: Some(vec![Condition::new("user.role == \"admin\"")]),
            all: Some(vec![Condition::new("user.department == \"legal\"")]),
        };
        assert!(!when.matches(&ctx()));

        let when = WhenClause {
            any: Some(vec![Condition::new("user.role == \"admin\"")]),
            all: Some(vec![Condition::new("user.department == \"finance\"")]),
        };
        assert!(when.matches(&ctx()));
    }

    #[test]
    fn test_empty_any_list_never_matches() {
        let when = WhenClause {
            any: Some(Vec::new()),
            all: None,
        };
        assert!(!when.matches(&ctx()));
    }

    #[test]
    fn test_when_clause_serde_shape() {
        let when: WhenClause =
            serde_json::from_str(r#"{"any":[{"expr":"user.role == \"admin\""}]}"#).unwrap();
        assert!(when.any.is_some());
        assert!(when.all.is_none());
        assert!(when.matches(&ctx()));
    }
}
