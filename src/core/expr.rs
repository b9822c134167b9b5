//! Condition expression parsing and evaluation.
//!
//! The condition language is deliberately tiny: a single equality,
//! not-null test, or containment check per condition string. There is no
//! negation, no parentheses, and no nested boolean composition; composition
//! happens only through when-clauses. Anything outside the recognized forms
//! evaluates to a definite `false` rather than an error.

use serde_json::Value;

use super::path::{is_present, resolve, text_form};

/// Textual stand-in for an absent value in equality comparisons.
///
/// Inherited from the dynamically-typed origin of the policy language, where
/// a missing attribute stringified to `None`. Conditions of the form
/// `path == "None"` therefore match an absent path, and tenant policies rely
/// on that.
pub const NONE_SENTINEL: &str = "None";

/// A parsed condition expression.
///
/// Detection order is part of the contract: equality is checked first, then
/// the not-null form, then containment; everything else (including `in`-list
/// forms) is `Unrecognized` and evaluates to false.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr<'a> {
    /// Empty or blank expression; vacuously true.
    Always,
    /// `path == literal`, compared against the textual form of the value.
    Equality {
        /// Dotted context path on the left-hand side
        path: &'a str,
        /// Right-hand literal, surrounding quotes stripped
        literal: &'a str,
    },
    /// `path != null`; true iff the path resolves to a present value.
    NotNull {
        /// Dotted context path on the left-hand side
        path: &'a str,
    },
    /// `path contains literal` over strings, arrays, or object keys.
    Contains {
        /// Dotted context path on the left-hand side
        path: &'a str,
        /// Literal to look for, surrounding quotes stripped
        literal: &'a str,
    },
    /// Any other form; evaluates to false without raising.
    Unrecognized,
}

/// Parse one condition string into its recognized form.
pub fn parse(expr: &str) -> Expr<'_> {
    let s = expr.trim();
    if s.is_empty() {
        return Expr::Always;
    }
    if let Some((left, right)) = s.split_once("==") {
        return Expr::Equality {
            path: left.trim(),
            literal: strip_quotes(right.trim()),
        };
    }
    if s.contains("null") {
        if let Some((left, _)) = s.split_once("!=") {
            // The right-hand literal is never inspected.
            return Expr::NotNull { path: left.trim() };
        }
    }
    if let Some((left, right)) = s.split_once(" contains ") {
        return Expr::Contains {
            path: left.trim(),
            literal: strip_quotes(right.trim()),
        };
    }
    Expr::Unrecognized
}

/// Evaluate a condition string against a context. Pure; never fails.
pub fn evaluate(context: &Value, expr: &str) -> bool {
    eval(context, &parse(expr))
}

/// Evaluate a parsed expression against a context.
pub fn eval(context: &Value, expr: &Expr<'_>) -> bool {
    match expr {
        Expr::Always => true,
        Expr::Equality { path, literal } => {
            let text = match resolve(context, path) {
                None | Some(Value::Null) => NONE_SENTINEL.to_string(),
                Some(value) => text_form(value),
            };
            text == *literal
        }
        Expr::NotNull { path } => is_present(context, path),
        Expr::Contains { path, literal } => match resolve(context, path) {
            Some(Value::String(s)) => s.contains(literal),
            Some(Value::Array(items)) => items
                .iter()
                .any(|item| matches!(item, Value::String(s) if s == literal)),
            Some(Value::Object(map)) => map.contains_key(*literal),
            _ => false,
        },
        Expr::Unrecognized => false,
    }
}

/// Strip one pair of surrounding double quotes, if present.
fn strip_quotes(s: &str) -> &str {
    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        &s[1..s.len() - 1]
    } else {
        s
    }
}
