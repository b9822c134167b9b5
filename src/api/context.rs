//! Evaluation context definitions.
//!
//! The context is the `{user, request, artifacts}` structure one evaluation
//! resolves against. It is built fresh per request and never mutated by the
//! core.

use serde_json::{Map, Value};

use crate::core::path;

/// Context provided for one policy evaluation.
///
/// Top-level keys are `user`, `request`, and `artifacts`; `artifacts` is
/// derived from `request.artifacts` unless supplied explicitly. Non-object
/// inputs are treated as empty maps.
#[derive(Debug, Clone)]
pub struct EvaluationContext {
    root: Value,
}

impl EvaluationContext {
    /// Build a context from user and request objects, deriving `artifacts`
    /// from `request.artifacts`.
    pub fn new(user: Value, request: Value) -> Self {
        let request = into_object(request);
        let artifacts = request
            .get("artifacts")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        Self::assemble(into_object(user), request, artifacts)
    }

    /// Build a context with explicit artifacts.
    pub fn with_artifacts(user: Value, request: Value, artifacts: Value) -> Self {
        Self::assemble(
            into_object(user),
            into_object(request),
            into_object(artifacts),
        )
    }

    /// Create a context builder.
    pub fn builder() -> EvaluationContextBuilder {
        EvaluationContextBuilder::default()
    }

    fn assemble(
        user: Map<String, Value>,
        request: Map<String, Value>,
        artifacts: Map<String, Value>,
    ) -> Self {
        let mut root = Map::new();
        root.insert("user".to_string(), Value::Object(user));
        root.insert("request".to_string(), Value::Object(request));
        root.insert("artifacts".to_string(), Value::Object(artifacts));
        Self {
            root: Value::Object(root),
        }
    }

    /// The nested context value paths resolve against.
    pub fn as_value(&self) -> &Value {
        &self.root
    }

    /// Resolve a dotted path against this context.
    pub fn get(&self, path: &str) -> Option<&Value> {
        path::resolve(&self.root, path)
    }

    /// The request's existing `filters` object, or empty when absent.
    pub fn request_filters(&self) -> Map<String, Value> {
        self.get("request.filters")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default()
    }
}

fn into_object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Builder for creating evaluation contexts.
#[derive(Debug, Default)]
pub struct EvaluationContextBuilder {
    user: Map<String, Value>,
    request: Map<String, Value>,
    artifacts: Option<Map<String, Value>>,
}

impl EvaluationContextBuilder {
    /// Set a user attribute.
    pub fn user_attr(mut self, key: impl Into<String>, value: Value) -> Self {
        self.user.insert(key.into(), value);
        self
    }

    /// Set a request attribute.
    pub fn request_attr(mut self, key: impl Into<String>, value: Value) -> Self {
        self.request.insert(key.into(), value);
        self
    }

    /// Set the request query text.
    pub fn query(self, query: impl Into<String>) -> Self {
        self.request_attr("query", Value::String(query.into()))
    }

    /// Set an artifact entry.
    pub fn artifact(mut self, key: impl Into<String>, value: Value) -> Self {
        self.artifacts
            .get_or_insert_with(Map::new)
            .insert(key.into(), value);
        self
    }

    /// Build the evaluation context.
    pub fn build(self) -> EvaluationContext {
        match self.artifacts {
            Some(artifacts) => EvaluationContext::with_artifacts(
                Value::Object(self.user),
                Value::Object(self.request),
                Value::Object(artifacts),
            ),
            None => EvaluationContext::new(Value::Object(self.user), Value::Object(self.request)),
        }
    }
}
