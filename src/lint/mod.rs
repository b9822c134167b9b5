//! Descriptor path extraction and policy linting.
//!
//! The linter statically extracts every `user.*` and `doc.metadata.*` field
//! path a policy body references (condition expressions plus templated
//! action parameters) and checks them against the tenant's descriptor
//! allow-list. A missing descriptor manifests as empty allow-lists, so every
//! referenced path fails until a descriptor is published: default-deny.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::LazyLock;

use crate::policy::Policy;

static PATH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(user|doc\.metadata)\.([A-Za-z0-9_\.]+)").expect("path pattern is valid")
});

static TEMPLATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{(user|doc\.metadata)\.([A-Za-z0-9_\.]+)\}").expect("template pattern is valid")
});

/// Per-namespace sets of field names a tenant's descriptor allows.
///
/// Loaded fresh per lint call; never cached across tenants or versions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptorAllowList {
    /// Allowed attribute names under the `user` namespace
    #[serde(default)]
    pub user: HashSet<String>,
    /// Allowed field names under the `doc.metadata` namespace
    #[serde(default, rename = "doc.metadata")]
    pub doc_metadata: HashSet<String>,
}

impl DescriptorAllowList {
    /// An empty allow-list, the shape returned when no descriptor exists.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build an allow-list from attribute name lists.
    pub fn new(
        user: impl IntoIterator<Item = impl Into<String>>,
        doc_metadata: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            user: user.into_iter().map(|s| s.into()).collect(),
            doc_metadata: doc_metadata.into_iter().map(|s| s.into()).collect(),
        }
    }
}

/// A structured lint error for one policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LintError {
    /// Name of the offending policy, or `unknown`
    pub policy: String,
    /// The offending path, when the error concerns one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// What went wrong
    pub message: String,
}

/// The result of linting a policy batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LintResult {
    /// True iff no errors were found
    pub ok: bool,
    /// Structured errors, one per violation
    pub errors: Vec<LintError>,
    /// Reserved channel, currently always empty
    pub warnings: Vec<LintError>,
}

/// Extract every `user.*` / `doc.metadata.*` path a policy references.
///
/// Condition expressions under `when.any` and `when.all` are scanned for
/// inline occurrences; the action object is serialized and scanned for
/// `${...}` templates. Duplicates are kept, in discovery order.
pub fn extract_paths(policy: &Policy) -> Vec<String> {
    let mut paths = Vec::new();

    let conditions = policy
        .when
        .any
        .iter()
        .flatten()
        .chain(policy.when.all.iter().flatten());
    for condition in conditions {
        for caps in PATH_RE.captures_iter(&condition.expr) {
            paths.push(format!("{}.{}", &caps[1], &caps[2]));
        }
    }

    if let Some(action) = &policy.action {
        if let Ok(action_text) = serde_json::to_string(action) {
            for caps in TEMPLATE_RE.captures_iter(&action_text) {
                paths.push(format!("{}.{}", &caps[1], &caps[2]));
            }
        }
    }

    paths
}

/// Lint a batch of raw policy bodies against a descriptor allow-list.
///
/// Unparsable bodies produce exactly one error and are skipped for path
/// checking; they never abort the batch. Namespaces other than `user` and
/// `doc.metadata` are currently permitted unconditionally.
pub fn lint_policies(allowed: &DescriptorAllowList, policies: &[Value]) -> LintResult {
    let mut errors = Vec::new();

    for entry in policies {
        let parsed: Option<Policy> = match entry {
            Value::String(raw) => serde_json::from_str(raw).ok(),
            other => serde_json::from_value(other.clone()).ok(),
        };
        let Some(policy) = parsed else {
            let name = entry
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or("unknown");
            errors.push(LintError {
                policy: name.to_string(),
                path: None,
                message: "invalid json".to_string(),
            });
            continue;
        };

        let name = policy.display_name("unknown").to_string();
        for path in extract_paths(&policy) {
            if let Some(field) = path.strip_prefix("user.") {
                if !allowed.user.contains(field) {
                    errors.push(LintError {
                        policy: name.clone(),
                        path: Some(path),
                        message: "unknown user attribute".to_string(),
                    });
                }
            } else if let Some(field) = path.strip_prefix("doc.metadata.") {
                if !allowed.doc_metadata.contains(field) {
                    errors.push(LintError {
                        policy: name.clone(),
                        path: Some(path),
                        message: "unknown doc metadata field".to_string(),
                    });
                }
            }
        }
    }

    LintResult {
        ok: errors.is_empty(),
        errors,
        warnings: Vec::new(),
    }
}
