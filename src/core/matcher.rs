//! Ordered multi-policy matching.
//!
//! The matcher walks the pre-sorted policy list (priority descending,
//! creation ascending) once per request. Block short-circuits the pass and
//! its changes replace anything accumulated; rewrites accumulate filters in
//! pass order. Malformed rows are skipped silently, and a matched policy
//! whose `(stage, action)` pair has no defined effect is inert by design.

use serde_json::{Map, Value};
use std::collections::HashSet;

use crate::api::{Decision, EvaluationContext, EvaluationOutcome, TraceEntry};
use crate::policy::{ActionType, Stage, StoredPolicy};

use super::path::{resolve, text_form};
use super::template;

/// Run one evaluation pass over an ordered policy list.
pub fn run(
    stage: Stage,
    context: &EvaluationContext,
    policies: &[StoredPolicy],
) -> EvaluationOutcome {
    let root = context.as_value();
    let query_lower = query_text(root).to_lowercase();

    let mut outcome = EvaluationOutcome::allowed();
    let mut filters = context.request_filters();
    let mut filters_touched = false;

    for stored in policies {
        let Some(policy) = stored.parse() else {
            // Malformed row: skip without a trace entry.
            continue;
        };
        if !policy.when.matches(root) {
            continue;
        }
        let Some(action) = &policy.action else {
            continue;
        };

        match (stage, action.action_type) {
            (Stage::PreQuery, ActionType::Block) => {
                let hit = policy
                    .matchers
                    .query_text
                    .iter()
                    .any(|term| query_lower.contains(&term.to_lowercase()));
                if hit {
                    outcome.decision = Decision::Blocked;
                    // Block replaces any filters accumulated earlier in
                    // this pass.
                    outcome.changes = Map::new();
                    outcome
                        .changes
                        .insert("message".to_string(), Value::String(action.block_message()));
                    outcome
                        .trace
                        .push(TraceEntry::new(policy.display_name("block"), "block"));
                    return outcome;
                }
            }
            (Stage::PreRetrieval, ActionType::Rewrite) => {
                if let Some(spec) = &action.filters {
                    for (key, value) in &spec.add {
                        filters.insert(key.clone(), template::render(value, root));
                    }
                }
                filters_touched = true;
                outcome.decision = Decision::Modified;
                outcome.trace.push(TraceEntry::new(
                    policy.display_name("rewrite"),
                    "rewrite_filters",
                ));
            }
            // Matched its when-clause but has no effect at this stage.
            _ => {}
        }
    }

    if filters_touched {
        let mut request = Map::new();
        request.insert("filters".to_string(), Value::Object(filters));
        outcome
            .changes
            .insert("request".to_string(), Value::Object(request));
    }
    outcome
}

/// Collect the distilled prompts of every policy whose when-clause matches,
/// deduplicated in discovery order.
pub fn select_distilled_prompts(
    context: &EvaluationContext,
    policies: &[StoredPolicy],
) -> Vec<String> {
    let root = context.as_value();
    let mut prompts = Vec::new();
    let mut seen = HashSet::new();

    for stored in policies {
        let Some(policy) = stored.parse() else {
            continue;
        };
        if !policy.when.matches(root) {
            continue;
        }
        if !stored.distilled_prompt.is_empty() && seen.insert(stored.distilled_prompt.clone()) {
            prompts.push(stored.distilled_prompt.clone());
        }
    }
    prompts
}

/// The request query as text, empty when absent.
fn query_text(root: &Value) -> String {
    match resolve(root, "request.query") {
        None | Some(Value::Null) => String::new(),
        Some(value) => text_form(value),
    }
}
