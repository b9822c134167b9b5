//! The gatekeeper engine.

use super::{EvaluationContext, EvaluationOutcome};
use crate::config::Config;
use crate::core::matcher;
use crate::lint::{self, LintResult};
use crate::policy::Stage;
use crate::store::{DescriptorStore, PolicyStore};
use crate::telemetry::Telemetry;
use crate::Result;

use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// The engine gating requests at each pipeline stage.
///
/// Holds the two read-only store collaborators and the active configuration.
/// Evaluation itself is synchronous and pure; the only awaits are the store
/// fetches, so many requests proceed concurrently without shared mutable
/// state.
pub struct Gatekeeper {
    policy_store: Arc<dyn PolicyStore>,
    descriptor_store: Arc<dyn DescriptorStore>,
    config: Config,
    telemetry: Option<Telemetry>,
}

impl Gatekeeper {
    /// Create a gatekeeper builder.
    pub fn builder() -> GatekeeperBuilder {
        GatekeeperBuilder::default()
    }

    /// Create an engine from its collaborators and configuration.
    pub fn new(
        policy_store: Arc<dyn PolicyStore>,
        descriptor_store: Arc<dyn DescriptorStore>,
        config: Config,
    ) -> Self {
        Self {
            policy_store,
            descriptor_store,
            config,
            telemetry: None,
        }
    }

    /// Evaluate the policies for a stage against a request.
    ///
    /// Fetches the ordered, enabled policy rows for the configured version,
    /// builds a fresh context from the user and request objects, and runs
    /// one matching pass. Returns the decision, the changes to apply, and
    /// the audit trace.
    pub async fn evaluate(
        &self,
        stage: Stage,
        user: Value,
        request: Value,
    ) -> Result<EvaluationOutcome> {
        let start = Instant::now();
        let evaluation_id = Uuid::new_v4();

        let policies = self
            .policy_store
            .fetch_policies_for_stage(stage, &self.config.policy_version)
            .await?;
        let context = EvaluationContext::new(user, request);
        let outcome = matcher::run(stage, &context, &policies);

        let elapsed = start.elapsed();
        tracing::debug!(
            %evaluation_id,
            stage = %stage,
            decision = %outcome.decision,
            policies = policies.len(),
            matched = outcome.trace.len(),
            elapsed_us = elapsed.as_micros() as u64,
            "policy evaluation complete"
        );
        if let Some(telemetry) = &self.telemetry {
            telemetry.record_evaluation(outcome.decision, elapsed.as_micros() as u64);
        }

        Ok(outcome)
    }

    /// Collect the distilled prompts of every policy whose when-clause
    /// matches, deduplicated in discovery order, for downstream prompt
    /// assembly.
    pub async fn distilled_prompts(
        &self,
        stage: Stage,
        user: Value,
        request: Value,
    ) -> Result<Vec<String>> {
        let policies = self
            .policy_store
            .fetch_policies_for_stage(stage, &self.config.policy_version)
            .await?;
        let context = EvaluationContext::new(user, request);
        Ok(matcher::select_distilled_prompts(&context, &policies))
    }

    /// Lint a batch of raw policy bodies against a tenant's descriptor.
    ///
    /// The allow-list is loaded fresh per call; nothing is cached across
    /// tenants or versions.
    pub async fn lint_policies(
        &self,
        tenant_id: &str,
        descriptor_version: &str,
        policies: &[Value],
    ) -> Result<LintResult> {
        let allowed = self
            .descriptor_store
            .fetch_descriptor_paths(tenant_id, descriptor_version)
            .await?;
        let result = lint::lint_policies(&allowed, policies);

        tracing::debug!(
            tenant_id,
            descriptor_version,
            policies = policies.len(),
            errors = result.errors.len(),
            "policy lint complete"
        );
        if let Some(telemetry) = &self.telemetry {
            telemetry.record_lint(result.errors.len());
        }

        Ok(result)
    }

    /// The active configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Current telemetry metrics, when telemetry is enabled.
    pub fn telemetry_metrics(&self) -> Option<crate::telemetry::TelemetryMetrics> {
        self.telemetry.as_ref().map(|t| t.metrics())
    }
}

/// Builder for creating a [`Gatekeeper`].
#[derive(Default)]
pub struct GatekeeperBuilder {
    policy_store: Option<Arc<dyn PolicyStore>>,
    descriptor_store: Option<Arc<dyn DescriptorStore>>,
    config: Option<Config>,
    telemetry_enabled: Option<bool>,
}

impl GatekeeperBuilder {
    /// Set the policy store collaborator.
    pub fn with_policy_store(mut self, store: impl PolicyStore + 'static) -> Self {
        self.policy_store = Some(Arc::new(store));
        self
    }

    /// Set a shared policy store collaborator.
    pub fn with_shared_policy_store(mut self, store: Arc<dyn PolicyStore>) -> Self {
        self.policy_store = Some(store);
        self
    }

    /// Set the descriptor store collaborator.
    pub fn with_descriptor_store(mut self, store: impl DescriptorStore + 'static) -> Self {
        self.descriptor_store = Some(Arc::new(store));
        self
    }

    /// Set a shared descriptor store collaborator.
    pub fn with_shared_descriptor_store(mut self, store: Arc<dyn DescriptorStore>) -> Self {
        self.descriptor_store = Some(store);
        self
    }

    /// Set the configuration.
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Enable or disable telemetry collection, overriding the
    /// configuration's `telemetry.enabled` setting.
    pub fn with_telemetry_enabled(mut self, enabled: bool) -> Self {
        self.telemetry_enabled = Some(enabled);
        self
    }

    /// Build the engine.
    pub fn build(self) -> Result<Gatekeeper> {
        let policy_store = self
            .policy_store
            .ok_or_else(|| crate::Error::config_key("policy store is required", "policy_store"))?;
        let descriptor_store = self.descriptor_store.ok_or_else(|| {
            crate::Error::config_key("descriptor store is required", "descriptor_store")
        })?;
        let config = self.config.unwrap_or_default();

        let enabled = self.telemetry_enabled.unwrap_or(config.telemetry.enabled);
        let telemetry = if enabled {
            Some(Telemetry::new(&config.telemetry))
        } else {
            None
        };

        Ok(Gatekeeper {
            policy_store,
            descriptor_store,
            config,
            telemetry,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Decision;
    use crate::lint::DescriptorAllowList;
    use crate::policy::{Action, Condition, Policy, StoredPolicy};
    use crate::store::{MemoryDescriptorStore, MemoryPolicyStore};
    use serde_json::json;

    fn engine_with(
        policy_store: MemoryPolicyStore,
        descriptor_store: MemoryDescriptorStore,
    ) -> Gatekeeper {
        Gatekeeper::builder()
            .with_policy_store(policy_store)
            .with_descriptor_store(descriptor_store)
            .with_telemetry_enabled(true)
            .build()
            .unwrap()
    }

    fn block_body(name: &str, terms: &[&str]) -> serde_json::Value {
        serde_json::to_value(
            Policy::builder(name)
                .query_terms(terms.iter().copied())
                .action(Action::block("Restricted."))
                .build(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_builder_requires_stores() {
        assert!(Gatekeeper::builder().build().is_err());
    }

    #[test]
    fn test_telemetry_follows_config_unless_overridden() {
        let mut config = Config::default();
        config.telemetry.enabled = false;

        // Config default applies when the builder flag is not set.
        let engine = Gatekeeper::builder()
            .with_policy_store(MemoryPolicyStore::new())
            .with_descriptor_store(MemoryDescriptorStore::new())
            .with_config(config.clone())
            .build()
            .unwrap();
        assert!(engine.telemetry_metrics().is_none());

        // The builder flag wins over the config either way.
        let engine = Gatekeeper::builder()
            .with_policy_store(MemoryPolicyStore::new())
            .with_descriptor_store(MemoryDescriptorStore::new())
            .with_config(config)
            .with_telemetry_enabled(true)
            .build()
            .unwrap();
        assert!(engine.telemetry_metrics().is_some());

        let engine = Gatekeeper::builder()
            .with_policy_store(MemoryPolicyStore::new())
            .with_descriptor_store(MemoryDescriptorStore::new())
            .with_telemetry_enabled(false)
            .build()
            .unwrap();
        assert!(engine.telemetry_metrics().is_none());
    }

    #[tokio::test]
    async fn test_evaluate_block_flow() {
        let policies = MemoryPolicyStore::new();
        policies.insert(Stage::PreQuery, "v0", block_body("no-ssn", &["ssn"]), "", 10);
        let engine = engine_with(policies, MemoryDescriptorStore::new());

        let outcome = engine
            .evaluate(Stage::PreQuery, json!({}), json!({"query": "find SSN records"}))
            .await
            .unwrap();

        assert_eq!(outcome.decision, Decision::Blocked);
        assert_eq!(outcome.block_message(), Some("Restricted."));
        assert_eq!(engine.telemetry_metrics().unwrap().evaluations_blocked, 1);
    }

    #[tokio::test]
    async fn test_evaluate_rewrite_flow() {
        let policies = MemoryPolicyStore::new();
        let mut add = serde_json::Map::new();
        add.insert("sensitivity".into(), json!("${user.department}"));
        let body = serde_json::to_value(
            Policy::builder("tag-dept").action(Action::rewrite(add)).build(),
        )
        .unwrap();
        policies.insert(Stage::PreRetrieval, "v0", body, "", 0);
        let engine = engine_with(policies, MemoryDescriptorStore::new());

        let outcome = engine
            .evaluate(
                Stage::PreRetrieval,
                json!({"department": "finance"}),
                json!({"query": "q"}),
            )
            .await
            .unwrap();

        assert_eq!(outcome.decision, Decision::Modified);
        assert_eq!(
            outcome.rewritten_filters().unwrap().get("sensitivity"),
            Some(&json!("finance"))
        );
    }

    #[tokio::test]
    async fn test_evaluate_respects_policy_version() {
        let policies = MemoryPolicyStore::new();
        policies.insert(Stage::PreQuery, "v9", block_body("future", &["x"]), "", 0);
        let engine = engine_with(policies, MemoryDescriptorStore::new());

        // Engine runs v0 by default; the v9 row is invisible.
        let outcome = engine
            .evaluate(Stage::PreQuery, json!({}), json!({"query": "x"}))
            .await
            .unwrap();
        assert_eq!(outcome.decision, Decision::Allowed);
    }

    #[tokio::test]
    async fn test_distilled_prompts_flow() {
        let policies = MemoryPolicyStore::new();
        let gated = serde_json::to_value(
            Policy::builder("admins")
                .when_all(vec![Condition::new("user.role == \"admin\"")])
                .build(),
        )
        .unwrap();
        policies.insert(Stage::PreQuery, "v0", json!({}), "always applies", 10);
        policies.insert(Stage::PreQuery, "v0", gated, "admin rule", 5);

        let engine = engine_with(policies, MemoryDescriptorStore::new());
        let prompts = engine
            .distilled_prompts(Stage::PreQuery, json!({"role": "analyst"}), json!({}))
            .await
            .unwrap();
        assert_eq!(prompts, vec!["always applies"]);
    }

    #[tokio::test]
    async fn test_lint_flow() {
        let descriptors = MemoryDescriptorStore::new();
        descriptors.publish(
            "tenant-1",
            "v1",
            DescriptorAllowList::new(["role", "department"], ["tags"]),
        );
        let engine = engine_with(MemoryPolicyStore::new(), descriptors);

        let batch = vec![json!({
            "name": "leaky",
            "when": {"all": [{"expr": "user.ssn != null"}]}
        })];
        let result = engine.lint_policies("tenant-1", "v1", &batch).await.unwrap();

        assert!(!result.ok);
        assert_eq!(result.errors[0].path.as_deref(), Some("user.ssn"));
        assert_eq!(engine.telemetry_metrics().unwrap().lint_errors, 1);
    }

    #[tokio::test]
    async fn test_lint_against_unpublished_descriptor_denies_all() {
        let engine = engine_with(MemoryPolicyStore::new(), MemoryDescriptorStore::new());
        let batch = vec![json!({
            "name": "p",
            "when": {"all": [{"expr": "user.role == \"admin\""}]}
        })];
        let result = engine.lint_policies("tenant-2", "v0", &batch).await.unwrap();
        assert!(!result.ok);
    }

    #[test]
    fn test_trace_is_reproducible_for_identical_inputs() {
        // The pre-sorted order must be deterministic; run the same pass
        // twice and compare traces.
        let rows = vec![
            StoredPolicy::new(block_body("a", &["q"]), "", 5),
            StoredPolicy::new(block_body("b", &["q"]), "", 5),
        ];
        let context = EvaluationContext::new(json!({}), json!({"query": "q"}));
        let first = matcher::run(Stage::PreQuery, &context, &rows);
        let second = matcher::run(Stage::PreQuery, &context, &rows);
        assert_eq!(first.trace, second.trace);
        assert_eq!(first.trace[0].policy, "a");
    }
}
