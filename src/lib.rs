//! # GateKeeper Engine
//!
//! Deterministic policy gating for LLM retrieval pipelines. The engine
//! evaluates declarative policies at fixed pipeline stages and decides, per
//! request, whether to let it pass, rewrite its retrieval filters, or block
//! it outright.
//!
//! ## Features
//!
//! - **Stage Gating**: Block and rewrite decisions at `pre_query`,
//!   `pre_retrieval`, `post_retrieval`, and `post_generation`
//! - **Condition Matching**: When-clause gates over dotted paths into the
//!   `{user, request, artifacts}` context
//! - **Filter Rewriting**: Cumulative retrieval-filter injection with
//!   `${...}` template substitution
//! - **Policy Linting**: Static descriptor checks catching references to
//!   unknown user attributes and document metadata fields
//! - **Audit Traces**: A deterministic record of which policies fired
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gatekeeper_engine::{Gatekeeper, MemoryDescriptorStore, MemoryPolicyStore, Stage};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = Gatekeeper::builder()
//!         .with_policy_store(MemoryPolicyStore::new())
//!         .with_descriptor_store(MemoryDescriptorStore::new())
//!         .with_telemetry_enabled(true)
//!         .build()?;
//!
//!     let outcome = engine
//!         .evaluate(
//!             Stage::PreQuery,
//!             json!({"role": "analyst", "department": "finance"}),
//!             json!({"query": "q4 revenue by region"}),
//!         )
//!         .await?;
//!
//!     if outcome.decision.is_allowed() {
//!         println!("request allowed");
//!     } else {
//!         println!("blocked: {}", outcome.block_message().unwrap_or_default());
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod api;
pub mod config;
pub mod core;
pub mod error;
pub mod lint;
pub mod policy;
pub mod prompt;
pub mod store;
pub mod telemetry;

// Re-export main types for convenience
pub use api::{
    Decision, EvaluationContext, EvaluationContextBuilder, EvaluationOutcome, Gatekeeper,
    GatekeeperBuilder, TraceEntry,
};
pub use config::Config;
pub use error::{Error, Result};
pub use lint::{DescriptorAllowList, LintError, LintResult};
pub use policy::{
    Action, ActionType, Condition, Policy, Stage, StoredPolicy, WhenClause,
};
pub use store::{
    DescriptorStore, HttpDescriptorStore, HttpPolicyStore, MemoryDescriptorStore,
    MemoryPolicyStore, PolicyStore, StoreClient,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
