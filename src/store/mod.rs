//! Store collaborators: policy rows and descriptor allow-lists.
//!
//! The core performs no I/O itself; these traits are the read-only
//! collaborator boundary it consumes. In-memory implementations are provided
//! for embedding and tests, HTTP-backed ones in [`http`] for deployments
//! where the stores live behind a service.

mod http;

pub use http::{HttpDescriptorStore, HttpPolicyStore, StoreClient};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::lint::DescriptorAllowList;
use crate::policy::{Stage, StoredPolicy};
use crate::Result;

/// Read-only source of ordered policy rows.
#[async_trait]
pub trait PolicyStore: Send + Sync {
    /// Fetch the enabled policy rows for a stage and version, pre-sorted by
    /// priority descending then creation ascending. The order must be
    /// deterministic for identical inputs; audit trace reproducibility
    /// depends on it.
    async fn fetch_policies_for_stage(
        &self,
        stage: Stage,
        policy_version: &str,
    ) -> Result<Vec<StoredPolicy>>;
}

/// Read-only source of descriptor allow-lists.
#[async_trait]
pub trait DescriptorStore: Send + Sync {
    /// Fetch the allow-list for a tenant and descriptor version. When no
    /// descriptor exists this returns empty sets, never an error.
    async fn fetch_descriptor_paths(
        &self,
        tenant_id: &str,
        version: &str,
    ) -> Result<DescriptorAllowList>;
}

struct PolicyRecord {
    stage: Stage,
    version: String,
    enabled: bool,
    priority: i32,
    created_at: DateTime<Utc>,
    seq: u64,
    content: Value,
    distilled_prompt: String,
}

/// In-memory policy store.
///
/// Rows keep an insertion sequence as the creation-order tie-break, so two
/// rows published in the same instant still sort deterministically.
#[derive(Default)]
pub struct MemoryPolicyStore {
    records: RwLock<Vec<PolicyRecord>>,
    next_seq: AtomicU64,
}

impl MemoryPolicyStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish an enabled policy row.
    pub fn insert(
        &self,
        stage: Stage,
        version: impl Into<String>,
        content: Value,
        distilled_prompt: impl Into<String>,
        priority: i32,
    ) {
        self.push(stage, version.into(), content, distilled_prompt.into(), priority, true);
    }

    /// Publish a disabled policy row (kept but never served).
    pub fn insert_disabled(
        &self,
        stage: Stage,
        version: impl Into<String>,
        content: Value,
        distilled_prompt: impl Into<String>,
        priority: i32,
    ) {
        self.push(stage, version.into(), content, distilled_prompt.into(), priority, false);
    }

    fn push(
        &self,
        stage: Stage,
        version: String,
        content: Value,
        distilled_prompt: String,
        priority: i32,
        enabled: bool,
    ) {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        self.records.write().push(PolicyRecord {
            stage,
            version,
            enabled,
            priority,
            created_at: Utc::now(),
            seq,
            content,
            distilled_prompt,
        });
    }

    /// Number of rows held, across all stages and versions.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Whether the store holds no rows.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[async_trait]
impl PolicyStore for MemoryPolicyStore {
    async fn fetch_policies_for_stage(
        &self,
        stage: Stage,
        policy_version: &str,
    ) -> Result<Vec<StoredPolicy>> {
        let records = self.records.read();
        let mut selected: Vec<_> = records
            .iter()
            .filter(|r| r.enabled && r.stage == stage && r.version == policy_version)
            .collect();
        selected.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then(a.created_at.cmp(&b.created_at))
                .then(a.seq.cmp(&b.seq))
        });
        Ok(selected
            .into_iter()
            .map(|r| StoredPolicy::new(r.content.clone(), r.distilled_prompt.clone(), r.priority))
            .collect())
    }
}

/// In-memory descriptor store keyed by `(tenant_id, version)`.
#[derive(Default)]
pub struct MemoryDescriptorStore {
    descriptors: RwLock<HashMap<(String, String), DescriptorAllowList>>,
}

impl MemoryDescriptorStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a descriptor allow-list for a tenant and version.
    pub fn publish(
        &self,
        tenant_id: impl Into<String>,
        version: impl Into<String>,
        allowed: DescriptorAllowList,
    ) {
        self.descriptors
            .write()
            .insert((tenant_id.into(), version.into()), allowed);
    }
}

#[async_trait]
impl DescriptorStore for MemoryDescriptorStore {
    async fn fetch_descriptor_paths(
        &self,
        tenant_id: &str,
        version: &str,
    ) -> Result<DescriptorAllowList> {
        let descriptors = self.descriptors.read();
        Ok(descriptors
            .get(&(tenant_id.to_string(), version.to_string()))
            .cloned()
            .unwrap_or_else(DescriptorAllowList::empty))
    }
}
