//! Telemetry and observability for the gatekeeper engine.
//!
//! Lightweight counters per decision type plus a `tracing` subscriber
//! initializer for embedding applications.

use crate::api::Decision;
use crate::config::TelemetryConfig;

use std::sync::atomic::{AtomicU64, Ordering};

/// Initialize a `tracing` subscriber with an env-filter, falling back to the
/// given default directive. Safe to call more than once; later calls are
/// no-ops.
pub fn init_tracing(default_directive: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive.to_string()));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init();
}

/// Telemetry instance recording evaluation and lint counters.
pub struct Telemetry {
    config: TelemetryConfig,
    evaluations_allowed: AtomicU64,
    evaluations_modified: AtomicU64,
    evaluations_blocked: AtomicU64,
    lint_runs: AtomicU64,
    lint_errors: AtomicU64,
    total_evaluation_time_us: AtomicU64,
}

impl Telemetry {
    /// Create a new telemetry instance.
    pub fn new(config: &TelemetryConfig) -> Self {
        Self {
            config: config.clone(),
            evaluations_allowed: AtomicU64::new(0),
            evaluations_modified: AtomicU64::new(0),
            evaluations_blocked: AtomicU64::new(0),
            lint_runs: AtomicU64::new(0),
            lint_errors: AtomicU64::new(0),
            total_evaluation_time_us: AtomicU64::new(0),
        }
    }

    /// Record one policy evaluation.
    pub fn record_evaluation(&self, decision: Decision, duration_us: u64) {
        match decision {
            Decision::Allowed => self.evaluations_allowed.fetch_add(1, Ordering::Relaxed),
            Decision::Modified => self.evaluations_modified.fetch_add(1, Ordering::Relaxed),
            Decision::Blocked => self.evaluations_blocked.fetch_add(1, Ordering::Relaxed),
        };
        self.total_evaluation_time_us
            .fetch_add(duration_us, Ordering::Relaxed);
    }

    /// Record one lint run and its error count.
    pub fn record_lint(&self, error_count: usize) {
        self.lint_runs.fetch_add(1, Ordering::Relaxed);
        self.lint_errors
            .fetch_add(error_count as u64, Ordering::Relaxed);
    }

    /// Get current metrics.
    pub fn metrics(&self) -> TelemetryMetrics {
        let allowed = self.evaluations_allowed.load(Ordering::Relaxed);
        let modified = self.evaluations_modified.load(Ordering::Relaxed);
        let blocked = self.evaluations_blocked.load(Ordering::Relaxed);
        let total = allowed + modified + blocked;

        let total_time_us = self.total_evaluation_time_us.load(Ordering::Relaxed);
        let avg_evaluation_time_ms = if total > 0 {
            (total_time_us as f64 / total as f64) / 1000.0
        } else {
            0.0
        };

        TelemetryMetrics {
            total_evaluations: total,
            evaluations_allowed: allowed,
            evaluations_modified: modified,
            evaluations_blocked: blocked,
            lint_runs: self.lint_runs.load(Ordering::Relaxed),
            lint_errors: self.lint_errors.load(Ordering::Relaxed),
            avg_evaluation_time_ms,
        }
    }

    /// Check if telemetry is enabled.
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Get the service name.
    pub fn service_name(&self) -> &str {
        &self.config.service_name
    }
}

/// Metrics collected by telemetry.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TelemetryMetrics {
    /// Total number of evaluations
    pub total_evaluations: u64,
    /// Number of allowed decisions
    pub evaluations_allowed: u64,
    /// Number of modified decisions
    pub evaluations_modified: u64,
    /// Number of blocked decisions
    pub evaluations_blocked: u64,
    /// Number of lint runs
    pub lint_runs: u64,
    /// Total lint errors across all runs
    pub lint_errors: u64,
    /// Average evaluation time in milliseconds
    pub avg_evaluation_time_ms: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_telemetry_creation() {
        let telemetry = Telemetry::new(&TelemetryConfig::default());
        assert!(telemetry.is_enabled());
        assert_eq!(telemetry.service_name(), "gatekeeper-engine");
    }

    #[test]
    fn test_record_evaluation() {
        let telemetry = Telemetry::new(&TelemetryConfig::default());
        telemetry.record_evaluation(Decision::Allowed, 100);
        telemetry.record_evaluation(Decision::Blocked, 200);
        telemetry.record_evaluation(Decision::Allowed, 300);

        let metrics = telemetry.metrics();
        assert_eq!(metrics.total_evaluations, 3);
        assert_eq!(metrics.evaluations_allowed, 2);
        assert_eq!(metrics.evaluations_blocked, 1);
        assert_eq!(metrics.evaluations_modified, 0);
        assert!((metrics.avg_evaluation_time_ms - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_record_lint() {
        let telemetry = Telemetry::new(&TelemetryConfig::default());
        telemetry.record_lint(0);
        telemetry.record_lint(3);

        let metrics = telemetry.metrics();
        assert_eq!(metrics.lint_runs, 2);
        assert_eq!(metrics.lint_errors, 3);
    }
}
