//! Per-run context and aggregate counters

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Aggregate counts for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCounters {
    pub total: u32,
    pub succeeded: u32,
    pub failed: u32,
}

/// One instance per run; mutated only by the batch runner, never shared
/// across tenants or concurrent runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunContext {
    pub run_id: Uuid,
    pub tenant: String,
    pub started_at: DateTime<Utc>,
    pub counters: RunCounters,
}

impl RunContext {
    /// Start a new run for `tenant` with a fresh run id.
    #[must_use]
    pub fn start(tenant: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            tenant: tenant.into(),
            started_at: Utc::now(),
            counters: RunCounters::default(),
        }
    }

    pub fn record_success(&mut self) {
        self.counters.succeeded += 1;
    }

    pub fn record_failure(&mut self) {
        self.counters.failed += 1;
    }

    /// Seconds elapsed since the run started.
    #[must_use]
    pub fn duration_secs(&self, now: DateTime<Utc>) -> i64 {
        (now - self.started_at).num_seconds()
    }
}
