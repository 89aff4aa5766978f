//! Port interfaces for separation processing

use async_trait::async_trait;
use offboard_domain::{AuditEntry, BearerToken, Result, SeparationRecord, TenantConfig};

use super::payload::TerminationPayload;

/// Trait for loading per-tenant configuration mappings
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Load the configuration mapping for a tenant and purpose
    async fn load(&self, tenant: &str, purpose: &str) -> Result<TenantConfig>;
}

/// Trait for the pending-record store
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch the ordered set of pending separation records for a tenant
    async fn pending(&self, tenant: &str) -> Result<Vec<SeparationRecord>>;

    /// Mark a record as submitted after a successful termination call
    async fn mark_processed(&self, tenant: &str, resignation_id: i64) -> Result<()>;
}

/// Trait for the run's bearer-token session.
///
/// There is no caller-visible "refreshing" state: a call site either gets a
/// new valid token or a failure signal. Refresh is all-or-nothing.
#[async_trait]
pub trait SessionTokens: Send + Sync {
    /// Exchange credentials for a fresh token, replacing the current one
    async fn refresh(&self, config: &TenantConfig) -> Result<BearerToken>;

    /// The token currently held, if any
    async fn current(&self) -> Option<BearerToken>;
}

/// Trait for resolving remote user ids from the user directory
#[async_trait]
pub trait DirectoryGateway: Send + Sync {
    /// Resolve the remote user id for a DAS id; absence is a
    /// `UserLookup` failure
    async fn resolve_user_id(&self, config: &TenantConfig, das_id: &str) -> Result<String>;
}

/// Captured request/response bodies of one termination call attempt.
///
/// The response body is returned raw: some termination failures arrive with
/// a 200 status and an embedded error payload, so interpretation belongs to
/// the classifier, not the transport.
#[derive(Debug, Clone)]
pub struct TerminationCall {
    pub request_body: String,
    pub response_body: String,
}

/// Trait for submitting termination events to Employee Central
#[async_trait]
pub trait TerminationGateway: Send + Sync {
    /// Submit a termination payload and return the captured bodies
    async fn submit(
        &self,
        config: &TenantConfig,
        payload: &TerminationPayload,
    ) -> Result<TerminationCall>;
}

/// Trait for the append-only audit sink.
///
/// Appends are best-effort: implementations must never raise to the caller.
/// A write failure is handled (and logged) inside the sink itself.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn append(&self, entry: &AuditEntry);
}
