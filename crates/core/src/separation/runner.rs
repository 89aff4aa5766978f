//! Per-tenant batch runner
//!
//! Drives one separation run: initial token acquisition, proactive refresh
//! before each record, user-id resolution, termination submission and
//! classification, audit emission, and aggregate counting.
//!
//! Failure isolation is the key invariant: a single record's failure must
//! never prevent subsequent records from being attempted. The one exception
//! is the credential tier (initial token acquisition, mid-run refresh, or a
//! missing config key), which is fatal for the remainder of the run. The
//! distinction is carried by [`OffboardError::is_credential_failure`] rather
//! than by exception scope, so it is an explicit, testable contract.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use offboard_domain::config::keys;
use offboard_domain::constants::CONFIG_PURPOSE_API;
use offboard_domain::{
    AuditEntry, OffboardError, Result, RunContext, SeparationRecord, TenantConfig,
};
use tracing::{debug, error, info, warn};

use super::classifier::{classify, Classification};
use super::payload::TerminationPayload;
use super::ports::{
    AuditSink, ConfigStore, DirectoryGateway, RecordStore, SessionTokens, TerminationGateway,
};

/// Tenant config keys that must exist before any record is processed.
const REQUIRED_KEYS: &[&str] = &[
    keys::SAML_ENDPOINT,
    keys::TOKEN_ENDPOINT,
    keys::CLIENT_ID,
    keys::COMPANY_ID,
    keys::GRANT_TYPE,
    keys::TOKEN_FIELD,
    keys::SAML_PRIVATE_KEY,
    keys::SAML_USER_ID,
    keys::USER_ENDPOINT,
    keys::TERMINATION_ENDPOINT,
    keys::TERMINATION_URI,
];

/// Sequential batch runner for one tenant.
pub struct BatchRunner {
    configs: Arc<dyn ConfigStore>,
    records: Arc<dyn RecordStore>,
    tokens: Arc<dyn SessionTokens>,
    directory: Arc<dyn DirectoryGateway>,
    terminations: Arc<dyn TerminationGateway>,
    audit: Arc<dyn AuditSink>,
}

impl BatchRunner {
    pub fn new(
        configs: Arc<dyn ConfigStore>,
        records: Arc<dyn RecordStore>,
        tokens: Arc<dyn SessionTokens>,
        directory: Arc<dyn DirectoryGateway>,
        terminations: Arc<dyn TerminationGateway>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self { configs, records, tokens, directory, terminations, audit }
    }

    /// Execute one run for `tenant` and return its completed context.
    ///
    /// Never propagates an error: a fatal failure aborts the remainder of
    /// the run, but the run summary is always emitted and the context
    /// always returned for notification dispatch.
    pub async fn run(&self, tenant: &str) -> RunContext {
        let mut ctx = RunContext::start(tenant);
        info!(tenant, run_id = %ctx.run_id, "starting separation run");

        if let Err(err) = self.process(&mut ctx).await {
            error!(tenant, run_id = %ctx.run_id, error = %err, "separation run aborted");
        }

        let now = Utc::now();
        info!(
            tenant,
            run_id = %ctx.run_id,
            total = ctx.counters.total,
            succeeded = ctx.counters.succeeded,
            failed = ctx.counters.failed,
            duration_secs = ctx.duration_secs(now),
            "separation run completed"
        );

        ctx
    }

    async fn process(&self, ctx: &mut RunContext) -> Result<()> {
        let started = Utc::now();
        let config = match self.load_config(&ctx.tenant).await {
            Ok(config) => config,
            Err(err) => {
                self.audit_credential_failure(ctx, started, &err).await;
                return Err(err);
            }
        };

        // Fatal precondition: without an initial token no record can be
        // submitted, so nothing is attempted.
        let started = Utc::now();
        if let Err(err) = self.tokens.refresh(&config).await {
            self.audit_credential_failure(ctx, started, &err).await;
            return Err(err);
        }

        let records = match self.records.pending(&ctx.tenant).await {
            Ok(records) => records,
            Err(err) => {
                self.audit_credential_failure(ctx, started, &err).await;
                return Err(err);
            }
        };
        ctx.counters.total = records.len() as u32;
        debug!(tenant = %ctx.tenant, count = records.len(), "loaded pending records");

        for record in &records {
            // A token expiring mid-run is refreshed proactively; a refresh
            // failure here is fatal for all subsequent records.
            if self.token_expired().await {
                let started = Utc::now();
                if let Err(err) = self.tokens.refresh(&config).await {
                    self.audit_credential_failure(ctx, started, &err).await;
                    return Err(err);
                }
            }

            match self.process_record(ctx, &config, record).await {
                Ok(()) => ctx.record_success(),
                Err(err) if err.is_credential_failure() => {
                    ctx.record_failure();
                    return Err(err);
                }
                Err(err) => {
                    warn!(
                        tenant = %ctx.tenant,
                        das_id = %record.das_id,
                        resignation_id = record.resignation_id,
                        error = %err,
                        "record failed, continuing with next"
                    );
                    ctx.record_failure();
                }
            }
        }

        Ok(())
    }

    async fn load_config(&self, tenant: &str) -> Result<TenantConfig> {
        let config = self.configs.load(tenant, CONFIG_PURPOSE_API).await?;
        for key in REQUIRED_KEYS {
            config.require(key)?;
        }
        Ok(config)
    }

    async fn token_expired(&self) -> bool {
        match self.tokens.current().await {
            Some(token) => token.is_expired(Utc::now()),
            None => true,
        }
    }

    /// Process a single record end to end. Any error returned here has
    /// already been audited.
    async fn process_record(
        &self,
        ctx: &RunContext,
        config: &TenantConfig,
        record: &SeparationRecord,
    ) -> Result<()> {
        let started = Utc::now();

        let user_id = match self.directory.resolve_user_id(config, &record.das_id).await {
            Ok(user_id) => user_id,
            Err(err) => {
                let entry = AuditEntry::failure(
                    &ctx.tenant,
                    ctx.run_id,
                    &record.das_id,
                    started,
                    err.escalation(),
                    err.to_string(),
                )
                .with_details(record_details(record, &err));
                self.audit.append(&entry).await;
                return Err(err);
            }
        };

        let payload = TerminationPayload::build(
            &record.das_id,
            &user_id,
            record.last_working_day,
            &record.event_reason,
            config.require(keys::TERMINATION_URI)?,
        );

        let call = match self.terminations.submit(config, &payload).await {
            Ok(call) => call,
            Err(err) => {
                let mut entry = AuditEntry::failure(
                    &ctx.tenant,
                    ctx.run_id,
                    &record.das_id,
                    started,
                    err.escalation(),
                    err.to_string(),
                )
                .with_details(record_details(record, &err));
                if let Ok(body) = payload.to_json() {
                    entry = entry.with_request(body);
                }
                self.audit.append(&entry).await;
                return Err(err);
            }
        };

        match classify(&call.response_body) {
            Classification::Success => {
                if let Err(err) =
                    self.records.mark_processed(&ctx.tenant, record.resignation_id).await
                {
                    let entry = AuditEntry::failure(
                        &ctx.tenant,
                        ctx.run_id,
                        &record.das_id,
                        started,
                        err.escalation(),
                        err.to_string(),
                    )
                    .with_details(record_details(record, &err))
                    .with_request(call.request_body)
                    .with_response(call.response_body);
                    self.audit.append(&entry).await;
                    return Err(err);
                }

                let entry = AuditEntry::success(&ctx.tenant, ctx.run_id, &record.das_id, started)
                    .with_request(call.request_body)
                    .with_response(call.response_body);
                self.audit.append(&entry).await;
                Ok(())
            }
            Classification::Failure(reason) => {
                let err = OffboardError::Termination(reason);
                let entry = AuditEntry::failure(
                    &ctx.tenant,
                    ctx.run_id,
                    &record.das_id,
                    started,
                    err.escalation(),
                    err.to_string(),
                )
                .with_details(record_details(record, &err))
                .with_request(call.request_body)
                .with_response(call.response_body);
                self.audit.append(&entry).await;
                Err(err)
            }
        }
    }

    async fn audit_credential_failure(
        &self,
        ctx: &RunContext,
        started: DateTime<Utc>,
        err: &OffboardError,
    ) {
        let entry = AuditEntry::failure(
            &ctx.tenant,
            ctx.run_id,
            "",
            started,
            err.escalation(),
            err.to_string(),
        )
        .with_details(format!("tenant={} | {err}", ctx.tenant));
        self.audit.append(&entry).await;
    }
}

fn record_details(record: &SeparationRecord, err: &OffboardError) -> String {
    format!("resignation_id=[{}] | {err}", record.resignation_id)
}
