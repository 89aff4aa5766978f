//! Post-run notification dispatch
//!
//! After a run completes, the run's audit rows are partitioned by
//! escalation audience (IT vs HR), rendered into per-audience HTML reports,
//! and delivered over SMTP. Delivery problems are recorded in the email log
//! and logged; they never propagate to the caller, since notification is
//! strictly downstream of the run itself.

mod mailer;
mod report;

use std::sync::Arc;

use chrono::Utc;
pub use mailer::{Mailer, OutgoingEmail, SmtpMailer, SmtpServer};
use offboard_core::ConfigStore;
use offboard_domain::config::keys;
use offboard_domain::constants::CONFIG_PURPOSE_EMAIL;
use offboard_domain::{
    AuditEntry, EmailLogEntry, Escalation, OffboardError, Result, RunContext, TenantConfig,
};
use tracing::{debug, error, warn};

use crate::database::AuditRepository;
use mailer::split_recipients;

/// Dispatches the IT and HR notification emails for one completed run.
pub struct NotificationService {
    configs: Arc<dyn ConfigStore>,
    audit: Arc<AuditRepository>,
    mailer: Arc<dyn Mailer>,
}

impl NotificationService {
    pub fn new(
        configs: Arc<dyn ConfigStore>,
        audit: Arc<AuditRepository>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self { configs, audit, mailer }
    }

    /// Dispatch notifications for `ctx`. Never fails the caller.
    pub async fn dispatch(&self, ctx: &RunContext) {
        if let Err(err) = self.try_dispatch(ctx).await {
            error!(
                tenant = %ctx.tenant,
                run_id = %ctx.run_id,
                error = %err,
                "notification dispatch failed"
            );
        }
    }

    async fn try_dispatch(&self, ctx: &RunContext) -> Result<()> {
        let entries = self.audit.entries_for_run(&ctx.tenant, ctx.run_id).await?;
        if entries.is_empty() {
            debug!(tenant = %ctx.tenant, run_id = %ctx.run_id, "no audit rows, nothing to notify");
            return Ok(());
        }

        let config = self.configs.load(&ctx.tenant, CONFIG_PURPOSE_EMAIL).await?;

        let (it_rows, hr_rows): (Vec<AuditEntry>, Vec<AuditEntry>) =
            entries.into_iter().partition(|e| e.escalate_to == Escalation::It);

        for (audience, rows) in [(Escalation::It, it_rows), (Escalation::Hr, hr_rows)] {
            if rows.is_empty() {
                continue;
            }
            self.send_report(ctx, &config, audience, &rows).await;
        }

        Ok(())
    }

    /// Render and deliver one audience's report; outcome goes to the email
    /// log either way.
    async fn send_report(
        &self,
        ctx: &RunContext,
        config: &TenantConfig,
        audience: Escalation,
        entries: &[AuditEntry],
    ) {
        let email = match self.build_email(ctx, config, audience, entries) {
            Ok(Some(email)) => email,
            Ok(None) => return,
            Err(err) => {
                warn!(
                    tenant = %ctx.tenant,
                    audience = %audience,
                    error = %err,
                    "could not build notification email"
                );
                return;
            }
        };

        let server = match self.smtp_server(config) {
            Ok(server) => server,
            Err(err) => {
                warn!(tenant = %ctx.tenant, error = %err, "missing SMTP configuration");
                return;
            }
        };

        let outcome = self.mailer.send(&server, &email).await;
        let log_entry = EmailLogEntry {
            tenant: ctx.tenant.clone(),
            sender: email.from.clone(),
            recipients: email.to.join(","),
            cc: email.cc.join(","),
            subject: email.subject.clone(),
            body: email.html_body.clone(),
            sent: outcome.is_ok(),
            failure_reason: outcome.as_ref().err().map(ToString::to_string),
            audience,
        };

        if let Err(err) = outcome {
            warn!(
                tenant = %ctx.tenant,
                audience = %audience,
                error = %err,
                "notification delivery failed"
            );
        }
        if let Err(err) = self.audit.record_email(&log_entry).await {
            warn!(tenant = %ctx.tenant, error = %err, "email log write failed");
        }
    }

    fn build_email(
        &self,
        ctx: &RunContext,
        config: &TenantConfig,
        audience: Escalation,
        entries: &[AuditEntry],
    ) -> Result<Option<OutgoingEmail>> {
        let (to_key, cc_key) = match audience {
            Escalation::It => (keys::NOTIFY_TO_IT, keys::NOTIFY_CC_IT),
            Escalation::Hr => (keys::NOTIFY_TO_HR, keys::NOTIFY_CC_HR),
        };

        let to = split_recipients(config.get(to_key));
        if to.is_empty() {
            debug!(tenant = %ctx.tenant, audience = %audience, "no recipients configured");
            return Ok(None);
        }
        let cc = split_recipients(config.get(cc_key));

        let run_date = Utc::now().format("%d-%b-%Y %H:%M:%S").to_string();
        let subject = report::render_subject(
            config.get(keys::EMAIL_SUBJECT_TEMPLATE).unwrap_or(report::DEFAULT_SUBJECT_TEMPLATE),
            &run_date,
        )?;
        let table = report::render_table(entries);
        let html_body = report::render_body(
            config.get(keys::EMAIL_BODY_TEMPLATE).unwrap_or(report::DEFAULT_BODY_TEMPLATE),
            &run_date,
            ctx.run_id,
            &table,
        )?;

        let from = config.require(keys::EMAIL_FROM)?.to_string();
        Ok(Some(OutgoingEmail { from, to, cc, subject, html_body }))
    }

    fn smtp_server(&self, config: &TenantConfig) -> Result<SmtpServer> {
        let host = config.require(keys::SMTP_HOST)?.to_string();
        let port = config
            .require(keys::SMTP_PORT)?
            .parse::<u16>()
            .map_err(|err| OffboardError::Config(format!("invalid SMTP port: {err}")))?;
        Ok(SmtpServer { host, port })
    }
}
