//! SQLite-backed implementation of the audit sink port.
//!
//! Appends are best-effort by contract: a database failure must never
//! surface to the batch loop. When the insert fails, the entry is written
//! to a per-tenant fallback log file instead, and that write failure is in
//! turn only logged.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use offboard_core::AuditSink;
use offboard_domain::{AuditEntry, EmailLogEntry, Escalation, OffboardError, Result};
use rusqlite::types::Type;
use rusqlite::Row;
use tokio::task;
use tracing::warn;
use uuid::Uuid;

use super::manager::{map_sql_error, DbManager};

const AUDIT_INSERT_SQL: &str = "INSERT INTO separation_audit_log (
        tenant, run_id, das_id, success, request_body, response_body,
        error_message, error_details, escalate_to, started_at, ended_at, duration_secs
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)";

const AUDIT_SELECT_SQL: &str = "SELECT
        tenant, run_id, das_id, success, request_body, response_body,
        error_message, error_details, escalate_to, started_at, ended_at
    FROM separation_audit_log
    WHERE tenant = ?1 AND run_id = ?2
    ORDER BY id ASC";

const EMAIL_INSERT_SQL: &str = "INSERT INTO email_log (
        tenant, sender, recipients, cc, subject, body, sent, failure_reason,
        audience, created_at
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, CAST(strftime('%s','now') AS INTEGER))";

/// Append-only audit log with a file fallback.
pub struct AuditRepository {
    db: Arc<DbManager>,
    fallback_dir: PathBuf,
}

impl AuditRepository {
    /// `fallback_dir` receives per-tenant log files when the database is
    /// unavailable.
    pub fn new(db: Arc<DbManager>, fallback_dir: impl Into<PathBuf>) -> Self {
        Self { db, fallback_dir: fallback_dir.into() }
    }

    async fn insert(&self, entry: &AuditEntry) -> Result<()> {
        let db = Arc::clone(&self.db);
        let entry = entry.clone();

        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            let duration_secs =
                (entry.ended_at - entry.started_at).num_milliseconds() as f64 / 1000.0;
            conn.execute(
                AUDIT_INSERT_SQL,
                rusqlite::params![
                    entry.tenant,
                    entry.run_id.to_string(),
                    entry.subject_id,
                    entry.success,
                    entry.request_body,
                    entry.response_body,
                    entry.error_message,
                    entry.error_details,
                    entry.escalate_to.as_str(),
                    entry.started_at.to_rfc3339(),
                    entry.ended_at.to_rfc3339(),
                    duration_secs,
                ],
            )
            .map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(|err| OffboardError::Internal(format!("audit insert task failed: {err}")))?
    }

    /// All audit rows for one run, in insertion order.
    pub async fn entries_for_run(&self, tenant: &str, run_id: Uuid) -> Result<Vec<AuditEntry>> {
        let db = Arc::clone(&self.db);
        let tenant = tenant.to_string();

        task::spawn_blocking(move || -> Result<Vec<AuditEntry>> {
            let conn = db.get_connection()?;
            let mut stmt = conn.prepare(AUDIT_SELECT_SQL).map_err(map_sql_error)?;
            let rows = stmt
                .query_map([&tenant, &run_id.to_string()], map_audit_row)
                .map_err(map_sql_error)?;
            rows.collect::<rusqlite::Result<Vec<_>>>().map_err(map_sql_error)
        })
        .await
        .map_err(|err| OffboardError::Internal(format!("audit fetch task failed: {err}")))?
    }

    /// Record one notification delivery attempt.
    pub async fn record_email(&self, entry: &EmailLogEntry) -> Result<()> {
        let db = Arc::clone(&self.db);
        let entry = entry.clone();

        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            conn.execute(
                EMAIL_INSERT_SQL,
                rusqlite::params![
                    entry.tenant,
                    entry.sender,
                    entry.recipients,
                    entry.cc,
                    entry.subject,
                    entry.body,
                    entry.sent,
                    entry.failure_reason,
                    entry.audience.as_str(),
                ],
            )
            .map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(|err| OffboardError::Internal(format!("email log task failed: {err}")))?
    }

    /// Append a line to the per-tenant fallback file.
    async fn write_fallback(&self, tenant: &str, message: String) {
        let path = self.fallback_dir.join(format!("{tenant}_api.log"));
        let line = format!("{} - {message}\n", Utc::now().format("%Y-%m-%d %H:%M:%S"));

        let result = task::spawn_blocking(move || -> std::io::Result<()> {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let mut file = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
            file.write_all(line.as_bytes())
        })
        .await;

        match result {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!(tenant, error = %err, "fallback audit write failed"),
            Err(err) => warn!(tenant, error = %err, "fallback audit task failed"),
        }
    }
}

#[async_trait]
impl AuditSink for AuditRepository {
    async fn append(&self, entry: &AuditEntry) {
        if let Err(err) = self.insert(entry).await {
            warn!(
                tenant = %entry.tenant,
                run_id = %entry.run_id,
                error = %err,
                "audit insert failed, writing fallback entry"
            );
            let message = format!(
                "[AUDIT FALLBACK] run_id={} das_id={} success={} error={}",
                entry.run_id,
                entry.subject_id,
                entry.success,
                entry.error_message.as_deref().unwrap_or("-"),
            );
            self.write_fallback(&entry.tenant, message).await;
        }
    }
}

fn map_audit_row(row: &Row<'_>) -> rusqlite::Result<AuditEntry> {
    let run_id_raw: String = row.get(1)?;
    let run_id = Uuid::parse_str(&run_id_raw)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(err)))?;

    let escalate_raw: String = row.get(8)?;
    let started_raw: String = row.get(9)?;
    let ended_raw: String = row.get(10)?;

    Ok(AuditEntry {
        tenant: row.get(0)?,
        subject_id: row.get(2)?,
        success: row.get(3)?,
        request_body: row.get(4)?,
        response_body: row.get(5)?,
        error_message: row.get(6)?,
        error_details: row.get(7)?,
        escalate_to: Escalation::parse_or_it(&escalate_raw),
        started_at: parse_timestamp(9, &started_raw)?,
        ended_at: parse_timestamp(10, &ended_raw)?,
        run_id,
    })
}

fn parse_timestamp(index: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(err)))
}
