//! SQLite-backed implementation of the pending-record store port.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use offboard_core::RecordStore;
use offboard_domain::{OffboardError, Result, SeparationRecord};
use rusqlite::types::Type;
use rusqlite::Row;
use tokio::task;
use tracing::warn;

use super::manager::{map_sql_error, DbManager};

const PENDING_SELECT_SQL: &str = "SELECT das_id, resignation_id, last_working_day, event_reason
    FROM pending_separations
    WHERE tenant = ?1 AND status = 'pending'
    ORDER BY resignation_id ASC";

const MARK_PROCESSED_SQL: &str = "UPDATE pending_separations
    SET status = 'succeeded', submitted_at = CAST(strftime('%s','now') AS INTEGER)
    WHERE tenant = ?1 AND resignation_id = ?2 AND status = 'pending'";

/// Reads and transitions pending separation records.
pub struct SeparationRepository {
    db: Arc<DbManager>,
}

impl SeparationRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

fn map_record_row(row: &Row<'_>) -> rusqlite::Result<SeparationRecord> {
    let das_id: String = row.get(0)?;
    let resignation_id: i64 = row.get(1)?;
    let raw_date: String = row.get(2)?;
    let event_reason: String = row.get(3)?;

    let last_working_day = NaiveDate::parse_from_str(&raw_date, "%Y-%m-%d").map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(err))
    })?;

    Ok(SeparationRecord::pending(das_id, resignation_id, last_working_day, event_reason))
}

#[async_trait]
impl RecordStore for SeparationRepository {
    async fn pending(&self, tenant: &str) -> Result<Vec<SeparationRecord>> {
        let db = Arc::clone(&self.db);
        let tenant = tenant.to_string();

        task::spawn_blocking(move || -> Result<Vec<SeparationRecord>> {
            let conn = db.get_connection()?;
            let mut stmt = conn.prepare(PENDING_SELECT_SQL).map_err(map_sql_error)?;

            let rows = stmt.query_map([&tenant], map_record_row).map_err(map_sql_error)?;
            rows.collect::<rusqlite::Result<Vec<_>>>().map_err(map_sql_error)
        })
        .await
        .map_err(|err| OffboardError::Internal(format!("record fetch task failed: {err}")))?
    }

    async fn mark_processed(&self, tenant: &str, resignation_id: i64) -> Result<()> {
        let db = Arc::clone(&self.db);
        let tenant = tenant.to_string();

        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            let updated = conn
                .execute(MARK_PROCESSED_SQL, rusqlite::params![tenant, resignation_id])
                .map_err(map_sql_error)?;

            if updated == 0 {
                warn!(tenant, resignation_id, "no pending row matched the status update");
            }
            Ok(())
        })
        .await
        .map_err(|err| OffboardError::Internal(format!("status update task failed: {err}")))?
    }
}
