//! SQLite-backed implementation of the config store port.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use offboard_core::ConfigStore;
use offboard_domain::{OffboardError, Result, TenantConfig};
use tokio::task;
use tracing::warn;

use super::manager::{map_sql_error, DbManager};

const CONFIG_SELECT_SQL: &str = "SELECT config_key, config_value
    FROM api_config
    WHERE tenant = ?1 AND purpose = ?2";

/// Reads the per-tenant configuration mapping.
pub struct ConfigRepository {
    db: Arc<DbManager>,
}

impl ConfigRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ConfigStore for ConfigRepository {
    async fn load(&self, tenant: &str, purpose: &str) -> Result<TenantConfig> {
        let db = Arc::clone(&self.db);
        let tenant = tenant.to_string();
        let purpose = purpose.to_string();

        task::spawn_blocking(move || -> Result<TenantConfig> {
            let conn = db.get_connection()?;
            let mut stmt = conn.prepare(CONFIG_SELECT_SQL).map_err(map_sql_error)?;

            let rows = stmt
                .query_map([&tenant, &purpose], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                })
                .map_err(map_sql_error)?;

            let mut values = BTreeMap::new();
            for row in rows {
                let (key, value) = row.map_err(map_sql_error)?;
                values.insert(key, value);
            }

            if values.is_empty() {
                warn!(tenant, purpose, "no configuration rows found");
            }

            Ok(TenantConfig::new(values))
        })
        .await
        .map_err(|err| OffboardError::Internal(format!("config load task failed: {err}")))?
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn seeded_db(temp: &TempDir) -> Arc<DbManager> {
        let db = Arc::new(DbManager::new(temp.path().join("test.db"), 2).expect("manager"));
        db.run_migrations().expect("migrations");

        let conn = db.get_connection().expect("connection");
        for (tenant, purpose, key, value) in [
            ("acme", "separation_ec", "client_id", "client-1"),
            ("acme", "separation_ec", "company_id", "company-1"),
            ("acme", "separation_ec_email", "smtp_host", "smtp.internal"),
            ("globex", "separation_ec", "client_id", "client-2"),
        ] {
            conn.execute(
                "INSERT INTO api_config (tenant, purpose, config_key, config_value) VALUES (?1, ?2, ?3, ?4)",
                [tenant, purpose, key, value],
            )
            .expect("seed row");
        }

        db
    }

    #[tokio::test]
    async fn loads_only_matching_tenant_and_purpose() {
        let temp = TempDir::new().expect("temp dir");
        let repo = ConfigRepository::new(seeded_db(&temp));

        let config = repo.load("acme", "separation_ec").await.expect("config");

        assert_eq!(config.len(), 2);
        assert_eq!(config.get("client_id"), Some("client-1"));
        assert_eq!(config.get("smtp_host"), None);
    }

    #[tokio::test]
    async fn unknown_tenant_yields_empty_mapping() {
        let temp = TempDir::new().expect("temp dir");
        let repo = ConfigRepository::new(seeded_db(&temp));

        let config = repo.load("umbrella", "separation_ec").await.expect("config");
        assert!(config.is_empty());
    }
}
