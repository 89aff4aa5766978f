//! Application context - dependency injection container

use std::sync::Arc;
use std::time::Duration;

use offboard_core::{AuditSink, BatchRunner, ConfigStore, SessionTokens};
use offboard_domain::{Result, Settings};
use offboard_infra::auth::TokenManager;
use offboard_infra::database::{
    AuditRepository, ConfigRepository, DbManager, SeparationRepository,
};
use offboard_infra::http::{AuthedClient, HttpTransport};
use offboard_infra::integrations::ec::EcClient;
use offboard_infra::notify::{NotificationService, SmtpMailer};

/// Application context - holds the batch runner and notification service
/// wired over one shared transport and one database pool.
pub struct AppContext {
    pub settings: Settings,
    pub db: Arc<DbManager>,
    pub runner: BatchRunner,
    pub notifier: NotificationService,
}

impl AppContext {
    /// Wire all services from the loaded settings.
    ///
    /// The HTTP transport is created exactly once here and handed by
    /// reference into every outbound component.
    pub fn new(settings: Settings) -> Result<Self> {
        let db = Arc::new(DbManager::new(&settings.database.path, settings.database.pool_size)?);
        db.run_migrations()?;
        db.health_check()?;

        let transport = HttpTransport::builder()
            .timeout(Duration::from_secs(settings.http.timeout_seconds))
            .build()?;

        let tokens = Arc::new(TokenManager::new(transport.clone()));
        let ec_client =
            Arc::new(EcClient::new(AuthedClient::new(transport, Arc::clone(&tokens))));

        let configs: Arc<dyn ConfigStore> = Arc::new(ConfigRepository::new(Arc::clone(&db)));
        let records = Arc::new(SeparationRepository::new(Arc::clone(&db)));
        let audit = Arc::new(AuditRepository::new(Arc::clone(&db), settings.run.log_dir.clone()));

        let runner = BatchRunner::new(
            Arc::clone(&configs),
            records,
            tokens as Arc<dyn SessionTokens>,
            Arc::clone(&ec_client) as _,
            ec_client as _,
            Arc::clone(&audit) as Arc<dyn AuditSink>,
        );

        let notifier = NotificationService::new(configs, audit, Arc::new(SmtpMailer));

        Ok(Self { settings, db, runner, notifier })
    }
}
