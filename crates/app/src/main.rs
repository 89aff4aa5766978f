//! Offboard - Employee Central separation submission service
//!
//! Headless batch entry point: each configured tenant is processed as one
//! independent sequential run, followed by its notification dispatch.
//! Tenants never share configuration, tokens, or records.

use offboard_app::AppContext;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> std::process::ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match dotenvy::dotenv() {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(_) => info!("no .env file found, using process environment"),
    }

    let settings = match offboard_infra::config::load() {
        Ok(settings) => settings,
        Err(err) => {
            error!(error = %err, "failed to load settings");
            return std::process::ExitCode::FAILURE;
        }
    };

    let ctx = match AppContext::new(settings) {
        Ok(ctx) => ctx,
        Err(err) => {
            error!(error = %err, "failed to initialise application context");
            return std::process::ExitCode::FAILURE;
        }
    };

    for tenant in ctx.settings.run.tenants.clone() {
        let run = ctx.runner.run(&tenant).await;
        ctx.notifier.dispatch(&run).await;
    }

    std::process::ExitCode::SUCCESS
}
