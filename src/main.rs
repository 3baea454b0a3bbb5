//! Reconciler daemon: periodically refunds rejected payout entries.

use manavault::{config, core::reconciler, errors::Result};
use dotenvy::dotenv;
use std::{env, time::Duration};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_INTERVAL_SECS: u64 = 60;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file (as early as possible)
    dotenv().ok(); // Make it non-fatal, env vars can be set externally
    info!("Attempted to load .env file.");

    // 3. Initialize database
    let db = config::database::create_connection()
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to initialize database: {}", e))?;
    config::database::create_tables(&db).await?;

    // 4. Seed the initial reward campaign if config.toml defines one
    if std::path::Path::new("config.toml").exists() {
        let campaign_config = config::campaign::load_default_config()?;
        config::campaign::seed_initial_campaign(&db, &campaign_config).await?;
    }

    // 5. Run the reconciliation sweep on an interval
    let secs = env::var("RECONCILE_INTERVAL_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_INTERVAL_SECS);
    info!(interval_secs = secs, "Starting payout rejection reconciler");

    let mut ticker = tokio::time::interval(Duration::from_secs(secs));
    loop {
        ticker.tick().await;
        match reconciler::reconcile_rejected_payouts(&db).await {
            Ok(report) if report.refunded > 0 => {
                info!(
                    refunded = report.refunded,
                    total = report.total_amount,
                    "Reconciliation sweep refunded rejected payouts"
                );
            }
            Ok(_) => {}
            Err(e) => error!("Reconciliation sweep failed: {}", e),
        }
    }
}
