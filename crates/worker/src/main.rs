use std::sync::Arc;

use anyhow::Context;
use pressroom_db::PgDocumentStore;
use pressroom_engine::SchedulerConfig;
use pressroom_events::{EventBus, WebhookConfig};
use pressroom_worker::Worker;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "pressroom_worker=debug,pressroom_engine=debug,pressroom_events=info".into());
    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|f| f == "json");
    let registry = tracing_subscriber::registry().with(filter);
    if json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let pool = pressroom_db::create_pool(&database_url, pressroom_db::DEFAULT_MAX_CONNECTIONS)
        .await
        .context("Failed to connect to database")?;
    pressroom_db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;

    let scheduler = SchedulerConfig::from_env();
    tracing::info!(
        interval_secs = scheduler.interval.as_secs(),
        batch_limit = scheduler.batch_limit,
        "Worker starting"
    );

    let store = Arc::new(PgDocumentStore::new(pool.clone()));
    let events = Arc::new(EventBus::default());
    let worker = Worker::new(store, events, scheduler)
        .with_persistence(pool)
        .with_webhooks(WebhookConfig::from_env());

    let cancel = CancellationToken::new();
    let signal = {
        let cancel = cancel.clone();
        async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            }
            tracing::info!("Received SIGINT (Ctrl-C), shutting down");
            cancel.cancel();
        }
    };
    tokio::spawn(signal);

    worker.run(cancel).await?;
    tracing::info!("Worker stopped");
    Ok(())
}
