use std::sync::Arc;

use anyhow::Context;
use pressroom_api::config::ServerConfig;
use pressroom_api::router::build_app_router;
use pressroom_api::state::AppState;
use pressroom_db::PgDocumentStore;
use pressroom_engine::ContentService;
use pressroom_events::{EventBus, EventPersistence, WebhookDispatcher};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "pressroom_api=debug,pressroom_engine=debug,tower_http=debug".into());
    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|f| f == "json");
    let registry = tracing_subscriber::registry().with(filter);
    if json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let max_connections = config.database_max_connections;

    let pool = pressroom_db::create_pool(&database_url, max_connections)
        .await
        .context("Failed to connect to database")?;
    tracing::info!(max_connections, "Database connection pool created");

    pressroom_db::health_check(&pool)
        .await
        .context("Database health check failed")?;

    pressroom_db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    // --- Event bus ---
    let event_bus = Arc::new(EventBus::default());
    let cancel = CancellationToken::new();

    let persistence_handle = tokio::spawn(EventPersistence::run(
        pool.clone(),
        event_bus.subscribe(),
        cancel.clone(),
    ));

    let webhook_handle = if config.webhooks.is_enabled() {
        let endpoints = config.webhooks.urls.len();
        let dispatcher = WebhookDispatcher::new(config.webhooks.clone())
            .context("Failed to build webhook client")?;
        tracing::info!(endpoints, "Webhook delivery enabled");
        Some(tokio::spawn(
            dispatcher.run(event_bus.subscribe(), cancel.clone()),
        ))
    } else {
        None
    };

    tracing::info!("Event services started");

    // --- App state ---
    let store = Arc::new(PgDocumentStore::new(pool.clone()));
    let state = AppState {
        service: ContentService::new(store, Arc::clone(&event_bus)),
        config: Arc::new(config.clone()),
        event_bus: Arc::clone(&event_bus),
        pool: Some(pool),
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = config.socket_addr().context("Invalid HOST address")?;
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    // Dropping the last sender closes the channel, so the subscribers drain
    // what is buffered before exiting. Cancellation bounds the wait.
    drop(event_bus);
    let grace = config.shutdown_grace();
    if tokio::time::timeout(grace, persistence_handle).await.is_err() {
        cancel.cancel();
    }
    if let Some(handle) = webhook_handle {
        let _ = tokio::time::timeout(grace, handle).await;
    }
    cancel.cancel();
    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
