//! Background services for pressroom.
//!
//! The worker owns everything that runs on a clock or off the event bus
//! rather than per request: the scheduled publisher, event persistence and
//! webhook delivery. [`Worker::run`] drives them until cancelled.

use std::sync::Arc;
use std::time::Duration;

use pressroom_core::store::DocumentStore;
use pressroom_db::DbPool;
use pressroom_engine::{ScheduledPublisher, SchedulerConfig};
use pressroom_events::{EventBus, EventPersistence, WebhookConfig, WebhookDispatcher};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// How long shutdown waits for each service to wind down.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

pub struct Worker {
    store: Arc<dyn DocumentStore>,
    events: Arc<EventBus>,
    scheduler: SchedulerConfig,
    webhooks: WebhookConfig,
    pool: Option<DbPool>,
}

impl Worker {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        events: Arc<EventBus>,
        scheduler: SchedulerConfig,
    ) -> Self {
        Self {
            store,
            events,
            scheduler,
            webhooks: WebhookConfig::default(),
            pool: None,
        }
    }

    /// Persist every event the scheduler emits to `pool`.
    pub fn with_persistence(mut self, pool: DbPool) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Deliver every event to the configured webhook endpoints.
    pub fn with_webhooks(mut self, webhooks: WebhookConfig) -> Self {
        self.webhooks = webhooks;
        self
    }

    /// Run all services until `cancel` fires.
    pub async fn run(self, cancel: CancellationToken) -> anyhow::Result<()> {
        let mut handles: Vec<(&'static str, JoinHandle<()>)> = Vec::new();

        if let Some(pool) = self.pool {
            handles.push((
                "event persistence",
                tokio::spawn(EventPersistence::run(
                    pool,
                    self.events.subscribe(),
                    cancel.clone(),
                )),
            ));
        }

        if self.webhooks.is_enabled() {
            let endpoints = self.webhooks.urls.len();
            let dispatcher = WebhookDispatcher::new(self.webhooks)?;
            tracing::info!(endpoints, "Webhook delivery enabled");
            handles.push((
                "webhook dispatcher",
                tokio::spawn(dispatcher.run(self.events.subscribe(), cancel.clone())),
            ));
        }

        let publisher = ScheduledPublisher::new(self.store, self.events, self.scheduler);
        publisher.run(cancel.clone()).await;

        for (name, handle) in handles {
            match tokio::time::timeout(SHUTDOWN_GRACE, handle).await {
                Ok(Ok(())) => tracing::info!(service = name, "Service stopped"),
                Ok(Err(e)) => tracing::error!(service = name, error = %e, "Service panicked"),
                Err(_) => tracing::warn!(service = name, "Service did not stop in time"),
            }
        }
        Ok(())
    }
}
