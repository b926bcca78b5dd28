//! Fan-out of bus events to configured webhook endpoints.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use super::webhook::{WebhookDelivery, WebhookError};
use crate::bus::ContentEvent;

/// Webhook endpoints and signing secret.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WebhookConfig {
    pub urls: Vec<String>,
    pub secret: Option<String>,
}

impl WebhookConfig {
    /// Load from `WEBHOOK_URLS` (comma separated) and `WEBHOOK_SECRET`.
    pub fn from_env() -> Self {
        let urls = std::env::var("WEBHOOK_URLS").unwrap_or_default();
        let secret = std::env::var("WEBHOOK_SECRET")
            .ok()
            .filter(|s| !s.is_empty());
        Self::parse(&urls, secret)
    }

    /// Build from a comma separated URL list and an optional secret.
    pub fn parse(urls: &str, secret: Option<String>) -> Self {
        Self {
            urls: urls
                .split(',')
                .map(str::trim)
                .filter(|u| !u.is_empty())
                .map(String::from)
                .collect(),
            secret,
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.urls.is_empty()
    }
}

/// Subscribes to the bus and delivers each event to every endpoint.
///
/// Each delivery runs in its own tracked task so a slow endpoint never stalls
/// the subscription. [`run`](Self::run) returns only once every in-flight
/// delivery has finished.
pub struct WebhookDispatcher {
    delivery: Arc<WebhookDelivery>,
    urls: Arc<[String]>,
    tracker: TaskTracker,
}

impl WebhookDispatcher {
    pub fn new(config: WebhookConfig) -> Result<Self, WebhookError> {
        Ok(Self {
            delivery: Arc::new(WebhookDelivery::new(config.secret)?),
            urls: config.urls.into(),
            tracker: TaskTracker::new(),
        })
    }

    /// Run until the channel closes or `cancel` fires.
    pub async fn run(
        self,
        mut receiver: broadcast::Receiver<ContentEvent>,
        cancel: CancellationToken,
    ) {
        loop {
            let received = tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Webhook dispatcher cancelled");
                    break;
                }
                received = receiver.recv() => received,
            };
            match received {
                Ok(event) => self.dispatch(event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Webhook dispatcher lagged, events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, webhook dispatcher shutting down");
                    break;
                }
            }
        }

        self.tracker.close();
        if !self.tracker.is_empty() {
            tracing::info!(
                in_flight = self.tracker.len(),
                "Waiting for in-flight webhook deliveries"
            );
        }
        self.tracker.wait().await;
    }

    fn dispatch(&self, event: ContentEvent) {
        let event = Arc::new(event);
        for url in self.urls.iter() {
            let delivery = Arc::clone(&self.delivery);
            let event = Arc::clone(&event);
            let url = url.clone();
            self.tracker.spawn(async move {
                if delivery.deliver(&url, &event).await.is_ok() {
                    tracing::debug!(url, event = %event.kind, "Webhook delivered");
                }
            });
        }
    }
}
