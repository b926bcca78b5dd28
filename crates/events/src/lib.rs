//! Pressroom event bus and delivery.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`ContentEvent`]: the content lifecycle event envelope.
//! - [`EventPersistence`]: background service that durably writes every
//!   event to the `content_events` table.
//! - [`delivery`]: signed webhook delivery and the dispatcher feeding it.

pub mod bus;
pub mod delivery;
pub mod persistence;

pub use bus::{ContentEvent, EventBus, EventKind};
pub use delivery::dispatcher::{WebhookConfig, WebhookDispatcher};
pub use delivery::webhook::WebhookDelivery;
pub use persistence::EventPersistence;
