//! Pressroom content engine.
//!
//! [`ContentService`] is the write and read surface over a
//! [`DocumentStore`](pressroom_core::store::DocumentStore): create, save,
//! workflow transitions, version restore, soft delete and the published
//! read path. [`ScheduledPublisher`] is the out-of-band reconciliation that
//! publishes reviewing documents once their schedule elapses.

pub mod scheduler;
pub mod service;

pub use scheduler::{ReconcileReport, ScheduledPublisher, SchedulerConfig};
pub use service::ContentService;
