//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods.
//! Reads accept `&PgPool`; writes that must share a transaction accept
//! `&mut PgConnection` so callers can pass `&mut *tx`.

pub mod document_repo;
pub mod event_repo;
pub mod version_repo;

pub use document_repo::DocumentRepo;
pub use event_repo::EventRepo;
pub use version_repo::VersionRepo;
