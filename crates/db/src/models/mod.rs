//! Database row models.
//!
//! Rows mirror table columns one-to-one; conversion into domain types from
//! `pressroom-core` happens here so repositories stay plain SQL.

pub mod document;
pub mod event;
pub mod version;
