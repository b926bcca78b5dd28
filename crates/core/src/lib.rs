//! Pressroom content core.
//!
//! Domain logic with zero internal dependencies: the block model and generic
//! block editor, undo/redo history and edit sessions, documents, the
//! editorial workflow machine, version snapshots, and the [`DocumentStore`]
//! persistence seam (with an in-memory implementation).
//!
//! [`DocumentStore`]: store::DocumentStore

pub mod block;
pub mod document;
pub mod editor;
pub mod error;
pub mod history;
pub mod memory;
pub mod roles;
pub mod session;
pub mod store;
pub mod types;
pub mod version;
pub mod workflow;
