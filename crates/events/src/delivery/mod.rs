//! External delivery of content events.

pub mod dispatcher;
pub mod webhook;
