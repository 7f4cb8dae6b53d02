//! Database access behind the HTTP handlers.

pub mod user_store;
