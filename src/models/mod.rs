//! Data models representing database entities and API bodies.

/// User rows and `/api/mysql-test` bodies
pub mod user;
