//! HTTP request handlers (route handlers).

/// Public health check
pub mod health;
/// CORS preflight for guarded routes
pub mod preflight;
/// `/api/mysql-test` read and insert
pub mod users;
