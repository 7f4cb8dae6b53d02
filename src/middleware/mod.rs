//! HTTP middleware components.
//!
//! Middleware run before route handlers and can short-circuit a request
//! (reject unauthorized callers) or decorate its response.

/// CORS header helpers
pub mod cors;
/// Token and origin gate for database routes
pub mod gate;
