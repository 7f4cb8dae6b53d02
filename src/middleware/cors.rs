//! CORS response headers shared by the gate and the preflight handler.

use axum::http::{
    HeaderMap, HeaderValue,
    header::{
        ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
        ACCESS_CONTROL_MAX_AGE,
    },
};

pub const ALLOWED_METHODS: &str = "GET, POST, OPTIONS";
pub const ALLOWED_HEADERS: &str = "X-Worker-Auth-Token, Content-Type";

/// 24 hours, in seconds.
pub const PREFLIGHT_MAX_AGE: &str = "86400";

/// Scope CORS to `origin`. Returns false (and writes nothing) if `origin`
/// is not a valid header value.
pub fn apply(headers: &mut HeaderMap, origin: &str) -> bool {
    let Ok(origin) = HeaderValue::from_str(origin) else {
        return false;
    };

    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOWED_HEADERS),
    );
    true
}

/// Same as [`apply`], plus the preflight cache directive.
pub fn apply_preflight(headers: &mut HeaderMap, origin: &str) -> bool {
    if !apply(headers, origin) {
        return false;
    }
    headers.insert(
        ACCESS_CONTROL_MAX_AGE,
        HeaderValue::from_static(PREFLIGHT_MAX_AGE),
    );
    true
}
