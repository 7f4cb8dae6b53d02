//! CORS preflight for guarded routes.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::{middleware::cors, state::AppState};

/// Answer an `OPTIONS` preflight.
///
/// Unlike the gate, this only checks that `Origin` contains the base domain;
/// browsers do not attach the token header to preflight requests.
///
/// - **204 No Content** with CORS headers and a 24 hour max-age
/// - **403 Forbidden** with no CORS headers otherwise
pub async fn preflight(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let origin = headers
        .get(header::ORIGIN)
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default();
    let base_domain = state.gate.allow_list().base_domain();

    if !origin.is_empty() && origin.contains(base_domain) {
        let mut response = StatusCode::NO_CONTENT.into_response();
        if cors::apply_preflight(response.headers_mut(), origin) {
            return response;
        }
    }

    tracing::debug!(origin, "Preflight rejected");
    StatusCode::FORBIDDEN.into_response()
}
