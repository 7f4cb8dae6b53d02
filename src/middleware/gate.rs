//! Request gate: token and origin checks in front of every database route.
//!
//! For each guarded request the gate:
//! 1. Compares `X-Worker-Auth-Token` with the configured secret
//! 2. Checks that the `Origin` or `Referer` hostname is on the allow-list
//! 3. Rejects requests that carry neither header
//!
//! Accepted requests get a [`GateContext`] extension and CORS headers echoing
//! the validated origin on the way out.

use std::{collections::HashSet, sync::Arc};

use axum::{
    extract::{Request, State},
    http::{HeaderMap, Method, StatusCode, header},
    middleware::Next,
    response::Response,
};
use url::Url;

use super::cors;
use crate::error::AppError;

/// Header carrying the shared secret.
pub const AUTH_TOKEN_HEADER: &str = "X-Worker-Auth-Token";

/// Hostnames accepted as request origin.
///
/// Built once at startup from the base domain and a list of subdomain labels,
/// e.g. `dpdns.org` + `["www", "api"]` gives `dpdns.org`, `www.dpdns.org`
/// and `api.dpdns.org`. Lookups are exact; there is no suffix or substring matching.
#[derive(Debug, Clone)]
pub struct AllowList {
    base_domain: String,
    hosts: HashSet<String>,
}

impl AllowList {
    pub fn new(base_domain: &str, subdomains: &[String]) -> Self {
        // Parsed URL hosts come back lowercased, so entries are stored that way too.
        let base_domain = base_domain.trim().to_ascii_lowercase();

        let mut hosts = HashSet::with_capacity(subdomains.len() + 1);
        hosts.insert(base_domain.clone());
        for label in subdomains {
            let label = label.trim().to_ascii_lowercase();
            if !label.is_empty() {
                hosts.insert(format!("{label}.{base_domain}"));
            }
        }

        Self { base_domain, hosts }
    }

    pub fn base_domain(&self) -> &str {
        &self.base_domain
    }

    pub fn contains(&self, host: &str) -> bool {
        !host.is_empty() && self.hosts.contains(host)
    }
}

/// Why the gate turned a request away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    InvalidToken,
    OriginNotAllowed,
    MissingOrigin,
}

impl Rejection {
    pub fn status(self) -> StatusCode {
        match self {
            Rejection::InvalidToken => StatusCode::UNAUTHORIZED,
            Rejection::OriginNotAllowed | Rejection::MissingOrigin => StatusCode::FORBIDDEN,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Rejection::InvalidToken => "Unauthorized",
            Rejection::OriginNotAllowed => "Origin not allowed",
            Rejection::MissingOrigin => "Missing Origin or Referer header",
        }
    }
}

impl From<Rejection> for AppError {
    fn from(rejection: Rejection) -> Self {
        match rejection {
            Rejection::InvalidToken => AppError::Unauthorized,
            other => AppError::Forbidden(other.message()),
        }
    }
}

/// Outcome of [`RequestGate::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    /// `origin_used` is the serialized origin (`scheme://host[:port]`) of the
    /// header that matched, ready to echo in `Access-Control-Allow-Origin`.
    Accepted { origin_used: String },
    Rejected(Rejection),
}

/// Authentication context attached to accepted requests.
#[derive(Debug, Clone)]
pub struct GateContext {
    pub origin: String,
}

/// Token and allow-list, read-only after startup.
#[derive(Clone)]
pub struct RequestGate {
    token: String,
    allow_list: AllowList,
}

impl RequestGate {
    pub fn new(token: impl Into<String>, allow_list: AllowList) -> Self {
        Self {
            token: token.into(),
            allow_list,
        }
    }

    pub fn allow_list(&self) -> &AllowList {
        &self.allow_list
    }

    /// Decide whether a request may reach the database. Pure; reads headers only.
    pub fn validate(&self, headers: &HeaderMap) -> ValidationResult {
        // Step 1: exact token match, no trimming or case folding
        match header_value(headers, AUTH_TOKEN_HEADER) {
            Some(token) if token == self.token => {}
            _ => return ValidationResult::Rejected(Rejection::InvalidToken),
        }

        let origin = header_value(headers, header::ORIGIN.as_str()).unwrap_or_default();
        let referer = header_value(headers, header::REFERER.as_str()).unwrap_or_default();

        // Step 2: any present header whose hostname is on the list wins.
        // Empty headers are skipped here and handled by step 3.
        let present: Vec<&str> = [origin, referer]
            .into_iter()
            .filter(|value| !value.is_empty())
            .collect();

        if let Some(matched) = present
            .iter()
            .find(|value| self.allow_list.contains(&extract_hostname(value)))
        {
            return ValidationResult::Accepted {
                origin_used: serialized_origin(matched),
            };
        }

        if !present.is_empty() {
            return ValidationResult::Rejected(Rejection::OriginNotAllowed);
        }

        // Step 3: neither header sent
        ValidationResult::Rejected(Rejection::MissingOrigin)
    }
}

/// Hostname of `value` parsed as a URL, or an empty string if it does not parse
/// or has no host.
pub fn extract_hostname(value: &str) -> String {
    Url::parse(value)
        .ok()
        .and_then(|url| url.host_str().map(str::to_owned))
        .unwrap_or_default()
}

fn serialized_origin(value: &str) -> String {
    Url::parse(value)
        .map(|url| url.origin().ascii_serialization())
        .unwrap_or_default()
}

/// Non-UTF-8 header values are treated as absent.
fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|h| h.to_str().ok())
}

/// Gate middleware for guarded routes.
///
/// `OPTIONS` requests pass straight through to the preflight handler; browsers
/// send them before any custom header is attached.
///
/// # Returns
///
/// - `Ok(Response)` from the next handler, with CORS headers for the validated origin
/// - `Err(AppError::Unauthorized)` (401) on a missing or wrong token
/// - `Err(AppError::Forbidden)` (403) on a missing or disallowed origin
pub async fn gate_middleware(
    State(gate): State<Arc<RequestGate>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if request.method() == Method::OPTIONS {
        return Ok(next.run(request).await);
    }

    let origin_used = match gate.validate(request.headers()) {
        ValidationResult::Accepted { origin_used } => origin_used,
        ValidationResult::Rejected(rejection) => {
            tracing::warn!(
                method = %request.method(),
                path = %request.uri().path(),
                status = rejection.status().as_u16(),
                reason = rejection.message(),
                "Request rejected by gate"
            );
            return Err(rejection.into());
        }
    };

    request.extensions_mut().insert(GateContext {
        origin: origin_used.clone(),
    });

    let mut response = next.run(request).await;
    cors::apply(response.headers_mut(), &origin_used);

    Ok(response)
}
