//! Origin allow-list guard.
//!
//! Runs before any business logic, preflight handling included: requests
//! from origins outside the configured allow-list get a flat 403. The
//! validated origin is stashed as a request extension for the portal/role
//! check downstream; response CORS headers are computed per request by the
//! CORS layer, never from shared mutable state.

use axum::{
    extract::{Request, State},
    http::{StatusCode, header::ORIGIN},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Allow-list policy computed once from configuration.
#[derive(Debug, Clone)]
pub struct OriginPolicy {
    allowed_origins: Vec<String>,
}

impl OriginPolicy {
    pub fn new(allowed_origins: Vec<String>) -> Self {
        Self { allowed_origins }
    }

    /// Exact-match allow-list. Requests without an Origin header pass;
    /// only browsers send one, and non-browser callers hold the same
    /// privileged position as same-origin requests.
    pub fn allows(&self, origin: Option<&str>) -> bool {
        match origin {
            Some(origin) => self.allowed_origins.iter().any(|allowed| allowed == origin),
            None => true,
        }
    }
}

/// Origin carried through to the handler after allow-list validation.
#[derive(Debug, Clone)]
pub struct ValidatedOrigin(pub Option<String>);

pub async fn origin_guard(
    State(policy): State<OriginPolicy>,
    mut request: Request,
    next: Next,
) -> Response {
    let origin = request
        .headers()
        .get(ORIGIN)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    if !policy.allows(origin.as_deref()) {
        tracing::warn!(origin = ?origin, "request from disallowed origin rejected");
        return (StatusCode::FORBIDDEN, "Not allowed").into_response();
    }

    request.extensions_mut().insert(ValidatedOrigin(origin));
    next.run(request).await
}
