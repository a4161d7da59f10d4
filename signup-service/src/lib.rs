pub mod config;
pub mod db;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod portals;
pub mod services;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    http::{HeaderValue, Method, Request, header},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};
use service_core::middleware::{
    metrics::metrics_middleware,
    rate_limit::{IpRateLimiter, ip_rate_limit_middleware},
    security_headers::security_headers_middleware,
    tracing::request_id_middleware,
};
use service_core::observability::metrics::PrometheusHandle;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::SignupConfig;
use crate::middleware::{OriginPolicy, origin_guard};
use crate::services::{SignupService, SignupStore};

#[derive(Clone)]
pub struct AppState {
    pub config: SignupConfig,
    pub store: Arc<dyn SignupStore>,
    pub signup: SignupService,
    pub metrics: PrometheusHandle,
    pub signup_rate_limiter: IpRateLimiter,
    pub ip_rate_limiter: IpRateLimiter,
}

pub fn build_router(state: AppState) -> Router {
    // Signup route with its own, tighter rate limit
    let signup_limiter = state.signup_rate_limiter.clone();
    let signup_route = Router::new()
        .route("/auth/signup", post(handlers::signup::signup))
        .layer(from_fn_with_state(signup_limiter, ip_rate_limit_middleware));

    let origin_policy = OriginPolicy::new(state.config.security.allowed_origins.clone());
    let cors = cors_layer(&state.config.security.allowed_origins);
    let ip_limiter = state.ip_rate_limiter.clone();

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics::metrics))
        .merge(signup_route)
        .with_state(state)
        // Global IP rate limiting
        .layer(from_fn_with_state(ip_limiter, ip_rate_limit_middleware))
        // Request metrics
        .layer(from_fn(metrics_middleware))
        // Tracing span per request
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        // Request-id propagation
        .layer(from_fn(request_id_middleware))
        // Security headers
        .layer(from_fn(security_headers_middleware))
        // CORS response headers and preflight handling
        .layer(cors)
        // Outermost: allow-list rejection before anything else runs,
        // preflight included
        .layer(from_fn_with_state(origin_policy, origin_guard))
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::error!(origin = %origin, error = %err, "skipping invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::HeaderName::from_static("apikey"),
            header::HeaderName::from_static("x-client-info"),
        ])
        .max_age(Duration::from_secs(86400))
}
