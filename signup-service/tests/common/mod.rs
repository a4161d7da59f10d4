//! Test helpers for signup-service integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, Response, header},
};
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use service_core::middleware::rate_limit::create_ip_rate_limiter;
use service_core::observability::install_metrics_recorder;
use signup_service::{
    AppState, build_router,
    config::{
        DatabaseConfig, Environment, IdentityConfig, PortalConfig, RateLimitConfig,
        SecurityConfig, SignupConfig,
    },
    models::Invitation,
    portals::PortalMap,
    services::{IdentityProvider, MemoryStore, MockIdentityProvider, SignupService, SignupStore},
};
use tower::util::ServiceExt;

pub const CLIENT_ORIGIN: &str = "http://localhost:3000";
pub const AGENT_ORIGIN: &str = "http://localhost:3001";
pub const ADMIN_ORIGIN: &str = "http://localhost:3002";
/// Allow-listed origin that resolves to no portal.
pub const UNMAPPED_ORIGIN: &str = "https://status.helpdesk.example";
pub const DISALLOWED_ORIGIN: &str = "https://evil.example.com";

/// In-process application with mock storage and identity provider.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub identity: Arc<MockIdentityProvider>,
}

impl TestApp {
    pub fn spawn() -> Self {
        Self::spawn_with(|_| {})
    }

    pub fn spawn_with(tweak: impl FnOnce(&mut SignupConfig)) -> Self {
        let mut config = test_config();
        tweak(&mut config);

        let store = Arc::new(MemoryStore::new());
        let identity = Arc::new(MockIdentityProvider::new());

        let signup = SignupService::new(
            store.clone() as Arc<dyn SignupStore>,
            identity.clone() as Arc<dyn IdentityProvider>,
            PortalMap::from_config(&config.portals),
            config.security.strict_portal_match,
        );

        let state = AppState {
            config: config.clone(),
            store: store.clone() as Arc<dyn SignupStore>,
            signup,
            metrics: install_metrics_recorder(),
            signup_rate_limiter: create_ip_rate_limiter(
                config.rate_limit.signup_attempts,
                config.rate_limit.signup_window_seconds,
            ),
            ip_rate_limiter: create_ip_rate_limiter(
                config.rate_limit.global_ip_limit,
                config.rate_limit.global_ip_window_seconds,
            ),
        };

        TestApp {
            router: build_router(state),
            store,
            identity,
        }
    }

    pub async fn post_signup(&self, origin: Option<&str>, body: Value) -> Response<Body> {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri("/auth/signup")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(origin) = origin {
            builder = builder.header(header::ORIGIN, origin);
        }

        self.router
            .clone()
            .oneshot(builder.body(Body::from(body.to_string())).unwrap())
            .await
            .unwrap()
    }

    pub async fn request(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }
}

pub fn test_config() -> SignupConfig {
    SignupConfig {
        common: service_core::config::Config { port: 9100 },
        environment: Environment::Dev,
        service_name: "signup-service".to_string(),
        service_version: "test".to_string(),
        log_level: "error".to_string(),
        otlp_endpoint: None,
        database: DatabaseConfig {
            url: "postgres://localhost/signup_test".to_string(),
            max_connections: 5,
            min_connections: 1,
        },
        identity: IdentityConfig {
            base_url: "http://localhost:9999".to_string(),
            service_role_key: "test-service-role-key".to_string(),
            timeout_seconds: 5,
        },
        security: SecurityConfig {
            allowed_origins: vec![
                CLIENT_ORIGIN.to_string(),
                AGENT_ORIGIN.to_string(),
                ADMIN_ORIGIN.to_string(),
                UNMAPPED_ORIGIN.to_string(),
            ],
            strict_portal_match: false,
        },
        portals: PortalConfig {
            client_identifiers: vec!["localhost:3000".to_string()],
            agent_identifiers: vec!["localhost:3001".to_string()],
            admin_identifiers: vec!["localhost:3002".to_string()],
        },
        rate_limit: RateLimitConfig {
            signup_attempts: 100,
            signup_window_seconds: 60,
            global_ip_limit: 1000,
            global_ip_window_seconds: 60,
        },
    }
}

pub fn invitation(token: &str, email: &str, role: &str) -> Invitation {
    Invitation {
        token: token.to_string(),
        email: email.to_string(),
        role: role.to_string(),
        expires_at: Some(Utc::now() + Duration::hours(24)),
        used_at: None,
        created_at: Utc::now(),
    }
}

pub fn signup_body(email: &str, password: &str, token: &str) -> Value {
    json!({ "email": email, "password": password, "token": token })
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap_or_else(|_| {
        panic!(
            "response body was not JSON: {}",
            String::from_utf8_lossy(&bytes)
        )
    })
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8_lossy(&bytes).to_string()
}
