//! Cross-origin policy: allow-list rejection and preflight handling.

mod common;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use common::*;

#[tokio::test]
async fn disallowed_origin_gets_a_flat_403_before_any_business_logic() {
    let app = TestApp::spawn();
    app.store.seed_invitation(invitation("abc123", "a@x.com", "client"));

    let response = app
        .post_signup(
            Some(DISALLOWED_ORIGIN),
            signup_body("a@x.com", "password123", "abc123"),
        )
        .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_text(response).await, "Not allowed");

    // Nothing was touched.
    assert_eq!(app.identity.created_count(), 0);
    assert_eq!(app.store.user_count(), 0);
    assert!(app.store.invitation("abc123").unwrap().used_at.is_none());
}

#[tokio::test]
async fn preflight_is_answered_without_business_logic() {
    let app = TestApp::spawn();

    let response = app
        .request(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/auth/signup")
                .header(header::ORIGIN, CLIENT_ORIGIN)
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        CLIENT_ORIGIN
    );
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_MAX_AGE).unwrap(),
        "86400"
    );
}

#[tokio::test]
async fn preflight_from_disallowed_origin_is_rejected() {
    let app = TestApp::spawn();

    let response = app
        .request(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/auth/signup")
                .header(header::ORIGIN, DISALLOWED_ORIGIN)
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn successful_response_carries_cors_and_security_headers() {
    let app = TestApp::spawn();
    app.store.seed_invitation(invitation("abc123", "a@x.com", "client"));

    let response = app
        .post_signup(
            Some(CLIENT_ORIGIN),
            signup_body("a@x.com", "password123", "abc123"),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        CLIENT_ORIGIN
    );
    assert_eq!(
        response.headers().get(header::X_CONTENT_TYPE_OPTIONS).unwrap(),
        "nosniff"
    );
    assert_eq!(response.headers().get(header::X_FRAME_OPTIONS).unwrap(), "DENY");
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn health_endpoint_reports_dependencies() {
    let app = TestApp::spawn();

    let response = app
        .request(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "signup-service");
    assert_eq!(body["checks"]["postgres"], "up");
}

#[tokio::test]
async fn metrics_endpoint_serves_prometheus_exposition() {
    let app = TestApp::spawn();

    // Generate at least one request worth of metrics first.
    let _ = app
        .request(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    let response = app
        .request(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
}
