//! Partial-failure paths: the three writes in steps 7-9 are not
//! transactional, so failures after account creation surface as distinct
//! 500s instead of being hidden.

mod common;

use axum::http::StatusCode;
use common::*;

#[tokio::test]
async fn duplicate_email_surfaces_the_provider_message() {
    let app = TestApp::spawn();
    app.store.seed_invitation(invitation("abc123", "a@x.com", "client"));
    app.store.seed_invitation(invitation("def456", "a@x.com", "client"));

    let first = app
        .post_signup(
            Some(CLIENT_ORIGIN),
            signup_body("a@x.com", "password123", "abc123"),
        )
        .await;
    assert_eq!(first.status(), StatusCode::OK);

    // Second invitation, same email: the identity provider refuses.
    let second = app
        .post_signup(
            Some(CLIENT_ORIGIN),
            signup_body("a@x.com", "password123", "def456"),
        )
        .await;
    assert_eq!(second.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(second).await["error"],
        "A user with this email address has already been registered"
    );

    // Provider rejection happens before any mutation of the second token.
    assert!(app.store.invitation("def456").unwrap().used_at.is_none());
    assert_eq!(app.store.user_count(), 1);
}

#[tokio::test]
async fn user_record_failure_reports_500_and_leaves_account_orphaned() {
    let app = TestApp::spawn();
    app.store.seed_invitation(invitation("abc123", "a@x.com", "client"));
    app.store.fail_next_user_insert();

    let response = app
        .post_signup(
            Some(CLIENT_ORIGIN),
            signup_body("a@x.com", "password123", "abc123"),
        )
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await["error"],
        "Failed to create user record"
    );

    // The documented inconsistent state: account exists, mirror row and
    // invitation consumption do not.
    assert_eq!(app.identity.created_count(), 1);
    assert_eq!(app.store.user_count(), 0);
    assert!(app.store.invitation("abc123").unwrap().used_at.is_none());
}

#[tokio::test]
async fn invitation_mark_failure_reports_500_with_account_and_mirror_present() {
    let app = TestApp::spawn();
    app.store.seed_invitation(invitation("abc123", "a@x.com", "client"));
    app.store.fail_next_mark_used();

    let response = app
        .post_signup(
            Some(CLIENT_ORIGIN),
            signup_body("a@x.com", "password123", "abc123"),
        )
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await["error"],
        "Failed to mark invitation as used"
    );

    // Account and mirror row exist; the invitation still shows unused.
    assert_eq!(app.identity.created_count(), 1);
    assert_eq!(app.store.user_count(), 1);
    assert!(app.store.invitation("abc123").unwrap().used_at.is_none());
}

#[tokio::test]
async fn consumption_is_conditional_so_a_raced_loser_cannot_mark_twice() {
    // The conditional used_at update is the at-most-once guard: once a
    // winner consumed the token, the loser's update affects zero rows and
    // any later attempt fails at the reuse check.
    use signup_service::services::SignupStore;

    let app = TestApp::spawn();
    app.store.seed_invitation(invitation("abc123", "a@x.com", "client"));

    assert!(app.store.mark_invitation_used("abc123").await.unwrap());
    assert!(!app.store.mark_invitation_used("abc123").await.unwrap());

    let response = app
        .post_signup(
            Some(CLIENT_ORIGIN),
            signup_body("a@x.com", "password123", "abc123"),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["error"],
        "Invitation token has already been used"
    );
}
