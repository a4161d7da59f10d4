//! Domain errors for the invitation-redemption workflow.
//!
//! Every failure is converted to a structured `{ "error": ... }` response at
//! the boundary; the two partial-failure variants deliberately keep their
//! specific operator-facing messages since those are the caller's only
//! signal that reconciliation is needed.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::dtos::ErrorResponse;
use crate::models::Role;

#[derive(Debug, Error)]
pub enum SignupError {
    /// Malformed or missing input fields. No side effects.
    #[error("{0}")]
    InvalidRequest(String),

    /// Token/email lookup matched no single invitation. No side effects.
    #[error("Invalid invitation token")]
    InvalidInvitation,

    /// Invitation redeemed from a portal not matching its role.
    #[error("This signup link can only be used on the {0} portal")]
    WrongPortal(Role),

    /// Strict portal matching is on and the origin resolves to no portal.
    #[error("Signups are not accepted from this origin")]
    UnresolvedPortal,

    #[error("Invitation token has expired")]
    InvitationExpired,

    #[error("Invitation token has already been used")]
    InvitationAlreadyUsed,

    /// Identity provider refused the account; its message is propagated.
    #[error("{0}")]
    AccountCreationFailed(String),

    /// Partial failure: the account exists but the mirror row is missing.
    #[error("Failed to create user record")]
    UserRecordFailed,

    /// Partial failure: account and mirror row exist but the invitation
    /// still shows unused.
    #[error("Failed to mark invitation as used")]
    InvitationMarkFailed,

    #[error("Internal server error")]
    Internal(#[source] anyhow::Error),
}

impl SignupError {
    fn status(&self) -> StatusCode {
        match self {
            SignupError::InvalidRequest(_)
            | SignupError::InvalidInvitation
            | SignupError::InvitationExpired
            | SignupError::InvitationAlreadyUsed
            | SignupError::AccountCreationFailed(_) => StatusCode::BAD_REQUEST,
            SignupError::WrongPortal(_) | SignupError::UnresolvedPortal => StatusCode::FORBIDDEN,
            SignupError::UserRecordFailed
            | SignupError::InvitationMarkFailed
            | SignupError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for SignupError {
    fn into_response(self) -> Response {
        if let SignupError::Internal(ref err) = self {
            tracing::error!(error = %err, "unexpected error in signup flow");
        }

        let status = self.status();
        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
