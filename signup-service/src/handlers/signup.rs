//! HTTP boundary for the signup operation.

use axum::{Extension, Json, body::Bytes, extract::State};
use validator::Validate;

use crate::AppState;
use crate::dtos::{SignupRequest, SignupResponse};
use crate::middleware::ValidatedOrigin;
use crate::services::SignupError;

const MISSING_FIELDS: &str =
    "Missing required fields: email, password, and token are required";

/// Redeem an invitation and provision the account.
///
/// POST /auth/signup
#[tracing::instrument(skip_all)]
pub async fn signup(
    State(state): State<AppState>,
    Extension(ValidatedOrigin(origin)): Extension<ValidatedOrigin>,
    body: Bytes,
) -> Result<Json<SignupResponse>, SignupError> {
    // Decode the body by hand so malformed JSON and missing fields both
    // surface as structured 400s instead of the framework's plain-text
    // rejections.
    let request: SignupRequest = serde_json::from_slice(&body)
        .map_err(|_| SignupError::InvalidRequest(MISSING_FIELDS.to_string()))?;

    request
        .validate()
        .map_err(|err| SignupError::InvalidRequest(flatten_validation_errors(&err)))?;

    let account = state
        .signup
        .redeem(
            &request.email,
            &request.password,
            &request.token,
            origin.as_deref(),
        )
        .await?;

    Ok(Json(SignupResponse { user: account }))
}

fn flatten_validation_errors(errors: &validator::ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .values()
        .flat_map(|field_errors| field_errors.iter())
        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
        .collect();
    messages.sort();

    if messages.is_empty() {
        "Invalid request".to_string()
    } else {
        messages.join("; ")
    }
}
