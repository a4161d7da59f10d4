use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::Role;

/// Signup request body.
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    #[validate(length(min = 1, message = "Token is required"))]
    pub token: String,
}

/// Public descriptor of the created account.
#[derive(Debug, Clone, Serialize)]
pub struct AccountDescriptor {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub user: AccountDescriptor,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
