//! User record - application-storage mirror of an identity-provider account.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::Role;

/// Mirror row keyed by the provider-assigned account id.
#[derive(Debug, Clone, FromRow)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    /// Mirror a freshly provisioned account with fresh timestamps.
    pub fn new(id: Uuid, email: String, role: Role) -> Self {
        let now = Utc::now();
        Self {
            id,
            email,
            role: role.as_str().to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}
