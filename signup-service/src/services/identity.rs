//! Identity-provider admin client.
//!
//! Accounts live in an external identity provider; this service provisions
//! them through the provider's privileged admin API. Invitation redemption
//! implies a verified email, so accounts are created pre-confirmed with the
//! invitation role attached as app metadata.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use service_core::error::AppError;
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::config::IdentityConfig;
use crate::models::Role;

#[derive(Debug, Error)]
pub enum IdentityError {
    /// Provider refused the account (duplicate email, weak password, ...).
    #[error("{0}")]
    Rejected(String),

    /// Provider could not be reached or answered garbage.
    #[error("identity provider unreachable: {0}")]
    Unreachable(String),
}

/// Provider-side account descriptor returned on creation.
#[derive(Debug, Clone, Deserialize)]
pub struct ProvisionedAccount {
    pub id: Uuid,
    pub email: String,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create a pre-verified account carrying `role` as provider metadata.
    async fn create_account(
        &self,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<ProvisionedAccount, IdentityError>;
}

/// HTTP client for the provider's admin user-creation endpoint.
#[derive(Clone)]
pub struct AdminApiClient {
    http: reqwest::Client,
    base_url: String,
    service_role_key: String,
}

impl AdminApiClient {
    pub fn new(config: &IdentityConfig) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| {
                AppError::InternalError(anyhow::anyhow!(
                    "failed to build identity provider HTTP client: {}",
                    e
                ))
            })?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            service_role_key: config.service_role_key.clone(),
        })
    }
}

#[async_trait]
impl IdentityProvider for AdminApiClient {
    async fn create_account(
        &self,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<ProvisionedAccount, IdentityError> {
        let response = self
            .http
            .post(format!("{}/admin/users", self.base_url))
            .bearer_auth(&self.service_role_key)
            .header("apikey", &self.service_role_key)
            .json(&json!({
                "email": email,
                "password": password,
                "email_confirm": true,
                "app_metadata": { "user_role": role.as_str() },
            }))
            .send()
            .await
            .map_err(|e| IdentityError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            // Provider error bodies vary by version; try the common keys.
            let message = response
                .json::<serde_json::Value>()
                .await
                .ok()
                .and_then(|body| {
                    ["msg", "message", "error"].iter().find_map(|key| {
                        body.get(key).and_then(|v| v.as_str()).map(str::to_owned)
                    })
                })
                .unwrap_or_else(|| format!("account creation rejected with status {}", status));
            return Err(IdentityError::Rejected(message));
        }

        response
            .json::<ProvisionedAccount>()
            .await
            .map_err(|e| IdentityError::Unreachable(format!("invalid provider response: {}", e)))
    }
}

/// In-memory provider for tests. Rejects duplicate emails the way the real
/// provider does.
#[derive(Default)]
pub struct MockIdentityProvider {
    created: Mutex<Vec<ProvisionedAccount>>,
}

impl MockIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn created_accounts(&self) -> Vec<ProvisionedAccount> {
        self.created.lock().unwrap().clone()
    }

    pub fn created_count(&self) -> usize {
        self.created.lock().unwrap().len()
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn create_account(
        &self,
        email: &str,
        _password: &str,
        _role: Role,
    ) -> Result<ProvisionedAccount, IdentityError> {
        let mut created = self.created.lock().unwrap();

        if created.iter().any(|account| account.email == email) {
            return Err(IdentityError::Rejected(
                "A user with this email address has already been registered".to_string(),
            ));
        }

        let account = ProvisionedAccount {
            id: Uuid::new_v4(),
            email: email.to_string(),
        };
        created.push(account.clone());
        Ok(account)
    }
}
