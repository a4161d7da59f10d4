//! The invitation-redemption workflow.
//!
//! One redemption is a short sequence of validations followed by three
//! non-transactional writes to external systems (identity provider, users
//! mirror, invitation consumption). There is no saga coordinating them:
//! failures after account creation are reported as distinct partial-failure
//! errors and logged with account id, email and token so an operator can
//! reconcile.

use std::sync::Arc;

use crate::dtos::AccountDescriptor;
use crate::models::{Role, UserRecord};
use crate::portals::PortalMap;
use crate::services::error::SignupError;
use crate::services::identity::{IdentityError, IdentityProvider};
use crate::services::store::SignupStore;

#[derive(Clone)]
pub struct SignupService {
    store: Arc<dyn SignupStore>,
    identity: Arc<dyn IdentityProvider>,
    portals: PortalMap,
    strict_portal_match: bool,
}

impl SignupService {
    pub fn new(
        store: Arc<dyn SignupStore>,
        identity: Arc<dyn IdentityProvider>,
        portals: PortalMap,
        strict_portal_match: bool,
    ) -> Self {
        Self {
            store,
            identity,
            portals,
            strict_portal_match,
        }
    }

    /// Redeem an invitation: validate the token, bind portal to role,
    /// provision the account, mirror the user record and consume the token.
    ///
    /// Not idempotent: replaying after success fails with
    /// `InvitationAlreadyUsed`.
    #[tracing::instrument(skip(self, password), fields(email = %email))]
    pub async fn redeem(
        &self,
        email: &str,
        password: &str,
        token: &str,
        origin: Option<&str>,
    ) -> Result<AccountDescriptor, SignupError> {
        let invitation = self
            .store
            .find_invitation(token, email)
            .await
            .map_err(SignupError::Internal)?
            .ok_or(SignupError::InvalidInvitation)?;

        let role: Role = invitation
            .role
            .parse()
            .map_err(|_| SignupError::InvalidInvitation)?;

        // The invitation may only be redeemed on the portal matching its
        // role. An origin resolving to no portal skips the check unless
        // strict matching is configured.
        match origin.and_then(|o| self.portals.resolve(o)) {
            Some(required) if required != role => {
                tracing::warn!(
                    origin = ?origin,
                    required_role = %required,
                    invitation_role = %role,
                    "signup blocked: wrong portal for invitation role"
                );
                return Err(SignupError::WrongPortal(role));
            }
            Some(_) => {}
            None if self.strict_portal_match => {
                tracing::warn!(origin = ?origin, "signup blocked: origin resolves to no portal");
                return Err(SignupError::UnresolvedPortal);
            }
            None => {
                tracing::debug!(origin = ?origin, "origin resolves to no portal; role check skipped");
            }
        }

        if invitation.is_expired() {
            return Err(SignupError::InvitationExpired);
        }

        if invitation.is_used() {
            return Err(SignupError::InvitationAlreadyUsed);
        }

        let account = self
            .identity
            .create_account(email, password, role)
            .await
            .map_err(|err| match err {
                IdentityError::Rejected(message) => {
                    tracing::warn!(error = %message, "identity provider rejected account creation");
                    SignupError::AccountCreationFailed(message)
                }
                IdentityError::Unreachable(message) => {
                    tracing::error!(error = %message, "identity provider unreachable");
                    SignupError::Internal(anyhow::anyhow!(message))
                }
            })?;

        // From here on the account exists in the identity provider; any
        // failure leaves external systems inconsistent and must be logged
        // with enough detail for reconciliation.
        let user = UserRecord::new(account.id, email.to_string(), role);
        if let Err(err) = self.store.insert_user(&user).await {
            tracing::error!(
                account_id = %account.id,
                email = %email,
                token = %token,
                error = %err,
                "user record insert failed after account creation; reconciliation required"
            );
            return Err(SignupError::UserRecordFailed);
        }

        match self.store.mark_invitation_used(token).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::error!(
                    account_id = %account.id,
                    email = %email,
                    token = %token,
                    "invitation was consumed concurrently; possible double redemption"
                );
                return Err(SignupError::InvitationMarkFailed);
            }
            Err(err) => {
                tracing::error!(
                    account_id = %account.id,
                    email = %email,
                    token = %token,
                    error = %err,
                    "failed to mark invitation as used; reconciliation required"
                );
                return Err(SignupError::InvitationMarkFailed);
            }
        }

        tracing::info!(account_id = %account.id, role = %role, "invitation redeemed");

        Ok(AccountDescriptor {
            id: account.id,
            email: account.email,
            role,
        })
    }
}
