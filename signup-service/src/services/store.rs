//! Application-storage access for invitations and mirrored user records.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::models::{Invitation, UserRecord};

/// Storage operations the redemption workflow needs.
#[async_trait]
pub trait SignupStore: Send + Sync {
    /// Single-match lookup by exact `(token, email)`; anything other than
    /// exactly one row is reported as no invitation.
    async fn find_invitation(
        &self,
        token: &str,
        email: &str,
    ) -> Result<Option<Invitation>, anyhow::Error>;

    async fn insert_user(&self, user: &UserRecord) -> Result<(), anyhow::Error>;

    /// Conditional consumption: sets `used_at` only while it is still
    /// unset, so a raced second redemption sees zero rows updated.
    async fn mark_invitation_used(&self, token: &str) -> Result<bool, anyhow::Error>;

    /// Storage liveness probe for the health endpoint.
    async fn ping(&self) -> Result<(), anyhow::Error>;
}

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SignupStore for Database {
    async fn find_invitation(
        &self,
        token: &str,
        email: &str,
    ) -> Result<Option<Invitation>, anyhow::Error> {
        let mut rows = sqlx::query_as::<_, Invitation>(
            "SELECT token, email, role, expires_at, used_at, created_at \
             FROM invitations WHERE token = $1 AND email = $2",
        )
        .bind(token)
        .bind(email)
        .fetch_all(&self.pool)
        .await?;

        if rows.len() == 1 {
            Ok(rows.pop())
        } else {
            Ok(None)
        }
    }

    async fn insert_user(&self, user: &UserRecord) -> Result<(), anyhow::Error> {
        sqlx::query(
            "INSERT INTO users (id, email, role, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.role)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn mark_invitation_used(&self, token: &str) -> Result<bool, anyhow::Error> {
        let result =
            sqlx::query("UPDATE invitations SET used_at = now() WHERE token = $1 AND used_at IS NULL")
                .bind(token)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn ping(&self) -> Result<(), anyhow::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// In-memory store for tests, with injectable failures for the
/// partial-failure paths.
#[derive(Default)]
pub struct MemoryStore {
    invitations: Mutex<Vec<Invitation>>,
    users: Mutex<Vec<UserRecord>>,
    fail_user_insert: AtomicBool,
    fail_mark_used: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_invitation(&self, invitation: Invitation) {
        self.invitations.lock().unwrap().push(invitation);
    }

    pub fn invitation(&self, token: &str) -> Option<Invitation> {
        self.invitations
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.token == token)
            .cloned()
    }

    pub fn user_by_email(&self, email: &str) -> Option<UserRecord> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned()
    }

    pub fn user_count(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    /// Make the next `insert_user` call fail.
    pub fn fail_next_user_insert(&self) {
        self.fail_user_insert.store(true, Ordering::SeqCst);
    }

    /// Make the next `mark_invitation_used` call fail.
    pub fn fail_next_mark_used(&self) {
        self.fail_mark_used.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl SignupStore for MemoryStore {
    async fn find_invitation(
        &self,
        token: &str,
        email: &str,
    ) -> Result<Option<Invitation>, anyhow::Error> {
        let matches: Vec<Invitation> = self
            .invitations
            .lock()
            .unwrap()
            .iter()
            .filter(|i| i.token == token && i.email == email)
            .cloned()
            .collect();

        if matches.len() == 1 {
            Ok(matches.into_iter().next())
        } else {
            Ok(None)
        }
    }

    async fn insert_user(&self, user: &UserRecord) -> Result<(), anyhow::Error> {
        if self.fail_user_insert.swap(false, Ordering::SeqCst) {
            anyhow::bail!("injected users insert failure");
        }
        self.users.lock().unwrap().push(user.clone());
        Ok(())
    }

    async fn mark_invitation_used(&self, token: &str) -> Result<bool, anyhow::Error> {
        if self.fail_mark_used.swap(false, Ordering::SeqCst) {
            anyhow::bail!("injected invitation update failure");
        }

        let mut invitations = self.invitations.lock().unwrap();
        for invitation in invitations.iter_mut() {
            if invitation.token == token && invitation.used_at.is_none() {
                invitation.used_at = Some(Utc::now());
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn ping(&self) -> Result<(), anyhow::Error> {
        Ok(())
    }
}
