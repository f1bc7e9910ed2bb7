//! One-time reset codes sent by email.
//!
//! A code is six digits, lives for a configurable number of minutes and can be
//! verified exactly once. Requests for unknown addresses succeed silently so
//! the endpoint cannot be used to probe for accounts.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use db::models::{password_reset_token, user};
use db::AdminClient;
use sea_orm::{DbErr, TransactionTrait};

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct MailError(pub String);

#[derive(Debug, thiserror::Error)]
pub enum PasswordResetError {
    #[error("Too many reset requests. Please try again later.")]
    RateLimited,
    #[error("Invalid or expired code")]
    InvalidCode,
    #[error("Failed to send reset email: {0}")]
    Mail(#[from] MailError),
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Delivers a reset code to its owner.
#[async_trait]
pub trait ResetMailer: Send + Sync {
    async fn send_reset_code(
        &self,
        to_email: &str,
        code: &str,
        expires_in_minutes: i64,
    ) -> Result<(), MailError>;
}

/// Logs deliveries instead of sending them. For development and tests.
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl ResetMailer for LogMailer {
    async fn send_reset_code(
        &self,
        to_email: &str,
        code: &str,
        expires_in_minutes: i64,
    ) -> Result<(), MailError> {
        tracing::info!(to = to_email, expires_in_minutes, "reset code issued (not mailed)");
        tracing::debug!(to = to_email, code, "reset code");
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetPolicy {
    pub code_ttl_minutes: i64,
    pub max_requests_per_hour: u32,
}

impl Default for ResetPolicy {
    fn default() -> Self {
        Self {
            code_ttl_minutes: 15,
            max_requests_per_hour: 3,
        }
    }
}

#[derive(Clone)]
pub struct PasswordResetService {
    client: AdminClient,
    mailer: Arc<dyn ResetMailer>,
    policy: ResetPolicy,
}

impl PasswordResetService {
    pub fn new(client: AdminClient, mailer: Arc<dyn ResetMailer>, policy: ResetPolicy) -> Self {
        Self {
            client,
            mailer,
            policy,
        }
    }

    /// Issues and mails a fresh code for `email`.
    pub async fn request_reset(&self, email: &str) -> Result<(), PasswordResetError> {
        let db = self.client.conn();

        let Some(account) = user::Model::find_by_email(db, email).await? else {
            tracing::info!("password reset requested for unknown email");
            return Ok(());
        };

        // Count and insert share a transaction so concurrent requests cannot
        // all slip under the limit.
        let txn = db.begin().await?;
        let window_start = Utc::now() - Duration::hours(1);
        let recent =
            password_reset_token::Model::count_issued_since(&txn, account.id, window_start).await?;
        if recent >= u64::from(self.policy.max_requests_per_hour) {
            tracing::warn!(user_id = account.id, recent, "password reset rate limited");
            return Err(PasswordResetError::RateLimited);
        }

        let code = password_reset_token::generate_code();
        password_reset_token::Model::create(&txn, account.id, &code, self.policy.code_ttl_minutes)
            .await?;
        txn.commit().await?;

        self.mailer
            .send_reset_code(&account.email, &code, self.policy.code_ttl_minutes)
            .await?;

        tracing::info!(user_id = account.id, "password reset code sent");
        Ok(())
    }

    /// Consumes a valid code and returns the id of the user it was issued to.
    pub async fn verify_otp(&self, email: &str, code: &str) -> Result<i64, PasswordResetError> {
        let code = code.trim();
        if code.len() != 6 || !code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PasswordResetError::InvalidCode);
        }

        let db = self.client.conn();
        let Some(account) = user::Model::find_by_email(db, email).await? else {
            return Err(PasswordResetError::InvalidCode);
        };

        let now = Utc::now();
        let token = password_reset_token::Model::find_unused(db, account.id, code)
            .await?
            .filter(|t| t.is_valid_at(now))
            .ok_or(PasswordResetError::InvalidCode)?;

        if !password_reset_token::Model::consume(db, token.id, now).await? {
            tracing::warn!(user_id = account.id, "reset code was consumed concurrently");
            return Err(PasswordResetError::InvalidCode);
        }
        tracing::info!(user_id = account.id, "reset code verified");
        Ok(account.id)
    }
}
