use crate::config::VerificationConfig;
use crate::models::user::User;
use crate::models::verification::{PendingVerification, RegistrationDraft};
use crate::repositories::user_repository::{RepositoryError, UserRepository};
use crate::repositories::verification_repository::VerificationRepository;
use crate::services::email_service::{EmailError, EmailService, MailContext};
use chrono::{DateTime, Utc};
use rand::{rngs::OsRng, Rng};
use std::sync::Arc;
use subtle::ConstantTimeEq;

#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
    #[error("No pending verification for this email")]
    NotFound,
    #[error("Verification code expired")]
    Expired(Box<PendingVerification>),
    #[error("Verification code does not match")]
    Mismatch(Box<PendingVerification>),
    #[error("User ID or email was registered by someone else")]
    Duplicate(Box<PendingVerification>),
    #[error("Verification TTL pushes the expiry out of range")]
    ExpiryOutOfRange,
    #[error("Failed to deliver verification email: {0}")]
    Delivery(#[from] EmailError),
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl VerificationError {
    /// The consumed entry, for failures that happened after it was read.
    pub fn pending(&self) -> Option<&PendingVerification> {
        match self {
            VerificationError::Expired(p)
            | VerificationError::Mismatch(p)
            | VerificationError::Duplicate(p) => Some(p),
            _ => None,
        }
    }
}

/// Issues single-use email codes and promotes confirmed drafts into users.
///
/// Per email the workflow is either PENDING (an entry exists) or ABSENT.
/// `request` always lands in PENDING with a fresh code, and `confirm`
/// always lands in ABSENT, whatever the outcome.
pub struct VerificationService {
    verification_repository: Arc<dyn VerificationRepository>,
    user_repository: Arc<dyn UserRepository>,
    email_service: Box<dyn EmailService>,
    config: VerificationConfig,
}

impl VerificationService {
    pub fn new(
        verification_repository: Arc<dyn VerificationRepository>,
        user_repository: Arc<dyn UserRepository>,
        email_service: Box<dyn EmailService>,
        config: VerificationConfig,
    ) -> Self {
        Self {
            verification_repository,
            user_repository,
            email_service,
            config,
        }
    }

    pub fn config(&self) -> &VerificationConfig {
        &self.config
    }

    /// Decimal code drawn from the operating system CSPRNG.
    fn generate_code(length: usize) -> String {
        let mut rng = OsRng;
        (0..length)
            .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
            .collect()
    }

    pub async fn request(
        &self,
        draft: RegistrationDraft,
    ) -> Result<DateTime<Utc>, VerificationError> {
        self.request_at(draft, Utc::now()).await
    }

    /// Store a fresh entry for `draft.email` (replacing any earlier one) and
    /// mail its code. Returns the expiry of the new entry.
    pub async fn request_at(
        &self,
        draft: RegistrationDraft,
        now: DateTime<Utc>,
    ) -> Result<DateTime<Utc>, VerificationError> {
        let code = Self::generate_code(self.config.code_length);
        let context = MailContext {
            user_name: draft.user_name.clone(),
            expires_in_minutes: self.config.ttl_minutes(),
        };
        let pending = PendingVerification::new(draft, code, now, self.config.ttl)
            .ok_or(VerificationError::ExpiryOutOfRange)?;

        self.verification_repository.put(&pending).await?;

        tracing::info!("Sending verification code to: {}", pending.email);
        if let Err(e) = self
            .email_service
            .send_verification_code(&pending.email, &pending.code, &context)
            .await
        {
            tracing::error!(
                "❌ Failed to send verification code to {}: {:?}",
                pending.email,
                e
            );
            // An undeliverable code would only block the address until expiry.
            if let Err(cleanup) = self
                .verification_repository
                .discard(&pending.email, &pending.code)
                .await
            {
                tracing::warn!(
                    "Failed to discard undeliverable verification for {}: {}",
                    pending.email,
                    cleanup
                );
            }
            return Err(e.into());
        }

        tracing::info!(
            "✅ Verification code sent to {} (user {}), expires at {}",
            pending.email,
            pending.user_id,
            pending.expires_at
        );
        Ok(pending.expires_at)
    }

    pub async fn confirm(&self, email: &str, code: &str) -> Result<User, VerificationError> {
        self.confirm_at(email, code, Utc::now()).await
    }

    /// Consume the entry for `email` and, if it is live and `code` matches,
    /// create the confirmed user. The entry is gone afterwards in every case.
    pub async fn confirm_at(
        &self,
        email: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<User, VerificationError> {
        let pending = self
            .verification_repository
            .take(email)
            .await?
            .ok_or(VerificationError::NotFound)?;

        if pending.is_expired(now) {
            tracing::warn!("Verification for {} expired at {}", email, pending.expires_at);
            return Err(VerificationError::Expired(Box::new(pending)));
        }

        let matches: bool = pending.code.as_bytes().ct_eq(code.as_bytes()).into();
        if !matches {
            tracing::warn!("Verification code mismatch for {}", email);
            return Err(VerificationError::Mismatch(Box::new(pending)));
        }

        let user = pending.clone().into_user();
        match self.user_repository.create(&user).await {
            Ok(user) => {
                tracing::info!("New confirmed user: {}", user.user_id);
                Ok(user)
            }
            Err(RepositoryError::AlreadyExists) => {
                tracing::warn!(
                    "Confirmed draft for {} clashed with an existing user {}",
                    email,
                    pending.user_id
                );
                Err(VerificationError::Duplicate(Box::new(pending)))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Evict entries whose expiry has passed. Expired entries are already
    /// rejected by `confirm`; this only reclaims space.
    pub async fn purge_expired(&self) -> Result<u64, VerificationError> {
        let purged = self.verification_repository.purge_expired(Utc::now()).await?;
        if purged > 0 {
            tracing::debug!("Purged {} expired verification entries", purged);
        }
        Ok(purged)
    }
}
