use crate::models::registration::{RegisterForm, Violation};
use crate::models::verification::RegistrationDraft;
use crate::repositories::user_repository::{RepositoryError, UserRepository};
use crate::services::password::hash_password;
use crate::services::verification_service::{VerificationError, VerificationService};
use chrono::{DateTime, Utc};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    #[error("Validation failed")]
    Validation(Vec<Violation>),
    #[error("User ID already taken")]
    DuplicateUserId,
    #[error("Email already registered")]
    DuplicateEmail,
    #[error("Password hashing failed: {0}")]
    Hashing(String),
    #[error(transparent)]
    Verification(#[from] VerificationError),
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Front half of sign-up: validation and uniqueness checks, then hand-off to
/// [`VerificationService`]. Nothing is written to the users table here.
pub struct RegistrationService {
    user_repository: Arc<dyn UserRepository>,
    verification_service: Arc<VerificationService>,
}

impl RegistrationService {
    pub fn new(
        user_repository: Arc<dyn UserRepository>,
        verification_service: Arc<VerificationService>,
    ) -> Self {
        Self {
            user_repository,
            verification_service,
        }
    }

    fn validate(form: &RegisterForm) -> Result<(), RegistrationError> {
        let violations = form.validate();
        if violations.is_empty() {
            Ok(())
        } else {
            tracing::warn!(
                "[register] validation failed for {}: {:?}",
                form.user_id,
                violations
            );
            Err(RegistrationError::Validation(violations))
        }
    }

    async fn ensure_user_id_free(&self, user_id: &str) -> Result<(), RegistrationError> {
        if self.user_repository.exists_by_user_id(user_id).await? {
            tracing::warn!("[register] duplicate user id: {}", user_id);
            return Err(RegistrationError::DuplicateUserId);
        }
        Ok(())
    }

    async fn ensure_email_free(&self, email: &str) -> Result<(), RegistrationError> {
        if self.user_repository.exists_by_email(email).await? {
            tracing::warn!("[register] duplicate email: {}", email);
            return Err(RegistrationError::DuplicateEmail);
        }
        Ok(())
    }

    pub async fn check_user_id(&self, form: &RegisterForm) -> Result<(), RegistrationError> {
        Self::validate(form)?;
        self.ensure_user_id_free(&form.user_id).await
    }

    pub async fn check_email(&self, form: &RegisterForm) -> Result<(), RegistrationError> {
        Self::validate(form)?;
        self.ensure_email_free(&form.email).await
    }

    /// Validate, check user id then email, and request verification.
    /// Returns when the pending entry expires.
    pub async fn register(&self, form: &RegisterForm) -> Result<DateTime<Utc>, RegistrationError> {
        Self::validate(form)?;
        self.ensure_user_id_free(&form.user_id).await?;
        self.ensure_email_free(&form.email).await?;

        let password_hash =
            hash_password(&form.password).map_err(|e| RegistrationError::Hashing(e.to_string()))?;

        let draft = RegistrationDraft {
            user_id: form.user_id.clone(),
            password_hash,
            user_name: form.user_name.clone(),
            email: form.email.clone(),
            phone_num: form.phone_num.clone(),
        };

        let expires_at = self.verification_service.request(draft).await?;
        tracing::info!("[register] verification requested by: {}", form.user_id);
        Ok(expires_at)
    }
}
