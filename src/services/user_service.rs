use crate::models::registration::{RegisterForm, PASSWORD_MIN_LEN};
use crate::models::user::{User, UserRole};
use crate::repositories::user_repository::{RepositoryError, UserRepository};
use crate::services::password::{hash_password, verify_password};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    #[error("Password too weak (minimum 8 characters)")]
    WeakPassword,
    #[error("Passwords do not match")]
    PasswordMismatch,
    #[error("Current password is incorrect")]
    InvalidCredentials,
    #[error("User not found")]
    UserNotFound,
    #[error("Invalid user: {0}")]
    InvalidUser(String),
    #[error("User ID or email already exists")]
    AlreadyExists,
    #[error("Password hashing failed: {0}")]
    HashingError(String),
    #[error("Repository error: {0}")]
    RepositoryError(#[from] RepositoryError),
}

/// Operator-side creation that skips email verification.
pub struct CreateUserRequest {
    pub user_id: String,
    pub password: String,
    pub password_confirm: Option<String>,
    pub user_name: String,
    pub email: String,
    pub phone_num: String,
}

pub struct UpdatePasswordRequest {
    pub user_id: String,
    pub current_password: Option<String>,
    pub new_password: String,
    pub new_password_confirm: Option<String>,
}

/// Operations on confirmed users.
pub struct UserService {
    repository: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(repository: Arc<dyn UserRepository>) -> Self {
        Self { repository }
    }

    pub async fn create_user(&self, request: CreateUserRequest) -> Result<User, UserServiceError> {
        if let Some(ref confirm) = request.password_confirm {
            if request.password != *confirm {
                return Err(UserServiceError::PasswordMismatch);
            }
        }

        let form = RegisterForm {
            user_id: request.user_id,
            password: request.password,
            user_name: request.user_name,
            email: request.email,
            phone_num: request.phone_num,
        }
        .normalized();

        let violations = form.validate();
        if !violations.is_empty() {
            let messages: Vec<String> = violations.into_iter().map(|v| v.message).collect();
            return Err(UserServiceError::InvalidUser(messages.join("; ")));
        }

        let password_hash = hash_password(&form.password)
            .map_err(|e| UserServiceError::HashingError(e.to_string()))?;

        let user = User {
            user_id: form.user_id,
            password_hash,
            user_name: form.user_name,
            email: form.email,
            phone_num: form.phone_num,
            role: UserRole::User,
            created_at: None,
        };

        match self.repository.create(&user).await {
            Ok(user) => {
                tracing::info!("User created by operator: {}", user.user_id);
                Ok(user)
            }
            Err(RepositoryError::AlreadyExists) => Err(UserServiceError::AlreadyExists),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn find_user_by_user_id(
        &self,
        user_id: &str,
    ) -> Result<Option<User>, UserServiceError> {
        Ok(self.repository.find_by_user_id(user_id).await?)
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, UserServiceError> {
        Ok(self.repository.find_by_email(email).await?)
    }

    pub async fn list_users(
        &self,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<User>, UserServiceError> {
        Ok(self.repository.list_users(limit, offset).await?)
    }

    pub async fn delete_user(&self, user_id: &str) -> Result<(), UserServiceError> {
        match self.repository.delete_user(user_id).await {
            Ok(()) => Ok(()),
            Err(RepositoryError::NotFound) => Err(UserServiceError::UserNotFound),
            Err(e) => Err(UserServiceError::RepositoryError(e)),
        }
    }

    /// Change a password. When `current_password` is given it must verify
    /// against the stored hash; the operator CLI omits it.
    pub async fn update_password(
        &self,
        request: UpdatePasswordRequest,
    ) -> Result<(), UserServiceError> {
        if let Some(ref confirm) = request.new_password_confirm {
            if request.new_password != *confirm {
                return Err(UserServiceError::PasswordMismatch);
            }
        }

        self.validate_password(&request.new_password)?;

        let mut user = self
            .repository
            .find_by_user_id(&request.user_id)
            .await?
            .ok_or(UserServiceError::UserNotFound)?;

        if let Some(ref current) = request.current_password {
            if !verify_password(current, &user.password_hash) {
                tracing::warn!("Password change rejected for {}", user.user_id);
                return Err(UserServiceError::InvalidCredentials);
            }
        }

        user.password_hash = hash_password(&request.new_password)
            .map_err(|e| UserServiceError::HashingError(e.to_string()))?;

        self.repository.save(&user).await?;
        tracing::info!("Password updated for {}", user.user_id);
        Ok(())
    }

    fn validate_password(&self, password: &str) -> Result<(), UserServiceError> {
        if password.chars().count() < PASSWORD_MIN_LEN {
            return Err(UserServiceError::WeakPassword);
        }
        Ok(())
    }

    pub fn verify_password(&self, password: &str, password_hash: &str) -> bool {
        verify_password(password, password_hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::user_repository::MockUserRepository;
    use mockall::predicate::*;

    fn stored_user(password: &str) -> User {
        User {
            user_id: "testId".to_string(),
            password_hash: hash_password(password).unwrap(),
            user_name: "testName".to_string(),
            email: "test@email.com".to_string(),
            phone_num: "010-1111-2222".to_string(),
            role: UserRole::User,
            created_at: None,
        }
    }

    #[tokio::test]
    async fn test_update_password_success() {
        let mut mock_repo = MockUserRepository::new();

        let user = stored_user("oldPassword");
        mock_repo
            .expect_find_by_user_id()
            .with(eq("testId"))
            .times(1)
            .returning(move |_| {
                let user = user.clone();
                Box::pin(async move { Ok(Some(user)) })
            });
        mock_repo
            .expect_save()
            .withf(|u: &User| verify_password("newPassword", &u.password_hash))
            .times(1)
            .returning(|u| {
                let user = u.clone();
                Box::pin(async move { Ok(user) })
            });

        let service = UserService::new(Arc::new(mock_repo));

        let request = UpdatePasswordRequest {
            user_id: "testId".to_string(),
            current_password: Some("oldPassword".to_string()),
            new_password: "newPassword".to_string(),
            new_password_confirm: Some("newPassword".to_string()),
        };

        assert!(service.update_password(request).await.is_ok());
    }

    #[tokio::test]
    async fn test_update_password_wrong_current() {
        let mut mock_repo = MockUserRepository::new();

        let user = stored_user("oldPassword");
        mock_repo.expect_find_by_user_id().returning(move |_| {
            let user = user.clone();
            Box::pin(async move { Ok(Some(user)) })
        });
        mock_repo.expect_save().never();

        let service = UserService::new(Arc::new(mock_repo));

        let request = UpdatePasswordRequest {
            user_id: "testId".to_string(),
            current_password: Some("notMyPassword".to_string()),
            new_password: "newPassword".to_string(),
            new_password_confirm: None,
        };

        let result = service.update_password(request).await;
        assert!(matches!(result, Err(UserServiceError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_update_password_weak_or_mismatched() {
        let mock_repo = MockUserRepository::new();
        let service = UserService::new(Arc::new(mock_repo));

        let weak = UpdatePasswordRequest {
            user_id: "testId".to_string(),
            current_password: None,
            new_password: "short".to_string(),
            new_password_confirm: None,
        };
        assert!(matches!(
            service.update_password(weak).await,
            Err(UserServiceError::WeakPassword)
        ));

        let mismatched = UpdatePasswordRequest {
            user_id: "testId".to_string(),
            current_password: None,
            new_password: "newPassword".to_string(),
            new_password_confirm: Some("otherPassword".to_string()),
        };
        assert!(matches!(
            service.update_password(mismatched).await,
            Err(UserServiceError::PasswordMismatch)
        ));
    }

    #[tokio::test]
    async fn test_delete_missing_user() {
        let mut mock_repo = MockUserRepository::new();
        mock_repo
            .expect_delete_user()
            .with(eq("ghost"))
            .times(1)
            .returning(|_| Box::pin(async move { Err(RepositoryError::NotFound) }));

        let service = UserService::new(Arc::new(mock_repo));
        assert!(matches!(
            service.delete_user("ghost").await,
            Err(UserServiceError::UserNotFound)
        ));
    }

    fn create_request() -> CreateUserRequest {
        CreateUserRequest {
            user_id: "adminId".to_string(),
            password: "adminPassword".to_string(),
            password_confirm: Some("adminPassword".to_string()),
            user_name: "Admin".to_string(),
            email: "admin@email.com".to_string(),
            phone_num: "010-9999-8888".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_user_stores_confirmed_role() {
        let mut mock_repo = MockUserRepository::new();
        mock_repo
            .expect_create()
            .withf(|u: &User| {
                u.user_id == "adminId"
                    && u.role == UserRole::User
                    && verify_password("adminPassword", &u.password_hash)
            })
            .times(1)
            .returning(|u| {
                let user = u.clone();
                Box::pin(async move { Ok(user) })
            });

        let service = UserService::new(Arc::new(mock_repo));
        let user = service.create_user(create_request()).await.unwrap();
        assert_eq!(user.email, "admin@email.com");
    }

    #[tokio::test]
    async fn test_create_user_duplicate_and_invalid() {
        let mut mock_repo = MockUserRepository::new();
        mock_repo
            .expect_create()
            .times(1)
            .returning(|_| Box::pin(async move { Err(RepositoryError::AlreadyExists) }));

        let service = UserService::new(Arc::new(mock_repo));
        assert!(matches!(
            service.create_user(create_request()).await,
            Err(UserServiceError::AlreadyExists)
        ));

        let invalid = CreateUserRequest {
            email: "not-an-email".to_string(),
            ..create_request()
        };
        assert!(matches!(
            service.create_user(invalid).await,
            Err(UserServiceError::InvalidUser(_))
        ));
    }
}
