pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod services;

// Make test_utils available for both unit tests and integration tests
pub mod test_utils;

use config::VerificationConfig;
use repositories::{SqliteUserRepository, SqliteVerificationRepository};
use services::{EmailService, RegistrationService, UserService, VerificationService};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService>,
    pub registration_service: Arc<RegistrationService>,
    pub verification_service: Arc<VerificationService>,
    pub pool: sqlx::SqlitePool,
}

impl AppState {
    /// Wire the SQLite-backed stores and services around one pool.
    pub fn new(
        pool: sqlx::SqlitePool,
        email_service: Box<dyn EmailService>,
        config: VerificationConfig,
    ) -> Self {
        let user_repository = Arc::new(SqliteUserRepository::new(pool.clone()));
        let verification_repository = Arc::new(SqliteVerificationRepository::new(pool.clone()));

        let verification_service = Arc::new(VerificationService::new(
            verification_repository,
            user_repository.clone(),
            email_service,
            config,
        ));
        let registration_service = Arc::new(RegistrationService::new(
            user_repository.clone(),
            verification_service.clone(),
        ));
        let user_service = Arc::new(UserService::new(user_repository));

        AppState {
            user_service,
            registration_service,
            verification_service,
            pool,
        }
    }
}
