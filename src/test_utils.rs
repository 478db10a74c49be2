pub mod test_helpers {
    use crate::config::VerificationConfig;
    use crate::services::email_service::{EmailError, EmailService, MailContext};
    use crate::AppState;
    use async_trait::async_trait;
    use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
    use std::sync::{Arc, Mutex};
    use tempfile::NamedTempFile;

    /// Create a new in-memory SQLite database for testing
    pub async fn create_test_db() -> Result<SqlitePool, sqlx::Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await?;

        // Run migrations
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(pool)
    }

    /// Create a temporary file-based SQLite database for testing
    /// Useful when several connections must see the same data
    pub async fn create_test_db_file() -> Result<(SqlitePool, NamedTempFile), sqlx::Error> {
        let temp_file = NamedTempFile::new().map_err(sqlx::Error::Io)?;
        let db_path = temp_file
            .path()
            .to_str()
            .ok_or_else(|| sqlx::Error::Configuration("Invalid database path".into()))?;
        let database_url = format!("sqlite://{}", db_path);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect(&database_url)
            .await?;

        // Run migrations
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok((pool, temp_file))
    }

    /// Insert a confirmed user with hashed password
    pub async fn insert_test_user(
        pool: &SqlitePool,
        user_id: &str,
        email: &str,
        password: &str,
    ) -> Result<(), sqlx::Error> {
        let password_hash = crate::services::password::hash_password(password).map_err(|e| {
            sqlx::Error::Configuration(format!("Password hashing failed: {}", e).into())
        })?;

        sqlx::query(
            "INSERT INTO users (user_id, password_hash, user_name, email, phone_num, role)
             VALUES (?, ?, ?, ?, ?, 'ROLE_USER')",
        )
        .bind(user_id)
        .bind(password_hash)
        .bind("Test User")
        .bind(email)
        .bind("010-0000-0000")
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Email service that keeps every delivered code in memory.
    #[derive(Clone, Default)]
    pub struct RecordingEmailService {
        sent: Arc<Mutex<Vec<(String, String)>>>,
    }

    impl RecordingEmailService {
        pub fn new() -> Self {
            Self::default()
        }

        /// Every (email, code) pair delivered so far, oldest first.
        pub fn sent(&self) -> Vec<(String, String)> {
            match self.sent.lock() {
                Ok(sent) => sent.clone(),
                Err(poisoned) => poisoned.into_inner().clone(),
            }
        }

        pub fn last_code_for(&self, email: &str) -> Option<String> {
            self.sent()
                .into_iter()
                .rev()
                .find(|(to, _)| to == email)
                .map(|(_, code)| code)
        }
    }

    #[async_trait]
    impl EmailService for RecordingEmailService {
        async fn send_verification_code(
            &self,
            to_email: &str,
            code: &str,
            _context: &MailContext,
        ) -> Result<(), EmailError> {
            let mut sent = match self.sent.lock() {
                Ok(sent) => sent,
                Err(poisoned) => poisoned.into_inner(),
            };
            sent.push((to_email.to_string(), code.to_string()));
            Ok(())
        }
    }

    /// Email service whose every delivery fails.
    pub struct FailingEmailService;

    #[async_trait]
    impl EmailService for FailingEmailService {
        async fn send_verification_code(
            &self,
            _to_email: &str,
            _code: &str,
            _context: &MailContext,
        ) -> Result<(), EmailError> {
            Err(EmailError::SendFailed("mail relay unavailable".to_string()))
        }
    }

    /// App state over a fresh in-memory database, delivering mail into the
    /// returned recorder.
    pub async fn create_test_state(
        config: VerificationConfig,
    ) -> Result<(AppState, RecordingEmailService), sqlx::Error> {
        let pool = create_test_db().await?;
        let mailer = RecordingEmailService::new();
        let state = AppState::new(pool, Box::new(mailer.clone()), config);
        Ok((state, mailer))
    }
}

// Re-export commonly used test functions at module level for convenience
// Note: This is test-only code. Panic on error is acceptable in tests.
#[cfg(test)]
pub async fn create_test_pool() -> sqlx::SqlitePool {
    match test_helpers::create_test_db().await {
        Ok(pool) => pool,
        Err(e) => panic!("Failed to create test pool: {}", e),
    }
}
