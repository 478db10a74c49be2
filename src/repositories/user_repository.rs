use crate::models::user::{User, UserRow};
use async_trait::async_trait;
use sqlx::SqlitePool;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Record not found")]
    NotFound,
    #[error("Record already exists")]
    AlreadyExists,
    #[error("Corrupt row: {0}")]
    CorruptRow(String),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Maps a unique-constraint violation to `AlreadyExists`.
pub(crate) fn map_write_error(e: sqlx::Error) -> RepositoryError {
    match &e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            RepositoryError::AlreadyExists
        }
        _ => RepositoryError::Database(e),
    }
}

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait UserRepository: Send + Sync {
    async fn exists_by_user_id(&self, user_id: &str) -> RepositoryResult<bool>;
    async fn exists_by_email(&self, email: &str) -> RepositoryResult<bool>;
    /// Plain insert; a clash on user id or email is `AlreadyExists`.
    async fn create(&self, user: &User) -> RepositoryResult<User>;
    /// Insert or overwrite by user id.
    async fn save(&self, user: &User) -> RepositoryResult<User>;
    async fn find_by_user_id(&self, user_id: &str) -> RepositoryResult<Option<User>>;
    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>>;
    async fn list_users(
        &self,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> RepositoryResult<Vec<User>>;
    async fn delete_user(&self, user_id: &str) -> RepositoryResult<()>;
}

pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn into_user(row: UserRow) -> RepositoryResult<User> {
    User::try_from(row).map_err(RepositoryError::CorruptRow)
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn exists_by_user_id(&self, user_id: &str) -> RepositoryResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE user_id = ?)")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn exists_by_email(&self, email: &str) -> RepositoryResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = ?)")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn create(&self, user: &User) -> RepositoryResult<User> {
        sqlx::query(
            r#"
            INSERT INTO users (user_id, password_hash, user_name, email, phone_num, role)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.user_id)
        .bind(&user.password_hash)
        .bind(&user.user_name)
        .bind(&user.email)
        .bind(&user.phone_num)
        .bind(user.role.as_str())
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        self.find_by_user_id(&user.user_id)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    async fn save(&self, user: &User) -> RepositoryResult<User> {
        sqlx::query(
            r#"
            INSERT INTO users (user_id, password_hash, user_name, email, phone_num, role)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                password_hash = excluded.password_hash,
                user_name = excluded.user_name,
                email = excluded.email,
                phone_num = excluded.phone_num,
                role = excluded.role
            "#,
        )
        .bind(&user.user_id)
        .bind(&user.password_hash)
        .bind(&user.user_name)
        .bind(&user.email)
        .bind(&user.phone_num)
        .bind(user.role.as_str())
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        self.find_by_user_id(&user.user_id)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    async fn find_by_user_id(&self, user_id: &str) -> RepositoryResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT user_id, password_hash, user_name, email, phone_num, role, created_at
            FROM users
            WHERE user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(into_user).transpose()
    }

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT user_id, password_hash, user_name, email, phone_num, role, created_at
            FROM users
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(into_user).transpose()
    }

    async fn list_users(
        &self,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> RepositoryResult<Vec<User>> {
        let limit = limit.unwrap_or(100);
        let offset = offset.unwrap_or(0);

        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT user_id, password_hash, user_name, email, phone_num, role, created_at
            FROM users
            ORDER BY created_at DESC, user_id ASC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(into_user).collect()
    }

    async fn delete_user(&self, user_id: &str) -> RepositoryResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
