use crate::models::verification::{format_timestamp, PendingVerification, PendingVerificationRow};
use crate::repositories::user_repository::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

/// Keyed store of pending verification entries, one per email.
///
/// Every operation touching a single email is one SQL statement, so writers
/// and readers of the same key are serialized by SQLite itself: `put` never
/// leaves a half-written entry and `take` hands an entry to exactly one
/// caller.
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait VerificationRepository: Send + Sync {
    /// Insert or overwrite the entry for `pending.email`.
    async fn put(&self, pending: &PendingVerification) -> RepositoryResult<()>;
    async fn get(&self, email: &str) -> RepositoryResult<Option<PendingVerification>>;
    /// Returns whether an entry was removed.
    async fn remove(&self, email: &str) -> RepositoryResult<bool>;
    /// Remove the entry only while it still carries `code`, so a rollback
    /// never deletes a newer entry written by a concurrent request.
    async fn discard(&self, email: &str, code: &str) -> RepositoryResult<bool>;
    /// Remove and return the entry in one step.
    async fn take(&self, email: &str) -> RepositoryResult<Option<PendingVerification>>;
    /// Drop every entry that expired before `now`. Returns the number removed.
    async fn purge_expired(&self, now: DateTime<Utc>) -> RepositoryResult<u64>;
}

pub struct SqliteVerificationRepository {
    pool: SqlitePool,
}

impl SqliteVerificationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn into_pending(row: PendingVerificationRow) -> RepositoryResult<PendingVerification> {
    PendingVerification::try_from(row).map_err(|e| RepositoryError::CorruptRow(e.to_string()))
}

#[async_trait]
impl VerificationRepository for SqliteVerificationRepository {
    async fn put(&self, pending: &PendingVerification) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            INSERT INTO pending_verifications
                (email, code, user_id, password_hash, user_name, phone_num, created_at, expires_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(email) DO UPDATE SET
                code = excluded.code,
                user_id = excluded.user_id,
                password_hash = excluded.password_hash,
                user_name = excluded.user_name,
                phone_num = excluded.phone_num,
                created_at = excluded.created_at,
                expires_at = excluded.expires_at
            "#,
        )
        .bind(&pending.email)
        .bind(&pending.code)
        .bind(&pending.user_id)
        .bind(&pending.password_hash)
        .bind(&pending.user_name)
        .bind(&pending.phone_num)
        .bind(format_timestamp(pending.created_at))
        .bind(format_timestamp(pending.expires_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, email: &str) -> RepositoryResult<Option<PendingVerification>> {
        let row = sqlx::query_as::<_, PendingVerificationRow>(
            r#"
            SELECT email, code, user_id, password_hash, user_name, phone_num, created_at, expires_at
            FROM pending_verifications
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(into_pending).transpose()
    }

    async fn remove(&self, email: &str) -> RepositoryResult<bool> {
        let result = sqlx::query("DELETE FROM pending_verifications WHERE email = ?")
            .bind(email)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn discard(&self, email: &str, code: &str) -> RepositoryResult<bool> {
        let result = sqlx::query("DELETE FROM pending_verifications WHERE email = ? AND code = ?")
            .bind(email)
            .bind(code)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn take(&self, email: &str) -> RepositoryResult<Option<PendingVerification>> {
        let row = sqlx::query_as::<_, PendingVerificationRow>(
            r#"
            DELETE FROM pending_verifications
            WHERE email = ?
            RETURNING email, code, user_id, password_hash, user_name, phone_num, created_at, expires_at
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(into_pending).transpose()
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> RepositoryResult<u64> {
        let result = sqlx::query("DELETE FROM pending_verifications WHERE expires_at < ?")
            .bind(format_timestamp(now))
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
