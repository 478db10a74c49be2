use crate::models::user::{User, UserRole};
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use sqlx::FromRow;

/// Everything needed to materialize a user once the email is confirmed.
/// The password is already hashed.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationDraft {
    pub user_id: String,
    pub password_hash: String,
    pub user_name: String,
    pub email: String,
    pub phone_num: String,
}

/// An unconfirmed registration attempt, keyed by email.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingVerification {
    pub email: String,
    pub code: String,
    pub user_id: String,
    pub password_hash: String,
    pub user_name: String,
    pub phone_num: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl PendingVerification {
    pub fn new(
        draft: RegistrationDraft,
        code: String,
        created_at: DateTime<Utc>,
        ttl: chrono::Duration,
    ) -> Option<Self> {
        // Match the stored precision so a reloaded entry compares equal.
        let created_at = created_at.trunc_subsecs(6);
        let expires_at = created_at.checked_add_signed(ttl)?;
        Some(PendingVerification {
            email: draft.email,
            code,
            user_id: draft.user_id,
            password_hash: draft.password_hash,
            user_name: draft.user_name,
            phone_num: draft.phone_num,
            created_at,
            expires_at,
        })
    }

    /// Expired at `now` (the expiry instant itself is still valid).
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn into_user(self) -> User {
        User {
            user_id: self.user_id,
            password_hash: self.password_hash,
            user_name: self.user_name,
            email: self.email,
            phone_num: self.phone_num,
            role: UserRole::User,
            created_at: None,
        }
    }
}

/// Timestamps are written with a fixed precision and `Z` suffix so that
/// text comparison in SQL orders them chronologically.
pub(crate) fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[derive(Debug, FromRow)]
pub(crate) struct PendingVerificationRow {
    pub email: String,
    pub code: String,
    pub user_id: String,
    pub password_hash: String,
    pub user_name: String,
    pub phone_num: String,
    pub created_at: String,
    pub expires_at: String,
}

impl TryFrom<PendingVerificationRow> for PendingVerification {
    type Error = chrono::ParseError;

    fn try_from(row: PendingVerificationRow) -> Result<Self, Self::Error> {
        Ok(PendingVerification {
            email: row.email,
            code: row.code,
            user_id: row.user_id,
            password_hash: row.password_hash,
            user_name: row.user_name,
            phone_num: row.phone_num,
            created_at: DateTime::parse_from_rfc3339(&row.created_at)?.with_timezone(&Utc),
            expires_at: DateTime::parse_from_rfc3339(&row.expires_at)?.with_timezone(&Utc),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn draft() -> RegistrationDraft {
        RegistrationDraft {
            user_id: "testId".to_string(),
            password_hash: "hash".to_string(),
            user_name: "testName".to_string(),
            email: "test@email.com".to_string(),
            phone_num: "010-1111-2222".to_string(),
        }
    }

    #[test]
    fn test_expiry_boundary_is_inclusive() {
        let now = Utc::now();
        let pending =
            PendingVerification::new(draft(), "123456".into(), now, Duration::minutes(5)).unwrap();

        assert!(!pending.is_expired(now));
        assert!(!pending.is_expired(pending.expires_at));
        assert!(pending.is_expired(pending.expires_at + Duration::microseconds(1)));
    }

    #[test]
    fn test_into_user_promotes_to_confirmed_role() {
        let pending =
            PendingVerification::new(draft(), "123456".into(), Utc::now(), Duration::minutes(5))
                .unwrap();
        let user = pending.into_user();

        assert_eq!(user.role, UserRole::User);
        assert_eq!(user.email, "test@email.com");
        assert_eq!(user.password_hash, "hash");
    }

    #[test]
    fn test_unrepresentable_expiry_is_rejected() {
        let pending =
            PendingVerification::new(draft(), "123456".into(), Utc::now(), Duration::MAX);
        assert!(pending.is_none());
    }

    #[test]
    fn test_formatted_timestamps_sort_chronologically() {
        let earlier = Utc::now();
        let later = earlier + Duration::milliseconds(1500);
        assert!(format_timestamp(earlier) < format_timestamp(later));
        assert!(format_timestamp(earlier).ends_with('Z'));
    }
}
