use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserRole {
    #[serde(rename = "ROLE_TEMPORARY_USER")]
    TemporaryUser,
    #[serde(rename = "ROLE_USER")]
    User,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::TemporaryUser => "ROLE_TEMPORARY_USER",
            UserRole::User => "ROLE_USER",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ROLE_TEMPORARY_USER" => Ok(UserRole::TemporaryUser),
            "ROLE_USER" => Ok(UserRole::User),
            other => Err(format!("Unknown user role: {}", other)),
        }
    }
}

/// A stored account. Only confirmed registrations (or operator-created
/// accounts) ever reach the `users` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub user_id: String,
    pub password_hash: String,
    pub user_name: String,
    pub email: String,
    pub phone_num: String,
    pub role: UserRole,
    pub created_at: Option<String>,
}

// Raw row shape; role is kept as text in SQLite.
#[derive(Debug, FromRow)]
pub(crate) struct UserRow {
    pub user_id: String,
    pub password_hash: String,
    pub user_name: String,
    pub email: String,
    pub phone_num: String,
    pub role: String,
    pub created_at: Option<String>,
}

impl TryFrom<UserRow> for User {
    type Error = String;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            user_id: row.user_id,
            password_hash: row.password_hash,
            user_name: row.user_name,
            email: row.email,
            phone_num: row.phone_num,
            role: row.role.parse()?,
            created_at: row.created_at,
        })
    }
}

/// Public view of a user, safe to return over HTTP.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub user_id: String,
    pub user_name: String,
    pub email: String,
    pub phone_num: String,
    pub role: UserRole,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        UserSummary {
            user_id: user.user_id.clone(),
            user_name: user.user_name.clone(),
            email: user.email.clone(),
            phone_num: user.phone_num.clone(),
            role: user.role,
        }
    }
}
