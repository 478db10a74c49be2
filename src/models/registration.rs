use crate::models::user::UserSummary;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static USER_ID_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]+$").unwrap());
static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());
static PHONE_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{2,3}-\d{3,4}-\d{4}$").unwrap());

pub const USER_ID_MIN_LEN: usize = 5;
pub const USER_ID_MAX_LEN: usize = 20;
pub const PASSWORD_MIN_LEN: usize = 8;
pub const EMAIL_MAX_LEN: usize = 255;

/// Registration (and duplicate-check) submission.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterForm {
    pub user_id: String,
    pub password: String,
    pub user_name: String,
    pub email: String,
    pub phone_num: String,
}

/// One failed field rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub field: &'static str,
    pub message: String,
}

impl Violation {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Violation {
            field,
            message: message.into(),
        }
    }
}

impl RegisterForm {
    /// Trim surrounding whitespace from every field except the password.
    pub fn normalized(mut self) -> Self {
        self.user_id = self.user_id.trim().to_string();
        self.user_name = self.user_name.trim().to_string();
        self.email = self.email.trim().to_string();
        self.phone_num = self.phone_num.trim().to_string();
        self
    }

    /// Check every field rule and return all violations, in field order.
    pub fn validate(&self) -> Vec<Violation> {
        let mut violations = Vec::new();

        let user_id_len = self.user_id.chars().count();
        if self.user_id.trim().is_empty() {
            violations.push(Violation::new("userId", "User ID is required"));
        } else if !(USER_ID_MIN_LEN..=USER_ID_MAX_LEN).contains(&user_id_len) {
            violations.push(Violation::new(
                "userId",
                format!(
                    "User ID must be between {} and {} characters",
                    USER_ID_MIN_LEN, USER_ID_MAX_LEN
                ),
            ));
        } else if !USER_ID_PATTERN.is_match(&self.user_id) {
            violations.push(Violation::new(
                "userId",
                "User ID may only contain letters, digits and underscores",
            ));
        }

        if self.password.trim().is_empty() {
            violations.push(Violation::new("password", "Password is required"));
        } else if self.password.chars().count() < PASSWORD_MIN_LEN {
            violations.push(Violation::new(
                "password",
                format!("Password must be at least {} characters", PASSWORD_MIN_LEN),
            ));
        }

        if self.user_name.trim().is_empty() {
            violations.push(Violation::new("userName", "Name is required"));
        }

        if self.email.trim().is_empty() {
            violations.push(Violation::new("email", "Email is required"));
        } else if !is_valid_email(&self.email) {
            violations.push(Violation::new("email", "Invalid email address"));
        }

        if self.phone_num.trim().is_empty() {
            violations.push(Violation::new("phoneNum", "Phone number is required"));
        } else if !PHONE_PATTERN.is_match(&self.phone_num) {
            violations.push(Violation::new(
                "phoneNum",
                "Phone number must look like 010-1234-5678",
            ));
        }

        violations
    }
}

pub fn is_valid_email(email: &str) -> bool {
    email.len() <= EMAIL_MAX_LEN && EMAIL_PATTERN.is_match(email)
}

/// Response body for every registration endpoint. Echoes the submitted
/// fields (never the password) alongside the outcome.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub user_id: String,
    pub user_name: String,
    pub email: String,
    pub phone_num: String,
    pub msg: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl RegisterResponse {
    pub fn echo(form: &RegisterForm, msg: impl Into<String>) -> Self {
        RegisterResponse {
            user_id: form.user_id.clone(),
            user_name: form.user_name.clone(),
            email: form.email.clone(),
            phone_num: form.phone_num.clone(),
            msg: msg.into(),
            errors: Vec::new(),
        }
    }

    pub fn with_errors(mut self, errors: Vec<String>) -> Self {
        self.errors = errors;
        self
    }
}

/// Body of a successful email confirmation.
#[derive(Debug, Clone, Serialize)]
pub struct ConfirmedResponse {
    pub msg: String,
    pub user: UserSummary,
}

/// Plain message body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimpleResponse {
    pub msg: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyQuery {
    pub email: String,
    pub certification_number: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordUpdateForm {
    pub user_id: String,
    pub current_password: String,
    pub new_password1: String,
    pub new_password2: String,
}
