pub mod registration;
pub mod user;
pub mod verification;

pub use registration::{
    ConfirmedResponse, PasswordUpdateForm, RegisterForm, RegisterResponse, SimpleResponse,
    VerifyQuery, Violation,
};
pub use user::{User, UserRole, UserSummary};
pub use verification::{PendingVerification, RegistrationDraft};
