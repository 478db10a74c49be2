pub mod email_service;
pub mod password;
pub mod registration_service;
pub mod user_service;
pub mod verification_service;

pub use email_service::{
    create_email_service, ConsoleEmailService, EmailError, EmailService, MailContext,
    SmtpEmailService,
};
pub use registration_service::{RegistrationError, RegistrationService};
pub use user_service::{CreateUserRequest, UpdatePasswordRequest, UserService, UserServiceError};
pub use verification_service::{VerificationError, VerificationService};
