pub mod user_repository;
pub mod verification_repository;

pub use user_repository::{RepositoryError, SqliteUserRepository, UserRepository};
pub use verification_repository::{SqliteVerificationRepository, VerificationRepository};
