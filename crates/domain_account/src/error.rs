//! Accounts domain errors

use core_kernel::FieldErrors;
use thiserror::Error;

/// Errors that can occur in the accounts domain
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    #[error("Invalid email or password.")]
    InvalidCredentials,

    #[error("Email not verified. Please check your inbox or resend the verification email.")]
    EmailNotVerified,

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    #[error("No roommate profile found.")]
    RoommateProfileMissing,

    #[error("You already have a roommate profile.")]
    RoommateProfileExists,
}

impl From<FieldErrors> for AccountError {
    fn from(errors: FieldErrors) -> Self {
        AccountError::Validation(errors)
    }
}
