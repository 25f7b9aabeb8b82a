//! Messaging domain errors

use core_kernel::FieldErrors;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MessagingError {
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    /// Also returned to non-participants
    #[error("Conversation not found")]
    NotFound,

    #[error("You cannot start a conversation with yourself.")]
    SelfConversation,

    #[error("A conversation about this listing already exists.")]
    Duplicate,

    #[error("You can only delete a conversation once every other participant has left.")]
    OtherParticipantsRemain,
}

impl From<FieldErrors> for MessagingError {
    fn from(errors: FieldErrors) -> Self {
        MessagingError::Validation(errors)
    }
}
