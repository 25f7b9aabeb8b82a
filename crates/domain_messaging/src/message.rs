//! Messages

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{ConversationId, FieldErrors, MessageId, UserId};

pub const MAX_MESSAGE_LENGTH: usize = 5000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub sender_id: UserId,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub read: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageDraft {
    pub content: Option<String>,
}

impl MessageDraft {
    pub fn validate(self, conversation_id: ConversationId, sender_id: UserId) -> Result<Message, FieldErrors> {
        let content = self.content.unwrap_or_default();
        let mut errors = FieldErrors::new();
        if content.trim().is_empty() {
            errors.required("content");
        } else if content.chars().count() > MAX_MESSAGE_LENGTH {
            errors.add(
                "content",
                format!("Ensure this field has no more than {} characters.", MAX_MESSAGE_LENGTH),
            );
        }
        errors.into_result()?;

        Ok(Message {
            id: MessageId::new_v7(),
            conversation_id,
            sender_id,
            content,
            timestamp: Utc::now(),
            read: false,
        })
    }
}

/// Messages sent by someone other than `viewer` that are still unread
pub fn unread_for(viewer: UserId, messages: &[Message]) -> Vec<&Message> {
    messages
        .iter()
        .filter(|m| m.sender_id != viewer && !m.read)
        .collect()
}

/// Marks other participants' messages read and returns the ids that changed
pub fn mark_read(viewer: UserId, messages: &mut [Message]) -> Vec<MessageId> {
    messages
        .iter_mut()
        .filter(|m| m.sender_id != viewer && !m.read)
        .map(|m| {
            m.read = true;
            m.id
        })
        .collect()
}
