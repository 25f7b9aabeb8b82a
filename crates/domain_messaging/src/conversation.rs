//! Conversation aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use core_kernel::{ConversationId, ListingId, UserId};

use crate::error::MessagingError;
use crate::message::{Message, MessageDraft};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub listing_id: ListingId,
    pub participants: Vec<UserId>,
    pub last_updated: DateTime<Utc>,
}

/// What remains after a participant leaves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveResult {
    Remaining(usize),
    /// No participants are left
    Abandoned,
}

impl Conversation {
    /// Opens a conversation between `caller` and the listing's owner
    ///
    /// `existing` holds the caller's conversations about the same listing.
    pub fn start(
        listing_id: ListingId,
        listing_owner: UserId,
        caller: UserId,
        existing: &[Conversation],
    ) -> Result<Self, MessagingError> {
        if caller == listing_owner {
            return Err(MessagingError::SelfConversation);
        }

        let wanted: BTreeSet<UserId> = [caller, listing_owner].into_iter().collect();
        let duplicate = existing
            .iter()
            .any(|c| c.listing_id == listing_id && c.participant_set() == wanted);
        if duplicate {
            return Err(MessagingError::Duplicate);
        }

        Ok(Self {
            id: ConversationId::new_v7(),
            listing_id,
            participants: vec![caller, listing_owner],
            last_updated: Utc::now(),
        })
    }

    fn participant_set(&self) -> BTreeSet<UserId> {
        self.participants.iter().copied().collect()
    }

    pub fn is_participant(&self, user_id: UserId) -> bool {
        self.participants.contains(&user_id)
    }

    /// Non-participants get `NotFound`
    pub fn ensure_participant(&self, user_id: UserId) -> Result<(), MessagingError> {
        if self.is_participant(user_id) {
            Ok(())
        } else {
            Err(MessagingError::NotFound)
        }
    }

    /// Posts a message and bumps `last_updated` to its timestamp
    pub fn send(&mut self, sender: UserId, draft: MessageDraft) -> Result<Message, MessagingError> {
        self.ensure_participant(sender)?;
        let message = draft.validate(self.id, sender)?;
        self.last_updated = message.timestamp;
        Ok(message)
    }

    pub fn leave(&mut self, user_id: UserId) -> Result<LeaveResult, MessagingError> {
        self.ensure_participant(user_id)?;
        self.participants.retain(|p| *p != user_id);
        Ok(match self.participants.len() {
            0 => LeaveResult::Abandoned,
            n => LeaveResult::Remaining(n),
        })
    }

    /// Only a sole remaining participant may delete the conversation
    pub fn ensure_deletable_by(&self, user_id: UserId) -> Result<(), MessagingError> {
        self.ensure_participant(user_id)?;
        if self.participants.len() > 1 {
            return Err(MessagingError::OtherParticipantsRemain);
        }
        Ok(())
    }
}
