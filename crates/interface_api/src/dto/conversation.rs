//! Conversation DTOs

use serde::Serialize;

use domain_messaging::{Conversation, Message};

#[derive(Debug, Serialize)]
pub struct ConversationDetail {
    #[serde(flatten)]
    pub conversation: Conversation,
    pub messages: Vec<Message>,
}
