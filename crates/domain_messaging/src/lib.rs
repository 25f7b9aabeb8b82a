//! Messaging Domain
//!
//! A prospective tenant opens a conversation about a listing with its
//! landlord. Only participants may read or post; everyone else is told the
//! conversation does not exist.

pub mod conversation;
pub mod message;
pub mod error;

pub use conversation::{Conversation, LeaveResult};
pub use message::{Message, MessageDraft, mark_read, unread_for};
pub use error::MessagingError;
