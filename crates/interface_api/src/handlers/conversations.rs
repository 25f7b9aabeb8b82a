//! Conversation and message handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use tracing::info;

use core_kernel::{ConversationId, ListingId};
use domain_messaging::{mark_read, Conversation, LeaveResult, Message, MessageDraft, MessagingError};

use crate::auth::Claims;
use crate::dto::conversation::ConversationDetail;
use crate::dto::MessageResponse;
use crate::error::ApiError;
use crate::extract::AppJson;
use crate::AppState;

/// The caller's conversations, most recently active first
pub async fn list_conversations(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<Conversation>>, ApiError> {
    Ok(Json(state.conversations().list_for_user(claims.user_id()).await?))
}

/// Conversation with its messages; the other participants' messages are
/// marked read
pub async fn conversation_detail(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<ConversationId>,
) -> Result<Json<ConversationDetail>, ApiError> {
    let conversations = state.conversations();
    let conversation = conversations.get(id).await?;
    conversation.ensure_participant(claims.user_id())?;

    let mut messages = conversations.messages(conversation.id).await?;
    let newly_read = mark_read(claims.user_id(), &mut messages);
    conversations.mark_read(&newly_read).await?;

    Ok(Json(ConversationDetail { conversation, messages }))
}

/// Opens a conversation with the listing's owner
pub async fn start_conversation(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<ListingId>,
) -> Result<(StatusCode, Json<Conversation>), ApiError> {
    let listing = state.listings().get(id).await?;
    let conversations = state.conversations();
    let existing = conversations.list_for_listing(listing.id, claims.user_id()).await?;

    let conversation = Conversation::start(listing.id, listing.owner_id, claims.user_id(), &existing)?;
    if !conversations.insert_unique(&conversation).await? {
        return Err(MessagingError::Duplicate.into());
    }
    info!(conversation_id = %conversation.id, listing_id = %listing.id, "Conversation started");

    Ok((StatusCode::CREATED, Json(conversation)))
}

pub async fn send_message(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<ConversationId>,
    AppJson(draft): AppJson<MessageDraft>,
) -> Result<(StatusCode, Json<Message>), ApiError> {
    let conversations = state.conversations();
    let mut conversation = conversations.get(id).await?;

    let message = conversation.send(claims.user_id(), draft)?;
    conversations.add_message(&conversation, &message).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// Removes the caller; an empty conversation is deleted
pub async fn leave_conversation(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<ConversationId>,
) -> Result<Json<MessageResponse>, ApiError> {
    let conversations = state.conversations();
    let mut conversation = conversations.get(id).await?;

    match conversation.leave(claims.user_id())? {
        LeaveResult::Abandoned => conversations.delete(conversation.id).await?,
        LeaveResult::Remaining(_) => {
            conversations.remove_participant(conversation.id, claims.user_id()).await?
        }
    }
    Ok(Json(MessageResponse::new("You have left the conversation.")))
}

/// Only allowed once the caller is the last participant
pub async fn delete_conversation(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<ConversationId>,
) -> Result<StatusCode, ApiError> {
    let conversations = state.conversations();
    let conversation = conversations.get(id).await?;
    conversation.ensure_deletable_by(claims.user_id())?;

    conversations.delete(conversation.id).await?;
    info!(conversation_id = %conversation.id, "Conversation deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Unread messages sent to the caller
pub async fn unread_messages(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<Message>>, ApiError> {
    Ok(Json(state.conversations().unread_for(claims.user_id()).await?))
}
