//! Group, invitation and application handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use tracing::info;

use core_kernel::{FieldErrors, GroupId, InvitationId, ListingId};
use domain_group::{
    ApplicationViews, Group, GroupDraft, GroupInvitation, GroupPatch, GroupStatus, LeaveOutcome,
};

use crate::auth::Claims;
use crate::dto::group::{InvitationAnswer, InvitationLists, InviteRequest, ManageGroupRequest};
use crate::dto::MessageResponse;
use crate::error::ApiError;
use crate::extract::AppJson;
use crate::handlers::require_roommate;
use crate::AppState;

pub async fn list_for_listing(
    State(state): State<AppState>,
    Path(id): Path<ListingId>,
) -> Result<Json<Vec<Group>>, ApiError> {
    let listing = state.listings().get(id).await?;
    Ok(Json(state.groups().list_for_listing(listing.id).await?))
}

/// Creates a group on a listing with the caller's roommate profile as owner
pub async fn create_group(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<ListingId>,
    AppJson(draft): AppJson<GroupDraft>,
) -> Result<(StatusCode, Json<Group>), ApiError> {
    let listing = state.listings().get(id).await?;
    let roommate = require_roommate(&state, claims.user_id()).await?;

    let group = draft.validate(listing.id, roommate.id)?;
    state.groups().insert(&group).await?;
    info!(group_id = %group.id, listing_id = %listing.id, "Group created");

    Ok((StatusCode::CREATED, Json(group)))
}

pub async fn get_group(
    State(state): State<AppState>,
    Path(id): Path<GroupId>,
) -> Result<Json<Group>, ApiError> {
    Ok(Json(state.groups().get(id).await?))
}

/// Tenant edit by the owner or a member
pub async fn edit_group(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<GroupId>,
    AppJson(patch): AppJson<GroupPatch>,
) -> Result<Json<Group>, ApiError> {
    let roommate = require_roommate(&state, claims.user_id()).await?;
    let (group, ()) = state
        .groups()
        .modify(id, |group| {
            if !group.involves(roommate.id) {
                return Err(ApiError::Forbidden(
                    "You do not have permission to edit this group.".to_string(),
                ));
            }
            patch.apply(group).map_err(ApiError::from)
        })
        .await?;
    Ok(Json(group))
}

pub async fn delete_group(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<GroupId>,
) -> Result<StatusCode, ApiError> {
    let groups = state.groups();
    let group = groups.get(id).await?;
    let roommate = require_roommate(&state, claims.user_id()).await?;
    if group.owner_id != roommate.id {
        return Err(ApiError::Forbidden("Only the group owner can delete this group.".to_string()));
    }

    groups.delete(group.id).await?;
    info!(group_id = %group.id, "Group deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Landlord status change; inviting a group rejects the other groups on
/// the listing in the same transaction
pub async fn manage_group(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<GroupId>,
    AppJson(request): AppJson<ManageGroupRequest>,
) -> Result<Json<Group>, ApiError> {
    let groups = state.groups();
    let mut group = groups.get(id).await?;
    let listing = state.listings().get(group.listing_id).await?;
    if !listing.is_owned_by(claims.user_id()) {
        return Err(ApiError::not_found("Group"));
    }

    let Some(code) = request.group_status else {
        return Err(FieldErrors::single("group_status", "This field is required.").into());
    };
    let status = GroupStatus::parse_for_landlord(code.trim())?;
    let reject_siblings = group.set_status_as_landlord(status)?;
    let rejected = groups.set_landlord_status(&group, reject_siblings).await?;

    info!(group_id = %group.id, status = %status, rejected, "Group status set by landlord");
    Ok(Json(group))
}

pub async fn join_group(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<GroupId>,
) -> Result<Json<Group>, ApiError> {
    let roommate = require_roommate(&state, claims.user_id()).await?;
    let invited = state.invitations().has_accepted(id, roommate.id).await?;

    let (group, ()) = state
        .groups()
        .modify(id, |group| group.join(roommate.id, invited).map_err(ApiError::from))
        .await?;
    info!(group_id = %group.id, roommate_id = %roommate.id, "Joined group");
    Ok(Json(group))
}

/// Leaves a group; the last member out deletes it
pub async fn leave_group(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<GroupId>,
) -> Result<Json<MessageResponse>, ApiError> {
    let roommate = require_roommate(&state, claims.user_id()).await?;
    let (group, outcome) = state
        .groups()
        .modify(id, |group| group.leave(roommate.id).map_err(ApiError::from))
        .await?;

    let message = match outcome {
        LeaveOutcome::Disbanded => "You left the group. It had no members left and was deleted.",
        LeaveOutcome::OwnershipTransferred(new_owner) => {
            info!(group_id = %group.id, new_owner = %new_owner, "Group ownership transferred");
            "You left the group. Ownership passed to the longest-standing member."
        }
        LeaveOutcome::Left => "You left the group.",
    };
    Ok(Json(MessageResponse::new(message)))
}

pub async fn invite(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<GroupId>,
    AppJson(request): AppJson<InviteRequest>,
) -> Result<(StatusCode, Json<GroupInvitation>), ApiError> {
    let group = state.groups().get(id).await?;
    let inviter = require_roommate(&state, claims.user_id()).await?;
    let invitee = state.roommates().get(request.invited_user).await?;
    let listing = state.listings().get(group.listing_id).await?;
    let invitations = state.invitations();
    let already_invited = invitations.exists(group.id, invitee.id).await?;

    let invitation = GroupInvitation::create(
        &group,
        inviter.id,
        invitee.id,
        listing.is_owned_by(invitee.user_id),
        already_invited,
    )?;
    invitations.insert(&invitation).await?;
    info!(invitation_id = %invitation.id, group_id = %group.id, "Invitation sent");

    Ok((StatusCode::CREATED, Json(invitation)))
}

/// Invitations the caller received and sent
pub async fn list_invitations(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<InvitationLists>, ApiError> {
    let roommate = require_roommate(&state, claims.user_id()).await?;
    let invitations = state.invitations();
    Ok(Json(InvitationLists {
        received: invitations.received(roommate.id).await?,
        sent: invitations.sent(roommate.id).await?,
    }))
}

/// The invitee accepts or declines; accepting joins the group
pub async fn respond_to_invitation(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<InvitationId>,
    AppJson(answer): AppJson<InvitationAnswer>,
) -> Result<Json<GroupInvitation>, ApiError> {
    let Some(accepted) = answer.accepted else {
        return Err(FieldErrors::single("accepted", "This field is required.").into());
    };
    let roommate = require_roommate(&state, claims.user_id()).await?;
    let invitations = state.invitations();
    let mut invitation = invitations.get(id).await?;
    let mut group = state.groups().get(invitation.group_id).await?;

    invitation.respond(roommate.id, accepted, &mut group)?;
    invitations.save_response(&invitation).await?;
    info!(invitation_id = %invitation.id, accepted, "Invitation answered");
    Ok(Json(invitation))
}

pub async fn delete_invitation(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<InvitationId>,
) -> Result<StatusCode, ApiError> {
    let roommate = require_roommate(&state, claims.user_id()).await?;
    let invitations = state.invitations();
    let invitation = invitations.get(id).await?;
    if !invitation.can_delete(roommate.id) {
        return Err(ApiError::Forbidden(
            "You do not have permission to delete this invitation.".to_string(),
        ));
    }

    invitations.delete(invitation.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn application_views(state: &AppState, claims: &Claims) -> Result<ApplicationViews, ApiError> {
    let groups = state.groups();
    let listing_groups = groups.list_for_landlord(claims.user_id()).await?;
    let member_groups = match state.roommates().find_by_user(claims.user_id()).await? {
        Some(roommate) => groups.list_for_roommate(roommate.id).await?,
        None => Vec::new(),
    };
    Ok(ApplicationViews::build(listing_groups, member_groups))
}

/// Applications on the caller's listings plus the answered applications
/// of the groups they belong to
pub async fn applications(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<Group>>, ApiError> {
    let views = application_views(&state, &claims).await?;
    Ok(Json(views.applications().into_iter().cloned().collect()))
}

pub async fn application_management(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ApplicationViews>, ApiError> {
    Ok(Json(application_views(&state, &claims).await?))
}
