//! Repository workflows against a real PostgreSQL
//!
//! Each test starts its own container, so they are ignored by default.
//! Run with `cargo test -p test_utils -- --ignored`.

use chrono::{Duration, Utc};
use rust_decimal_macros::dec;
use uuid::Uuid;

use core_kernel::PictureId;
use domain_account::RoommateProfile;
use domain_group::{GroupInvitation, GroupPatch, GroupStatus, InvitationStatus, LeaveOutcome};
use domain_listing::{FavoriteToggle, InteractionKind, Listing, ListingPicture, ListingQuery};
use domain_messaging::{mark_read, Conversation, MessageDraft};
use domain_review::ReviewFilter;
use infra_db::repositories::{
    ConversationRepository, FavoriteRepository, GroupRepository, InteractionRepository,
    InvitationRepository, ListingRepository, ReviewRepository, RoommateRepository,
    TokenRepository, UserRepository,
};
use infra_db::{insert_batch, DatabaseError, SeedBatch};
use sqlx::PgPool;
use test_utils::{
    db_test, GroupBuilder, ListingBuilder, ReviewBuilder, RoommateBuilder, TestResult, UserBuilder,
};

fn picture(listing: &Listing, position: i32) -> ListingPicture {
    ListingPicture {
        id: PictureId::new_v7(),
        listing_id: listing.id,
        image: format!("listing_pictures/{}/{}.jpg", listing.id.as_uuid(), position),
        position,
        is_primary: position == 0,
    }
}

/// A stored listing plus `count` stored roommate profiles, none of them
/// owned by the listing's landlord
async fn listing_with_roommates(pool: &PgPool, count: usize) -> (Listing, Vec<RoommateProfile>) {
    let users = UserRepository::new(pool.clone());
    let roommates = RoommateRepository::new(pool.clone());
    let landlord = UserBuilder::new().build();
    users.insert(&landlord).await.unwrap();

    let mut profiles = Vec::new();
    for _ in 0..count {
        let user = UserBuilder::new().build();
        users.insert(&user).await.unwrap();
        let profile = RoommateBuilder::for_user(user.id).build();
        roommates.insert(&profile).await.unwrap();
        profiles.push(profile);
    }

    let listing = ListingBuilder::owned_by(landlord.id).build();
    ListingRepository::new(pool.clone()).insert_with_pictures(&listing, &[]).await.unwrap();
    (listing, profiles)
}

db_test!(test_email_lookup_is_case_insensitive, |pool| {
    let users = UserRepository::new(pool);
    let user = UserBuilder::new().with_email("sam@example.com").build();
    users.insert(&user).await.unwrap();

    let found = users.find_by_email("sam@example.com").await.unwrap().unwrap();
    assert_eq!(found.id, user.id);
    assert!(users.email_taken("SAM@example.com", None).await.unwrap());
    assert!(!users.email_taken("sam@example.com", Some(user.id)).await.unwrap());
});

db_test!(test_duplicate_email_is_rejected, |pool| {
    let users = UserRepository::new(pool);
    users.insert(&UserBuilder::new().with_email("dup@example.com").build()).await.unwrap();

    let err = users
        .insert(&UserBuilder::new().with_email("dup@example.com").build())
        .await
        .unwrap_err();
    assert!(matches!(err, DatabaseError::DuplicateEntry(_)));
});

db_test!(test_listing_lifecycle, |pool| {
    let owner = UserBuilder::new().build();
    let stranger = UserBuilder::new().build();
    let users = UserRepository::new(pool.clone());
    users.insert(&owner).await.unwrap();
    users.insert(&stranger).await.unwrap();

    let listings = ListingRepository::new(pool.clone());
    let cheap = ListingBuilder::owned_by(owner.id).with_price(dec!(900)).build();
    let pricey = ListingBuilder::owned_by(owner.id).with_price(dec!(3200)).build();
    let pictures: Vec<_> = (0..4).map(|p| picture(&cheap, p)).collect();
    listings.insert_with_pictures(&cheap, &pictures).await.unwrap();
    listings.insert_with_pictures(&pricey, &[]).await.unwrap();

    let query = ListingQuery { max_price: Some(dec!(1000)), ..ListingQuery::default() };
    let found = listings.search(&query).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, cheap.id);

    let stored = listings.pictures(cheap.id).await.unwrap();
    assert_eq!(stored.len(), 4);
    assert!(stored[0].is_primary);

    let err = listings.get_owned(cheap.id, stranger.id).await.unwrap_err();
    assert!(matches!(err, DatabaseError::NotFound(_)));

    let removed = listings.delete(cheap.id).await.unwrap();
    assert_eq!(removed.len(), 4);
    assert!(listings.find(cheap.id).await.unwrap().is_none());
});

db_test!(test_listing_edit_is_atomic_with_its_pictures, |pool| {
    let owner = UserBuilder::new().build();
    UserRepository::new(pool.clone()).insert(&owner).await.unwrap();
    let listings = ListingRepository::new(pool.clone());
    let listing = ListingBuilder::owned_by(owner.id).with_price(dec!(1800)).build();
    let pictures: Vec<_> = (0..4).map(|p| picture(&listing, p)).collect();
    listings.insert_with_pictures(&listing, &pictures).await.unwrap();

    let mut edited = listing.clone();
    edited.price = dec!(2500);
    let unsaved = ListingBuilder::owned_by(owner.id).build();
    let dangling = picture(&unsaved, 0);
    assert!(listings.update_with_pictures(&edited, &[dangling]).await.is_err());
    assert_eq!(listings.get(listing.id).await.unwrap().price, dec!(1800));
    assert_eq!(listings.pictures(listing.id).await.unwrap().len(), 4);

    let front = ListingPicture {
        image: format!("listing_pictures/{}/new-front.jpg", listing.id.as_uuid()),
        ..picture(&listing, 0)
    };
    let removed = listings.update_with_pictures(&edited, &[front]).await.unwrap();
    assert_eq!(removed, vec![pictures[0].image.clone()]);
    assert_eq!(listings.get(listing.id).await.unwrap().price, dec!(2500));
    let stored = listings.pictures(listing.id).await.unwrap();
    assert_eq!(stored.len(), 4);
    assert_eq!(stored.iter().filter(|p| p.is_primary).count(), 1);
});

db_test!(test_favorite_toggle_records_interaction, |pool| {
    let owner = UserBuilder::new().build();
    let fan = UserBuilder::new().build();
    let users = UserRepository::new(pool.clone());
    users.insert(&owner).await.unwrap();
    users.insert(&fan).await.unwrap();
    let listing = ListingBuilder::owned_by(owner.id).build();
    ListingRepository::new(pool.clone()).insert_with_pictures(&listing, &[]).await.unwrap();

    let favorites = FavoriteRepository::new(pool.clone());
    assert_eq!(favorites.toggle(fan.id, listing.id).await.unwrap(), FavoriteToggle::Added);
    assert!(favorites.is_favorite(fan.id, listing.id).await.unwrap());
    assert_eq!(favorites.list(fan.id).await.unwrap().len(), 1);

    assert_eq!(favorites.toggle(fan.id, listing.id).await.unwrap(), FavoriteToggle::Removed);
    assert!(!favorites.is_favorite(fan.id, listing.id).await.unwrap());

    let interactions = InteractionRepository::new(pool).list_all().await.unwrap();
    assert_eq!(interactions.len(), 1);
    assert_eq!(interactions[0].kind, InteractionKind::Favourite);
});

db_test!(test_inviting_a_group_rejects_every_other_group_on_the_listing, |pool| {
    let (listing, roommates) = listing_with_roommates(&pool, 3).await;
    let groups = GroupRepository::new(pool.clone());
    let mut chosen = GroupBuilder::on_listing(listing.id, roommates[0].id).with_status(GroupStatus::Sent).build();
    let other = GroupBuilder::on_listing(listing.id, roommates[1].id).with_status(GroupStatus::Sent).build();
    groups.insert(&chosen).await.unwrap();
    groups.insert(&other).await.unwrap();

    let reject_siblings = chosen.set_status_as_landlord(GroupStatus::Invited).unwrap();
    // Applies after the landlord looked at the listing's groups
    let late = GroupBuilder::on_listing(listing.id, roommates[2].id).with_status(GroupStatus::Sent).build();
    groups.insert(&late).await.unwrap();

    let rejected = groups.set_landlord_status(&chosen, reject_siblings).await.unwrap();

    assert_eq!(rejected, 2);
    assert_eq!(groups.get(chosen.id).await.unwrap().group_status, GroupStatus::Invited);
    assert_eq!(groups.get(other.id).await.unwrap().group_status, GroupStatus::Rejected);
    assert_eq!(groups.get(late.id).await.unwrap().group_status, GroupStatus::Rejected);
});

db_test!(test_under_review_leaves_other_groups_alone, |pool| {
    let (listing, roommates) = listing_with_roommates(&pool, 2).await;
    let groups = GroupRepository::new(pool.clone());
    let mut chosen = GroupBuilder::on_listing(listing.id, roommates[0].id).with_status(GroupStatus::Sent).build();
    let other = GroupBuilder::on_listing(listing.id, roommates[1].id).with_status(GroupStatus::Sent).build();
    groups.insert(&chosen).await.unwrap();
    groups.insert(&other).await.unwrap();

    let reject_siblings = chosen.set_status_as_landlord(GroupStatus::UnderReview).unwrap();
    assert_eq!(groups.set_landlord_status(&chosen, reject_siblings).await.unwrap(), 0);
    assert_eq!(groups.get(other.id).await.unwrap().group_status, GroupStatus::Sent);
});

db_test!(test_concurrent_joins_keep_every_member, |pool| {
    let (listing, roommates) = listing_with_roommates(&pool, 3).await;
    let (owner, a, b) = (roommates[0].id, roommates[1].id, roommates[2].id);
    let groups = GroupRepository::new(pool.clone());
    let group = GroupBuilder::on_listing(listing.id, owner).build();
    groups.insert(&group).await.unwrap();

    let (joined_a, joined_b) = tokio::join!(
        groups.modify(group.id, |g| -> TestResult { Ok(g.join(a, false)?) }),
        groups.modify(group.id, |g| -> TestResult { Ok(g.join(b, false)?) }),
    );
    joined_a.unwrap();
    joined_b.unwrap();

    let stored = groups.get(group.id).await.unwrap();
    assert_eq!(stored.members.len(), 3);
    assert!(stored.is_member(a) && stored.is_member(b));
});

db_test!(test_group_edit_does_not_touch_members, |pool| {
    let (listing, roommates) = listing_with_roommates(&pool, 2).await;
    let (owner, joiner) = (roommates[0].id, roommates[1].id);
    let groups = GroupRepository::new(pool.clone());
    let group = GroupBuilder::on_listing(listing.id, owner).build();
    groups.insert(&group).await.unwrap();

    let before_join = groups.get(group.id).await.unwrap();
    groups.modify(group.id, |g| -> TestResult { Ok(g.join(joiner, false)?) }).await.unwrap();

    let patch = GroupPatch { name: Some("Renamed crew".to_string()), ..GroupPatch::default() };
    let (edited, ()) = groups
        .modify(before_join.id, |g| -> TestResult { Ok(patch.apply(g)?) })
        .await
        .unwrap();

    assert_eq!(edited.name, "Renamed crew");
    assert_eq!(groups.get(group.id).await.unwrap().member_ids(), vec![owner, joiner]);
});

db_test!(test_leaving_removes_only_the_leaver, |pool| {
    let (listing, roommates) = listing_with_roommates(&pool, 3).await;
    let (owner, a, b) = (roommates[0].id, roommates[1].id, roommates[2].id);
    let groups = GroupRepository::new(pool.clone());
    let group = GroupBuilder::on_listing(listing.id, owner).with_members(&[a, b]).build();
    groups.insert(&group).await.unwrap();

    let (_, outcome) = groups.modify(group.id, |g| -> TestResult<LeaveOutcome> { Ok(g.leave(owner)?) }).await.unwrap();
    assert_eq!(outcome, LeaveOutcome::OwnershipTransferred(a));

    let stored = groups.get(group.id).await.unwrap();
    assert_eq!(stored.owner_id, a);
    assert_eq!(stored.member_ids(), vec![a, b]);
});

db_test!(test_last_member_out_deletes_the_group, |pool| {
    let (listing, roommates) = listing_with_roommates(&pool, 1).await;
    let owner = roommates[0].id;
    let groups = GroupRepository::new(pool.clone());
    let group = GroupBuilder::on_listing(listing.id, owner).build();
    groups.insert(&group).await.unwrap();

    let (_, outcome) = groups.modify(group.id, |g| -> TestResult<LeaveOutcome> { Ok(g.leave(owner)?) }).await.unwrap();
    assert_eq!(outcome, LeaveOutcome::Disbanded);
    assert!(groups.get(group.id).await.unwrap_err().is_not_found());
});

db_test!(test_refused_change_writes_nothing, |pool| {
    let (listing, roommates) = listing_with_roommates(&pool, 2).await;
    let groups = GroupRepository::new(pool.clone());
    let group = GroupBuilder::on_listing(listing.id, roommates[0].id).with_status(GroupStatus::Filled).build();
    groups.insert(&group).await.unwrap();

    let joiner = roommates[1].id;
    assert!(groups.modify(group.id, |g| -> TestResult { Ok(g.join(joiner, false)?) }).await.is_err());
    assert_eq!(groups.get(group.id).await.unwrap().members.len(), 1);
});

db_test!(test_accepting_an_invitation_adds_the_member, |pool| {
    let (listing, roommates) = listing_with_roommates(&pool, 3).await;
    let (owner, invitee, joiner) = (roommates[0].id, roommates[1].id, roommates[2].id);
    let groups = GroupRepository::new(pool.clone());
    let group = GroupBuilder::on_listing(listing.id, owner).build();
    groups.insert(&group).await.unwrap();

    let invitations = InvitationRepository::new(pool.clone());
    let mut invitation = GroupInvitation::create(&group, owner, invitee, false, false).unwrap();
    invitations.insert(&invitation).await.unwrap();
    assert!(invitations.exists(group.id, invitee).await.unwrap());

    // The invitee answers from a copy read before someone else joined
    let mut seen = groups.get(group.id).await.unwrap();
    groups.modify(group.id, |g| -> TestResult { Ok(g.join(joiner, false)?) }).await.unwrap();
    invitation.respond(invitee, true, &mut seen).unwrap();
    invitations.save_response(&invitation).await.unwrap();

    let stored = groups.get(group.id).await.unwrap();
    assert_eq!(stored.member_ids(), vec![owner, joiner, invitee]);
    assert_eq!(invitations.get(invitation.id).await.unwrap().status, InvitationStatus::Accepted);
    assert!(invitations.has_accepted(group.id, invitee).await.unwrap());

    let err = invitations.save_response(&invitation).await.unwrap_err();
    assert!(matches!(err, DatabaseError::ConstraintViolation(_)));
});

db_test!(test_conversation_unread_flow, |pool| {
    let landlord = UserBuilder::new().build();
    let tenant = UserBuilder::new().build();
    let users = UserRepository::new(pool.clone());
    users.insert(&landlord).await.unwrap();
    users.insert(&tenant).await.unwrap();
    let listing = ListingBuilder::owned_by(landlord.id).build();
    ListingRepository::new(pool.clone()).insert_with_pictures(&listing, &[]).await.unwrap();

    let conversations = ConversationRepository::new(pool.clone());
    let mut conversation = Conversation::start(listing.id, landlord.id, tenant.id, &[]).unwrap();
    assert!(conversations.insert_unique(&conversation).await.unwrap());

    let draft = MessageDraft { content: Some("Is parking included?".to_string()) };
    let message = conversation.send(tenant.id, draft).unwrap();
    conversations.add_message(&conversation, &message).await.unwrap();

    assert_eq!(conversations.unread_for(landlord.id).await.unwrap().len(), 1);
    assert!(conversations.unread_for(tenant.id).await.unwrap().is_empty());

    let mut messages = conversations.messages(conversation.id).await.unwrap();
    let changed = mark_read(landlord.id, &mut messages);
    conversations.mark_read(&changed).await.unwrap();
    assert!(conversations.unread_for(landlord.id).await.unwrap().is_empty());

    let existing = conversations.list_for_listing(listing.id, tenant.id).await.unwrap();
    assert!(Conversation::start(listing.id, landlord.id, tenant.id, &existing).is_err());
});

db_test!(test_concurrent_starts_create_one_conversation, |pool| {
    let landlord = UserBuilder::new().build();
    let tenant = UserBuilder::new().build();
    let users = UserRepository::new(pool.clone());
    users.insert(&landlord).await.unwrap();
    users.insert(&tenant).await.unwrap();
    let listing = ListingBuilder::owned_by(landlord.id).build();
    ListingRepository::new(pool.clone()).insert_with_pictures(&listing, &[]).await.unwrap();

    let conversations = ConversationRepository::new(pool.clone());
    let first = Conversation::start(listing.id, landlord.id, tenant.id, &[]).unwrap();
    let second = Conversation::start(listing.id, landlord.id, tenant.id, &[]).unwrap();
    let (a, b) = tokio::join!(conversations.insert_unique(&first), conversations.insert_unique(&second));

    assert!(a.unwrap() ^ b.unwrap());
    assert_eq!(conversations.list_for_user(tenant.id).await.unwrap().len(), 1);
});

db_test!(test_reviews_are_unique_per_pair, |pool| {
    let (a, b) = (UserBuilder::new().build(), UserBuilder::new().build());
    let users = UserRepository::new(pool.clone());
    users.insert(&a).await.unwrap();
    users.insert(&b).await.unwrap();

    let reviews = ReviewRepository::new(pool);
    reviews.insert(&ReviewBuilder::between(a.id, b.id).with_rating(5).build()).await.unwrap();
    assert!(reviews.exists(a.id, b.id).await.unwrap());
    assert!(!reviews.exists(b.id, a.id).await.unwrap());

    let err = reviews.insert(&ReviewBuilder::between(a.id, b.id).build()).await.unwrap_err();
    assert!(matches!(err, DatabaseError::DuplicateEntry(_)));

    let filter = ReviewFilter { reviewer: None, reviewee: Some(b.id) };
    assert_eq!(reviews.list(&filter).await.unwrap().len(), 1);
});

db_test!(test_revoked_tokens_are_purged_after_expiry, |pool| {
    let tokens = TokenRepository::new(pool);
    let (stale, live) = (Uuid::new_v4(), Uuid::new_v4());
    let now = Utc::now();
    tokens.revoke(stale, now - Duration::hours(1)).await.unwrap();
    tokens.revoke(live, now + Duration::hours(1)).await.unwrap();

    assert!(tokens.is_revoked(stale).await.unwrap());
    assert_eq!(tokens.purge_expired(now).await.unwrap(), 1);
    assert!(!tokens.is_revoked(stale).await.unwrap());
    assert!(tokens.is_revoked(live).await.unwrap());
});

db_test!(test_seed_batch_is_all_or_nothing, |pool| {
    let first = UserBuilder::new().with_email("seed@example.com").build();
    let clash = UserBuilder::new().with_email("seed@example.com").build();
    let batch = SeedBatch { users: vec![first, clash], ..SeedBatch::default() };

    assert!(insert_batch(&pool, &batch).await.is_err());
    assert!(UserRepository::new(pool.clone()).list_all().await.unwrap().is_empty());

    let owner = UserBuilder::new().build();
    let roommate = RoommateBuilder::for_user(owner.id).build();
    let listing = ListingBuilder::owned_by(owner.id).build();
    let reviewer = UserBuilder::new().build();
    let review = ReviewBuilder::between(reviewer.id, owner.id).build();
    let batch = SeedBatch {
        users: vec![owner, reviewer],
        roommates: vec![roommate],
        listings: vec![(listing, Vec::new())],
        reviews: vec![review],
        ..SeedBatch::default()
    };
    insert_batch(&pool, &batch).await.unwrap();
    assert_eq!(UserRepository::new(pool.clone()).list_all().await.unwrap().len(), 2);
    assert_eq!(ListingRepository::new(pool).list_all().await.unwrap().len(), 1);
});
