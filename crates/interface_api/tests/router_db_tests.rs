//! Status codes of routes whose answer depends on stored rows
//!
//! Each test starts its own container, so they are ignored by default.
//! Run with `cargo test -p interface_api -- --ignored`.

use axum::{
    body::Body,
    http::{header::AUTHORIZATION, header::CONTENT_TYPE, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqlx::PgPool;
use tower::ServiceExt;

use core_kernel::UserId;
use domain_group::GroupStatus;
use domain_messaging::Conversation;
use infra_db::repositories::{
    ConversationRepository, GroupRepository, ListingRepository, RoommateRepository, UserRepository,
};
use interface_api::auth::{JwtKeys, TokenKind};
use interface_api::{config::ApiConfig, create_router};
use test_utils::{db_test, GroupBuilder, ListingBuilder, RoommateBuilder, UserBuilder};

fn config() -> ApiConfig {
    ApiConfig {
        jwt_secret: "router-db-secret".to_string(),
        media_root: std::env::temp_dir().join("nestmate-router-db-tests").display().to_string(),
        ..ApiConfig::default()
    }
}

fn bearer(user_id: UserId) -> String {
    JwtKeys::from_config(&config()).issue(user_id, TokenKind::Access).expect("token")
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>, user_id: UserId) -> (StatusCode, Value) {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {}", bearer(user_id)));
    let request = match body {
        Some(body) => builder.header(CONTENT_TYPE, "application/json").body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request");

    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = response.into_body().collect().await.expect("body").to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

/// Stores `count` users and returns their ids
async fn users(pool: &PgPool, count: usize) -> Vec<UserId> {
    let repo = UserRepository::new(pool.clone());
    let mut ids = Vec::new();
    for _ in 0..count {
        let user = UserBuilder::new().build();
        repo.insert(&user).await.unwrap();
        ids.push(user.id);
    }
    ids
}

db_test!(test_editing_someone_elses_listing_is_not_found, |pool| {
    let app = create_router(pool.clone(), config());
    let ids = users(&pool, 2).await;
    let (owner, stranger) = (ids[0], ids[1]);
    let listings = ListingRepository::new(pool.clone());
    let listing = ListingBuilder::owned_by(owner).build();
    listings.insert_with_pictures(&listing, &[]).await.unwrap();

    let uri = format!("/api/v1/listings/edit/{}", listing.id.as_uuid());
    let (status, _) = send(&app, Method::PATCH, &uri, Some(json!({ "price": 999 })), stranger).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(listings.get(listing.id).await.unwrap().price, listing.price);
});

db_test!(test_only_the_landlord_manages_a_group, |pool| {
    let app = create_router(pool.clone(), config());
    let ids = users(&pool, 2).await;
    let (landlord, tenant) = (ids[0], ids[1]);
    let listing = ListingBuilder::owned_by(landlord).build();
    ListingRepository::new(pool.clone()).insert_with_pictures(&listing, &[]).await.unwrap();
    let roommate = RoommateBuilder::for_user(tenant).build();
    RoommateRepository::new(pool.clone()).insert(&roommate).await.unwrap();
    let groups = GroupRepository::new(pool.clone());
    let group = GroupBuilder::on_listing(listing.id, roommate.id).with_status(GroupStatus::Sent).build();
    groups.insert(&group).await.unwrap();

    let uri = format!("/api/v1/groups/manage/{}", group.id.as_uuid());
    let body = json!({ "group_status": "I" });
    let (status, _) = send(&app, Method::PATCH, &uri, Some(body.clone()), tenant).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(groups.get(group.id).await.unwrap().group_status, GroupStatus::Sent);

    let (status, body) = send(&app, Method::PATCH, &uri, Some(body), landlord).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["group_status"], "I");
});

db_test!(test_conversation_delete_waits_for_others_to_leave, |pool| {
    let app = create_router(pool.clone(), config());
    let ids = users(&pool, 2).await;
    let (landlord, tenant) = (ids[0], ids[1]);
    let listing = ListingBuilder::owned_by(landlord).build();
    ListingRepository::new(pool.clone()).insert_with_pictures(&listing, &[]).await.unwrap();
    let conversations = ConversationRepository::new(pool.clone());
    let conversation = Conversation::start(listing.id, landlord, tenant, &[]).unwrap();
    assert!(conversations.insert_unique(&conversation).await.unwrap());

    let uri = format!("/api/v1/conversations/delete/{}", conversation.id.as_uuid());
    let (status, _) = send(&app, Method::DELETE, &uri, None, tenant).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(conversations.get(conversation.id).await.is_ok());

    let leave = format!("/api/v1/conversations/leave/{}", conversation.id.as_uuid());
    assert_eq!(send(&app, Method::POST, &leave, None, landlord).await.0, StatusCode::OK);
    let (status, _) = send(&app, Method::DELETE, &uri, None, tenant).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
});

db_test!(test_second_review_of_the_same_user_is_refused, |pool| {
    let app = create_router(pool.clone(), config());
    let ids = users(&pool, 2).await;
    let (reviewer, reviewee) = (ids[0], ids[1]);

    let uri = format!("/api/v1/profile/reviews/{}", reviewee.as_uuid());
    let body = json!({ "rating": 4, "comment": "Quiet and tidy.", "reviewee_role": "R" });
    let (status, _) = send(&app, Method::POST, &uri, Some(body.clone()), reviewer).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, Method::POST, &uri, Some(body), reviewer).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
});
