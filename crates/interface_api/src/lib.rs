//! HTTP API Layer
//!
//! This crate provides the REST API for the Nestmate marketplace using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: Request handlers for each domain
//! - **Middleware**: Authentication, optional authentication, audit logging
//! - **DTOs**: Request/Response data transfer objects
//! - **Error Handling**: Consistent error responses with per-field messages
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::create_router;
//!
//! let app = create_router(pool, config);
//! axum::serve(listener, app).await?;
//! ```

pub mod config;
pub mod error;
pub mod middleware;
pub mod handlers;
pub mod dto;
pub mod auth;
pub mod extract;
pub mod storage;
pub mod mailer;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{delete, get, patch, post},
    Router,
};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use domain_recommend::{HeuristicScorer, ListingScorer, RemoteScorer};
use infra_db::repositories::{
    ConversationRepository, FavoriteRepository, GroupRepository, InteractionRepository,
    InvitationRepository, ListingRepository, ReviewRepository, RoommateRepository,
    TokenRepository, UserRepository,
};

use crate::auth::JwtKeys;
use crate::config::ApiConfig;
use crate::handlers::{
    auth as account, conversations, groups, health, listings, profile, reviews, roommates,
};
use crate::mailer::{LogMailer, MailTemplates, Mailer};
use crate::middleware::{audit_middleware, auth_middleware, optional_auth_middleware};
use crate::storage::MediaStorage;

/// Request body cap for listing forms, which carry up to eleven pictures
pub const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: ApiConfig,
    pub keys: JwtKeys,
    pub storage: MediaStorage,
    pub mail: MailTemplates,
    pub mailer: Arc<dyn Mailer>,
    pub scorer: Arc<dyn ListingScorer>,
}

impl AppState {
    /// Builds the default state: log mailer, and the remote scorer when
    /// `scorer_url` is configured
    pub fn new(pool: PgPool, config: ApiConfig) -> Self {
        let scorer: Arc<dyn ListingScorer> = match config.scorer_url.as_deref() {
            Some(url) => match RemoteScorer::new(url, config.scorer_timeout()) {
                Ok(remote) => Arc::new(remote),
                Err(e) => {
                    tracing::warn!(error = %e, "Remote scorer unavailable, using heuristic");
                    Arc::new(HeuristicScorer)
                }
            },
            None => Arc::new(HeuristicScorer),
        };

        Self {
            keys: JwtKeys::from_config(&config),
            storage: MediaStorage::new(&config.media_root),
            mail: MailTemplates::from_config(&config),
            mailer: Arc::new(LogMailer),
            scorer,
            pool,
            config,
        }
    }

    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.pool.clone())
    }

    pub fn roommates(&self) -> RoommateRepository {
        RoommateRepository::new(self.pool.clone())
    }

    pub fn listings(&self) -> ListingRepository {
        ListingRepository::new(self.pool.clone())
    }

    pub fn favorites(&self) -> FavoriteRepository {
        FavoriteRepository::new(self.pool.clone())
    }

    pub fn interactions(&self) -> InteractionRepository {
        InteractionRepository::new(self.pool.clone())
    }

    pub fn groups(&self) -> GroupRepository {
        GroupRepository::new(self.pool.clone())
    }

    pub fn invitations(&self) -> InvitationRepository {
        InvitationRepository::new(self.pool.clone())
    }

    pub fn conversations(&self) -> ConversationRepository {
        ConversationRepository::new(self.pool.clone())
    }

    pub fn reviews(&self) -> ReviewRepository {
        ReviewRepository::new(self.pool.clone())
    }

    pub fn tokens(&self) -> TokenRepository {
        TokenRepository::new(self.pool.clone())
    }
}

/// Creates the main API router
///
/// # Arguments
///
/// * `pool` - Database connection pool
/// * `config` - API configuration
///
/// # Returns
///
/// Configured Axum router with all routes and middleware
pub fn create_router(pool: PgPool, config: ApiConfig) -> Router {
    create_router_with_state(AppState::new(pool, config))
}

/// Same as [`create_router`] with a prepared state, e.g. a custom mailer or scorer
pub fn create_router_with_state(state: AppState) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    // Account routes reachable without a token
    let account_routes = Router::new()
        .route("/register", post(account::register))
        .route("/login", post(account::login))
        .route("/token/refresh", post(account::refresh))
        .route("/verify-email", post(account::verify_email))
        .route("/resend-verification", post(account::resend_verification))
        .route("/password-reset", post(account::password_reset))
        .route("/password-reset/confirm", post(account::password_reset_confirm));

    // Browsing works anonymously; a token personalizes the response
    let browse_routes = Router::new()
        .route("/listings/viewAll", get(listings::view_all))
        .route("/listings/:id", get(listings::get_listing))
        .route("/roommates", get(roommates::list_roommates))
        .route_layer(axum_middleware::from_fn(audit_middleware))
        .route_layer(axum_middleware::from_fn_with_state(state.clone(), optional_auth_middleware));

    let profile_routes = Router::new()
        .route("/logout", post(account::logout))
        .route("/profile/me", get(profile::me))
        .route("/profile/edit", patch(profile::edit_profile))
        .route("/profile/:id", get(profile::public_profile))
        .route("/delete-profile", delete(profile::delete_profile));

    let listing_routes = Router::new()
        .route("/listings/add", post(listings::add_listing))
        .route("/listings/edit/:id", patch(listings::edit_listing))
        .route("/listings/delete/:id", delete(listings::delete_listing))
        .route("/listings/recommended", get(listings::recommended))
        .route("/listings/:id/favorite", post(listings::toggle_favorite))
        .route("/favorites", get(listings::favorites))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES));

    let roommate_routes = Router::new()
        .route("/roommates/post", post(roommates::create_roommate))
        .route("/roommates/edit/:id", patch(roommates::edit_roommate))
        .route("/roommates/:id", get(roommates::get_roommate));

    let group_routes = Router::new()
        .route("/listings/:id/groups", get(groups::list_for_listing))
        .route("/listings/:id/groups/post", post(groups::create_group))
        .route("/groups/invitations", get(groups::list_invitations))
        .route("/groups/invitations/:id/update", patch(groups::respond_to_invitation))
        .route("/groups/invitations/:id/delete", delete(groups::delete_invitation))
        .route("/groups/edit/:id", patch(groups::edit_group))
        .route("/groups/delete/:id", delete(groups::delete_group))
        .route("/groups/manage/:id", patch(groups::manage_group))
        .route("/groups/:id", get(groups::get_group))
        .route("/groups/:id/join", patch(groups::join_group).put(groups::join_group))
        .route("/groups/:id/leave", patch(groups::leave_group).put(groups::leave_group))
        .route("/groups/:id/invite", post(groups::invite))
        .route("/applications", get(groups::applications))
        .route("/applications/management", get(groups::application_management));

    let conversation_routes = Router::new()
        .route("/conversations", get(conversations::list_conversations))
        .route("/conversations/:id", get(conversations::conversation_detail))
        .route("/conversations/:id/send_message", post(conversations::send_message))
        .route("/conversations/leave/:id", post(conversations::leave_conversation))
        .route("/conversations/delete/:id", delete(conversations::delete_conversation))
        .route("/listings/:id/start_conversation", post(conversations::start_conversation))
        .route("/messages", get(conversations::unread_messages));

    let review_routes = Router::new()
        .route("/profile/reviews/:id", post(reviews::create_review))
        .route("/reviews", get(reviews::list_reviews))
        .route("/reviews/:id", get(reviews::get_review))
        .route(
            "/reviews/manage/:id",
            patch(reviews::update_review).delete(reviews::delete_review),
        );

    // Protected API routes
    let protected_routes = Router::new()
        .merge(profile_routes)
        .merge(listing_routes)
        .merge(roommate_routes)
        .merge(group_routes)
        .merge(conversation_routes)
        .merge(review_routes)
        .route_layer(axum_middleware::from_fn(audit_middleware))
        .route_layer(axum_middleware::from_fn_with_state(state.clone(), auth_middleware));

    let api_routes = Router::new()
        .merge(account_routes)
        .merge(browse_routes)
        .merge(protected_routes);

    // Combine all routes
    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
