//! Repository implementations for domain entities
//!
//! Each repository wraps the shared pool, maps rows to domain types and
//! keeps multi-statement writes inside one transaction.

pub mod user;
pub mod roommate;
pub mod listing;
pub mod favorite;
pub mod group;
pub mod conversation;
pub mod review;
pub mod token;

pub use user::UserRepository;
pub use roommate::RoommateRepository;
pub use listing::ListingRepository;
pub use favorite::{FavoriteRepository, InteractionRepository};
pub use group::{GroupRepository, InvitationRepository};
pub use conversation::ConversationRepository;
pub use review::ReviewRepository;
pub use token::TokenRepository;
