//! Core Kernel - Foundational types shared by every marketplace crate
//!
//! This crate provides the building blocks used across all domain modules:
//! - Strongly-typed identifiers for each entity
//! - Field-level validation errors in the shape the API returns them
//! - Single-letter choice codes
//! - Great-circle distance helpers for radius search

pub mod identifiers;
pub mod codes;
pub mod validation;
pub mod geo;
pub mod verification;
pub mod error;

pub use identifiers::{
    UserId, RoommateId, ListingId, PictureId, GroupId, InvitationId,
    ConversationId, MessageId, ReviewId, InteractionId,
};
pub use validation::{FieldErrors, parse_flag};
pub use geo::{GeoPoint, haversine_km, EARTH_RADIUS_KM};
pub use codes::UnknownCode;
pub use verification::VerificationStatus;
pub use error::CoreError;
