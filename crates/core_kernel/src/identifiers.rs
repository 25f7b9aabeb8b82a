//! Strongly-typed identifiers for marketplace entities
//!
//! Using newtype wrappers around UUIDs provides type safety and prevents
//! accidental mixing of, say, a user id with a roommate profile id.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! define_id {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates a new time-ordered identifier (v7)
            pub fn new_v7() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates from an existing UUID
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Returns the identifier prefix for display
            pub fn prefix() -> &'static str {
                $prefix
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}-{}", $prefix, self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid_str = s.strip_prefix(concat!($prefix, "-")).unwrap_or(s);
                Ok(Self(Uuid::parse_str(uuid_str)?))
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Uuid {
                id.0
            }
        }
    };
}

// Accounts
define_id!(UserId, "USR");
define_id!(RoommateId, "RMT");

// Listings
define_id!(ListingId, "LST");
define_id!(PictureId, "PIC");
define_id!(InteractionId, "INT");

// Groups
define_id!(GroupId, "GRP");
define_id!(InvitationId, "GIN");

// Messaging
define_id!(ConversationId, "CNV");
define_id!(MessageId, "MSG");

// Reviews
define_id!(ReviewId, "REV");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_id_display() {
        let id = ListingId::new();
        assert!(id.to_string().starts_with("LST-"));
    }

    #[test]
    fn test_id_parsing() {
        let original = GroupId::new();
        let parsed: GroupId = original.to_string().parse().unwrap();
        assert_eq!(original, parsed);
    }

    #[test]
    fn test_uuid_conversion() {
        let uuid = Uuid::new_v4();
        let user_id = UserId::from(uuid);
        let back: Uuid = user_id.into();
        assert_eq!(uuid, back);
    }
}
