//! User-listing interactions recorded for the recommender

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{define_code_enum, InteractionId, ListingId, UserId};

define_code_enum!(
    InteractionKind {
        Click => "click",
        Favourite => "favourite",
    }
);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingInteraction {
    pub id: InteractionId,
    pub user_id: UserId,
    pub listing_id: ListingId,
    pub kind: InteractionKind,
    pub timestamp: DateTime<Utc>,
}

impl ListingInteraction {
    pub fn record(user_id: UserId, listing_id: ListingId, kind: InteractionKind) -> Self {
        Self {
            id: InteractionId::new_v7(),
            user_id,
            listing_id,
            kind,
            timestamp: Utc::now(),
        }
    }
}
