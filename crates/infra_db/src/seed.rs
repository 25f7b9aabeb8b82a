//! Bulk inserts for seeding a development database
//!
//! Everything in a [`SeedBatch`] is written in one transaction, so a
//! failed seed leaves the database untouched.

use tracing::info;

use domain_account::{RoommateProfile, User};
use domain_group::Group;
use domain_listing::{Listing, ListingInteraction, ListingPicture};
use domain_review::Review;

use crate::error::DatabaseError;
use crate::pool::DatabasePool;
use crate::repositories::{
    favorite::insert_interaction, group::insert_group, listing::insert_listing,
    review::insert_review, roommate::insert_roommate, user::insert_user,
};

/// Rows to seed, in dependency order
#[derive(Debug, Clone, Default)]
pub struct SeedBatch {
    pub users: Vec<User>,
    pub roommates: Vec<RoommateProfile>,
    pub listings: Vec<(Listing, Vec<ListingPicture>)>,
    pub groups: Vec<Group>,
    pub reviews: Vec<Review>,
    pub interactions: Vec<ListingInteraction>,
}

impl SeedBatch {
    pub fn total(&self) -> usize {
        self.users.len()
            + self.roommates.len()
            + self.listings.len()
            + self.groups.len()
            + self.reviews.len()
            + self.interactions.len()
    }
}

pub async fn insert_batch(pool: &DatabasePool, batch: &SeedBatch) -> Result<(), DatabaseError> {
    let mut tx = pool.begin().await?;

    for user in &batch.users {
        insert_user(&mut *tx, user).await?;
    }
    for profile in &batch.roommates {
        insert_roommate(&mut *tx, profile).await?;
    }
    for (listing, pictures) in &batch.listings {
        insert_listing(&mut tx, listing, pictures).await?;
    }
    for group in &batch.groups {
        insert_group(&mut tx, group).await?;
    }
    for review in &batch.reviews {
        insert_review(&mut *tx, review).await?;
    }
    for interaction in &batch.interactions {
        insert_interaction(&mut *tx, interaction).await?;
    }

    tx.commit().await?;
    info!(
        users = batch.users.len(),
        roommates = batch.roommates.len(),
        listings = batch.listings.len(),
        groups = batch.groups.len(),
        reviews = batch.reviews.len(),
        interactions = batch.interactions.len(),
        "Seeded database"
    );
    Ok(())
}
