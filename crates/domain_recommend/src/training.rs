//! Training data export
//!
//! One example per interaction. When the user has both budget bounds set,
//! interactions with listings priced outside that range are skipped.

use serde::Serialize;

use core_kernel::UserId;
use domain_account::User;
use domain_listing::{InteractionKind, Listing};

use crate::error::RecommendError;
use crate::features::FeatureVector;

/// Label for an interaction kind
pub fn label_for(kind: InteractionKind) -> f64 {
    match kind {
        InteractionKind::Favourite => 1.0,
        InteractionKind::Click => 0.5,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingExample {
    pub user_id: UserId,
    #[serde(flatten)]
    pub features: FeatureVector,
    pub score: f64,
}

impl TrainingExample {
    pub fn to_json_line(&self) -> Result<String, RecommendError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Builds examples from `(user, listing, kind)` interaction rows
pub fn build_training_set<'a, I>(interactions: I) -> Vec<TrainingExample>
where
    I: IntoIterator<Item = (&'a User, &'a Listing, InteractionKind)>,
{
    interactions
        .into_iter()
        .filter(|(user, listing, _)| match user.budget_range() {
            Some((min, max)) => min <= listing.price && listing.price <= max,
            None => true,
        })
        .map(|(user, listing, kind)| TrainingExample {
            user_id: user.id,
            features: FeatureVector::build(user, listing),
            score: label_for(kind),
        })
        .collect()
}
