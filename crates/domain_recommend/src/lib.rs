//! Recommendation Domain
//!
//! Listings are ranked for a user from a fixed feature vector. Scoring sits
//! behind the [`ListingScorer`] port: an in-process heuristic is always
//! available, and a remote prediction service can be plugged in. The model
//! behind that service is trained elsewhere from the examples exported by
//! [`training`].

pub mod features;
pub mod scorer;
pub mod ranking;
pub mod training;
pub mod error;

pub use features::{FeatureVector, LocationEncoder, FEATURE_NAMES};
pub use scorer::{HeuristicScorer, ListingScorer, RemoteScorer};
pub use ranking::{rank, recommend};
pub use training::{build_training_set, label_for, TrainingExample};
pub use error::RecommendError;
