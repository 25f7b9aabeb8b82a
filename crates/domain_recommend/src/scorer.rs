//! Scorer port and its adapters

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::RecommendError;
use crate::features::{FeatureVector, FEATURE_COUNT, FEATURE_NAMES};

/// Scores candidate listings for one user; higher is better
#[async_trait]
pub trait ListingScorer: Send + Sync {
    /// Returns one score per feature vector, in the same order
    async fn score(&self, features: &[FeatureVector]) -> Result<Vec<f64>, RecommendError>;

    fn name(&self) -> &'static str;
}

const BUDGET_WEIGHT: f64 = 0.5;
const LOCATION_WEIGHT: f64 = 0.3;
const AMENITY_WEIGHT: f64 = 0.2;

/// In-process scorer combining budget fit, location match and amenities
///
/// Scores fall in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicScorer;

impl HeuristicScorer {
    fn budget_fit(f: &FeatureVector) -> f64 {
        let (min, max, price) = (f.budget_min, f.budget_max, f.listing_price);
        if max <= 0.0 {
            return 0.5;
        }
        if price > max {
            (1.0 - (price - max) / max).max(0.0)
        } else if price < min {
            0.8
        } else {
            1.0
        }
    }

    fn location_match(f: &FeatureVector) -> f64 {
        if f.preferred_location != 0.0 && f.preferred_location == f.listing_location {
            1.0
        } else {
            0.0
        }
    }

    fn amenities(f: &FeatureVector) -> f64 {
        let present = f.heating + f.ac + f.fridge + f.heat + f.hydro + f.water + f.internet + f.furnished;
        (present + f.laundry_type / 2.0) / 9.0
    }

    pub fn score_one(f: &FeatureVector) -> f64 {
        BUDGET_WEIGHT * Self::budget_fit(f)
            + LOCATION_WEIGHT * Self::location_match(f)
            + AMENITY_WEIGHT * Self::amenities(f)
    }
}

#[async_trait]
impl ListingScorer for HeuristicScorer {
    async fn score(&self, features: &[FeatureVector]) -> Result<Vec<f64>, RecommendError> {
        Ok(features.iter().map(Self::score_one).collect())
    }

    fn name(&self) -> &'static str {
        "heuristic"
    }
}

#[derive(Serialize)]
struct PredictRequest<'a> {
    columns: &'a [&'static str],
    rows: Vec<[f64; FEATURE_COUNT]>,
}

#[derive(Deserialize)]
struct PredictResponse {
    scores: Vec<f64>,
}

/// Scorer backed by an HTTP prediction service
///
/// Posts `{"columns": [...], "rows": [[...], ...]}` to `<base_url>/predict`
/// and expects `{"scores": [...]}` back.
#[derive(Debug, Clone)]
pub struct RemoteScorer {
    client: Client,
    endpoint: String,
}

impl RemoteScorer {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RecommendError> {
        let client = Client::builder().timeout(timeout).build()?;
        let endpoint = format!("{}/predict", base_url.trim_end_matches('/'));
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ListingScorer for RemoteScorer {
    async fn score(&self, features: &[FeatureVector]) -> Result<Vec<f64>, RecommendError> {
        if features.is_empty() {
            return Ok(Vec::new());
        }

        let body = PredictRequest {
            columns: &FEATURE_NAMES,
            rows: features.iter().map(FeatureVector::to_row).collect(),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        let parsed: PredictResponse = response.json().await?;

        if parsed.scores.len() != features.len() {
            return Err(RecommendError::ScoreCountMismatch {
                expected: features.len(),
                got: parsed.scores.len(),
            });
        }
        Ok(parsed.scores)
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}
