//! Ranking candidates by score

use std::cmp::Ordering;

use domain_account::User;
use domain_listing::Listing;

use crate::features::FeatureVector;
use crate::scorer::{HeuristicScorer, ListingScorer};

/// Orders `items` by descending score and keeps the first `limit`
///
/// Ties keep their input order. NaN scores sort last.
pub fn rank<T>(items: Vec<T>, scores: &[f64], limit: usize) -> Vec<(T, f64)> {
    let mut scored: Vec<(T, f64)> = items.into_iter().zip(scores.iter().copied()).collect();
    scored.sort_by(|(_, a), (_, b)| match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(a).unwrap_or(Ordering::Equal),
    });
    scored.truncate(limit);
    scored
}

/// Scores `candidates` for `user` and returns the top `limit`
///
/// Listings the user owns are never recommended. When the scorer fails the
/// heuristic scorer is used instead.
pub async fn recommend(
    scorer: &dyn ListingScorer,
    user: &User,
    candidates: Vec<Listing>,
    limit: usize,
) -> Vec<(Listing, f64)> {
    let candidates: Vec<Listing> = candidates
        .into_iter()
        .filter(|l| l.owner_id != user.id)
        .collect();
    let features: Vec<FeatureVector> = candidates
        .iter()
        .map(|listing| FeatureVector::build(user, listing))
        .collect();

    let scores = match scorer.score(&features).await {
        Ok(scores) => scores,
        Err(e) => {
            tracing::warn!(scorer = scorer.name(), error = %e, "Scorer failed, falling back to heuristic");
            features.iter().map(HeuristicScorer::score_one).collect()
        }
    };

    tracing::debug!(user_id = %user.id, candidates = candidates.len(), scorer = scorer.name(), "Ranked listings");
    rank(candidates, &scores, limit)
}
