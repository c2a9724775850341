use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;

use super::aggregator::TokenRatings;
use super::{Locale, RatedTrack, TrackAttributes, mean};

/// Producer affinity counts three times as much as voicebank affinity.
pub const PRODUCER_WEIGHT: f64 = 3.0;
pub const VOICEBANK_WEIGHT: f64 = 1.0;
/// Tracks must score strictly above this to be recommended.
pub const MIN_SCORE_THRESHOLD: f64 = 0.3;
pub const DEFAULT_RECOMMENDATION_LIMIT: usize = 25;

/// A caller-supplied limit as a count; zero and negative limits are invalid.
pub fn checked_limit(limit: i64) -> Option<usize> {
    usize::try_from(limit).ok().filter(|&n| n > 0)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationCandidate {
    pub track_id: i64,
    pub score: f64,
}

/// Rank tracks the user has not rated by how far their producers and
/// voicebanks sit above the platform-wide average rating.
///
/// `all_ratings` is the cross-user corpus. Tracks whose id is in
/// `user_rated_track_ids` are never returned, even if they show up in
/// `candidates`.
pub fn recommend(
    all_ratings: &[RatedTrack],
    user_rated_track_ids: &HashSet<i64>,
    candidates: &[TrackAttributes],
    locale: Locale,
    limit: usize,
) -> Vec<RecommendationCandidate> {
    if all_ratings.is_empty() {
        return Vec::new();
    }

    let values: Vec<f64> = all_ratings.iter().map(|r| r.rating).collect();
    let global_average = mean(&values);

    let tokens = TokenRatings::collect(all_ratings, locale);
    let producer_means = token_means(&tokens.producers);
    let voicebank_means = token_means(&tokens.voicebanks);

    let mut scored: Vec<RecommendationCandidate> = candidates
        .iter()
        .filter(|track| !user_rated_track_ids.contains(&track.track_id))
        .map(|track| {
            let producer_delta =
                average_delta(&track.producers(locale), &producer_means, global_average);
            let voicebank_delta =
                average_delta(&track.voicebanks(locale), &voicebank_means, global_average);
            RecommendationCandidate {
                track_id: track.track_id,
                score: PRODUCER_WEIGHT * producer_delta + VOICEBANK_WEIGHT * voicebank_delta,
            }
        })
        .filter(|candidate| candidate.score > MIN_SCORE_THRESHOLD)
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.track_id.cmp(&b.track_id))
    });
    scored.truncate(limit);

    log::debug!(
        "Scored {} candidate tracks, {} above threshold",
        candidates.len(),
        scored.len()
    );
    scored
}

fn token_means(tokens: &BTreeMap<String, Vec<f64>>) -> HashMap<&str, f64> {
    tokens
        .iter()
        .map(|(name, ratings)| (name.as_str(), mean(ratings)))
        .collect()
}

/// Mean of `(token_mean - global_average)` over the tokens that have been
/// rated at least once; `0.0` when none have.
fn average_delta(tokens: &[String], means: &HashMap<&str, f64>, global_average: f64) -> f64 {
    let deltas: Vec<f64> = tokens
        .iter()
        .filter_map(|token| means.get(token.as_str()))
        .map(|token_mean| token_mean - global_average)
        .collect();
    mean(&deltas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::test_support::{rated, rated_by, track};

    #[test]
    fn test_checked_limit_rejects_non_positive() {
        assert_eq!(checked_limit(25), Some(25));
        assert_eq!(checked_limit(1), Some(1));
        assert_eq!(checked_limit(0), None);
        assert_eq!(checked_limit(-3), None);
    }

    fn corpus() -> Vec<RatedTrack> {
        vec![
            rated(1, "A", "X", 9.0),
            rated(2, "B", "Y", 3.0),
            rated(3, "A", "Y", 8.0),
        ]
    }

    fn ids(candidates: &[RecommendationCandidate]) -> Vec<i64> {
        candidates.iter().map(|c| c.track_id).collect()
    }

    #[test]
    fn test_recommend_empty_corpus() {
        let unrated = vec![track(10, "A", "X")];
        let result = recommend(&[], &HashSet::new(), &unrated, Locale::En, 25);
        assert!(result.is_empty());
    }

    #[test]
    fn test_recommend_ranks_by_weighted_affinity() {
        let rated_ids: HashSet<i64> = [1, 2, 3].into_iter().collect();
        let unrated = vec![
            track(4, "A", "X"),
            track(5, "B", "X"),
            track(6, "C", "Z"),
            track(7, "A, B", "X"),
            track(8, "A", "Y"),
        ];

        let result = recommend(&corpus(), &rated_ids, &unrated, Locale::En, 25);
        assert_eq!(ids(&result), vec![4, 8]);

        // global = 20/3; A = 8.5, X = 9
        let global = 20.0 / 3.0;
        let expected = 3.0 * (8.5 - global) + (9.0 - global);
        assert!((result[0].score - expected).abs() < 1e-9);
    }

    #[test]
    fn test_recommend_unknown_attribution_scores_zero_and_is_dropped() {
        let unrated = vec![track(20, "Nobody", "Nothing")];
        let result = recommend(&corpus(), &HashSet::new(), &unrated, Locale::En, 25);
        assert!(result.is_empty());
    }

    #[test]
    fn test_recommend_never_returns_rated_tracks() {
        let rated_ids: HashSet<i64> = [4].into_iter().collect();
        let unrated = vec![track(4, "A", "X"), track(8, "A", "Y")];

        let result = recommend(&corpus(), &rated_ids, &unrated, Locale::En, 25);
        assert_eq!(ids(&result), vec![8]);
    }

    #[test]
    fn test_recommend_respects_limit() {
        let unrated: Vec<TrackAttributes> = (100..140).map(|id| track(id, "A", "X")).collect();
        let result = recommend(&corpus(), &HashSet::new(), &unrated, Locale::En, 5);
        assert_eq!(result.len(), 5);
        // Equal scores fall back to ascending track id
        assert_eq!(ids(&result), vec![100, 101, 102, 103, 104]);
    }

    #[test]
    fn test_recommend_uses_cross_user_baseline() {
        // User 2's ratings still shape the token means for user 1
        let all = vec![
            rated_by(1, 1, "A", "X", 6.0),
            rated_by(2, 2, "B", "X", 10.0),
            rated_by(2, 3, "B", "X", 10.0),
            rated_by(2, 4, "A", "X", 2.0),
        ];
        let user_rated: HashSet<i64> = [1].into_iter().collect();
        let unrated = vec![track(10, "A", "W"), track(11, "B", "W")];

        let result = recommend(&all, &user_rated, &unrated, Locale::En, 25);
        assert_eq!(ids(&result), vec![11]);
    }

    #[test]
    fn test_recommend_is_locale_aware() {
        let mut all = corpus();
        for r in all.iter_mut() {
            if r.track.producer_en == "A" {
                r.track.producer_jp = Some("エー".to_string());
            }
        }
        let mut candidate = track(30, "A", "Q");
        candidate.producer_jp = Some("エー".to_string());

        let en = recommend(&all, &HashSet::new(), &[candidate.clone()], Locale::En, 25);
        let ja = recommend(&all, &HashSet::new(), &[candidate], Locale::Ja, 25);
        assert_eq!(ids(&en), vec![30]);
        assert_eq!(ids(&ja), vec![30]);
        assert!((en[0].score - ja[0].score).abs() < 1e-9);
    }

    #[test]
    fn test_small_voicebank_affinity_is_below_threshold() {
        // global = 5.0; A and X sit 0.25 above it
        let all = vec![rated(1, "A", "X", 5.25), rated(2, "B", "Y", 4.75)];
        let unrated = vec![track(3, "Nobody", "X"), track(4, "A", "Nothing")];

        let result = recommend(&all, &HashSet::new(), &unrated, Locale::En, 25);
        assert_eq!(ids(&result), vec![4]);
        assert!((result[0].score - 0.75).abs() < 1e-9);
    }
}
