use std::collections::BTreeMap;

use serde::Serialize;

use super::{Locale, RatedTrack, mean, round2};

/// Minimum number of ratings a producer or voicebank needs before it can
/// appear among the favorites. Also the prior weight of the global average.
pub const MIN_RATINGS_FOR_FAVORITE: usize = 3;
/// Favorites kept per list.
pub const MAX_FAVORITES: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FavoriteEntry {
    pub name: String,
    /// Raw mean of the entry's ratings (unrounded)
    pub avg_rating: f64,
    /// Average shrunk toward the global average
    pub score: f64,
    pub rating_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingBucket {
    pub rating: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Statistics {
    pub total_ratings: usize,
    /// Mean of all ratings, rounded to two decimals
    pub average_rating: f64,
    pub median_rating: f64,
    pub top_producers: Vec<FavoriteEntry>,
    pub top_voicebanks: Vec<FavoriteEntry>,
    /// Count per distinct rating value, highest rating first
    pub rating_distribution: Vec<RatingBucket>,
}

/// Ratings grouped by attribution token.
///
/// A track credited to several producers contributes its rating to each of
/// them.
#[derive(Debug, Default)]
pub(crate) struct TokenRatings {
    pub producers: BTreeMap<String, Vec<f64>>,
    pub voicebanks: BTreeMap<String, Vec<f64>>,
}

impl TokenRatings {
    pub fn collect(ratings: &[RatedTrack], locale: Locale) -> Self {
        let mut tokens = Self::default();
        for rated in ratings {
            for producer in rated.track.producers(locale) {
                tokens.producers.entry(producer).or_default().push(rated.rating);
            }
            for voicebank in rated.track.voicebanks(locale) {
                tokens
                    .voicebanks
                    .entry(voicebank)
                    .or_default()
                    .push(rated.rating);
            }
        }
        tokens
    }
}

/// Compute rating statistics and favorite producers/voicebanks.
///
/// Total over its input: an empty slice yields [`Statistics::default`].
pub fn aggregate(ratings: &[RatedTrack], locale: Locale) -> Statistics {
    if ratings.is_empty() {
        return Statistics::default();
    }

    let values: Vec<f64> = ratings.iter().map(|r| r.rating).collect();
    let global_average = round2(mean(&values));
    let tokens = TokenRatings::collect(ratings, locale);

    Statistics {
        total_ratings: values.len(),
        average_rating: global_average,
        median_rating: median(&values),
        top_producers: favorites(&tokens.producers, global_average),
        top_voicebanks: favorites(&tokens.voicebanks, global_average),
        rating_distribution: distribution(&values),
    }
}

/// `(v·R + m·C) / (v + m)` where `v` is the entry's rating count, `R` its
/// mean, `C` the global average and `m` [`MIN_RATINGS_FOR_FAVORITE`].
pub fn weighted_score(count: usize, avg_rating: f64, global_average: f64) -> f64 {
    let v = count as f64;
    let m = MIN_RATINGS_FOR_FAVORITE as f64;
    (v * avg_rating + m * global_average) / (v + m)
}

fn favorites(tokens: &BTreeMap<String, Vec<f64>>, global_average: f64) -> Vec<FavoriteEntry> {
    let mut entries: Vec<FavoriteEntry> = tokens
        .iter()
        .filter(|(_, ratings)| ratings.len() >= MIN_RATINGS_FOR_FAVORITE)
        .map(|(name, ratings)| {
            let avg_rating = mean(ratings);
            FavoriteEntry {
                name: name.clone(),
                avg_rating,
                score: weighted_score(ratings.len(), avg_rating, global_average),
                rating_count: ratings.len(),
            }
        })
        .collect();

    // Highest score first, ties by name
    entries.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.name.cmp(&b.name))
    });
    entries.truncate(MAX_FAVORITES);
    entries
}

fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

fn distribution(values: &[f64]) -> Vec<RatingBucket> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| b.total_cmp(a));

    let mut buckets: Vec<RatingBucket> = Vec::new();
    for rating in sorted {
        match buckets.last_mut() {
            Some(bucket) if bucket.rating == rating => bucket.count += 1,
            _ => buckets.push(RatingBucket { rating, count: 1 }),
        }
    }
    buckets
}
