//! Rating aggregation and recommendation core.
//!
//! Everything in here is a pure function over an in-memory snapshot of
//! track and rating facts. Loading those facts is the job of a
//! [`RatingStore`](crate::ports::rating_store::RatingStore).

pub mod aggregator;
pub mod attribution;
pub mod recommender;
pub mod snapshot;

use chrono::{DateTime, Utc};

pub use aggregator::{FavoriteEntry, Statistics, aggregate};
pub use attribution::{Locale, split};
pub use recommender::{RecommendationCandidate, recommend};
pub use snapshot::{PageSize, SnapshotEntry, snapshot};

/// Attribution-bearing view of a catalog track.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackAttributes {
    pub track_id: i64,
    /// Comma-joined producer names
    pub producer_en: String,
    /// Localized override, `None` or empty when there is none
    pub producer_jp: Option<String>,
    pub voicebank_en: String,
    pub voicebank_jp: Option<String>,
    pub published_at: DateTime<Utc>,
    pub rank: Option<i32>,
}

impl TrackAttributes {
    pub fn producers(&self, locale: Locale) -> Vec<String> {
        split(&self.producer_en, self.producer_jp.as_deref(), locale)
    }

    pub fn voicebanks(&self, locale: Locale) -> Vec<String> {
        split(&self.voicebank_en, self.voicebank_jp.as_deref(), locale)
    }
}

/// A single rating fact joined with the rated track.
#[derive(Debug, Clone, PartialEq)]
pub struct RatedTrack {
    pub track: TrackAttributes,
    pub user_id: i64,
    pub rating: f64,
    pub notes: Option<String>,
}

/// Arithmetic mean, `0.0` for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Round to two decimal places for display.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
