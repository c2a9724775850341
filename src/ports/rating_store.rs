use std::collections::HashSet;

use color_eyre::eyre::Result;

use crate::engine::{Locale, RatedTrack, TrackAttributes};
use crate::http_server::graphql::query_builder::{SortInput, TrackFilters, TrackSortField};

/// Everything needed to reproduce one filtered, sorted track listing.
#[derive(Debug, Clone, Default)]
pub struct TrackListQuery {
    /// Whose ratings drive the rated/unrated/exact-rating filters and the
    /// rating sort key
    pub user_id: i64,
    pub filters: TrackFilters,
    /// First entry has the highest priority; empty means the default sort
    pub sort: Vec<SortInput<TrackSortField>>,
    pub locale: Locale,
}

/// Port trait wrapping the rating/catalog reads the insights engine needs.
///
/// Implementations live in `services::store` (production) or test mocks.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RatingStore: Send + Sync {
    /// All ratings joined with their tracks, optionally scoped to one user.
    async fn fetch_ratings(&self, user_id: Option<i64>) -> Result<Vec<RatedTrack>>;

    async fn fetch_unrated_tracks(&self, excluding: &HashSet<i64>)
    -> Result<Vec<TrackAttributes>>;

    /// Track ids in listing order. The order must be total so that paged
    /// listings and snapshots built from it agree.
    async fn fetch_ordered_track_ids(&self, query: &TrackListQuery) -> Result<Vec<i64>>;
}
