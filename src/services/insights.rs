use std::collections::HashSet;

use color_eyre::eyre::Context;

use crate::engine::{
    Locale, PageSize, RecommendationCandidate, SnapshotEntry, Statistics, aggregate, recommend,
    snapshot,
};
use crate::ports::rating_store::{RatingStore, TrackListQuery};

/// One page of an ordered track listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackPage {
    pub ids: Vec<i64>,
    pub total_count: usize,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
}

/// Statistics, recommendations and listings computed on top of a
/// [`RatingStore`].
pub struct InsightsService<S: RatingStore> {
    store: S,
}

impl<S: RatingStore> InsightsService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn statistics(&self, user_id: i64, locale: Locale) -> color_eyre::Result<Statistics> {
        let ratings = self
            .store
            .fetch_ratings(Some(user_id))
            .await
            .wrap_err_with(|| format!("Failed to load ratings for user {}", user_id))?;
        log::debug!("Aggregating {} ratings for user {}", ratings.len(), user_id);
        Ok(aggregate(&ratings, locale))
    }

    /// Unrated tracks for `user_id`, scored against every user's ratings.
    pub async fn recommendations(
        &self,
        user_id: i64,
        locale: Locale,
        limit: usize,
    ) -> color_eyre::Result<Vec<RecommendationCandidate>> {
        let all_ratings = self
            .store
            .fetch_ratings(None)
            .await
            .wrap_err("Failed to load ratings")?;
        if all_ratings.is_empty() {
            return Ok(Vec::new());
        }

        let rated: HashSet<i64> = all_ratings
            .iter()
            .filter(|r| r.user_id == user_id)
            .map(|r| r.track.track_id)
            .collect();

        let unrated = self
            .store
            .fetch_unrated_tracks(&rated)
            .await
            .wrap_err("Failed to load unrated tracks")?;

        Ok(recommend(&all_ratings, &rated, &unrated, locale, limit))
    }

    pub async fn snapshot(
        &self,
        query: &TrackListQuery,
        page_size: PageSize,
    ) -> color_eyre::Result<Vec<SnapshotEntry<i64>>> {
        let ids = self.ordered_ids(query).await?;
        Ok(snapshot(&ids, page_size))
    }

    /// The `page`-th window (1-based) over the same ordering the snapshot
    /// uses.
    pub async fn page(
        &self,
        query: &TrackListQuery,
        page: usize,
        page_size: PageSize,
    ) -> color_eyre::Result<TrackPage> {
        let ids = self.ordered_ids(query).await?;
        let total_count = ids.len();
        let page = page.max(1);
        let range = page_size.page_range(page, total_count);

        Ok(TrackPage {
            ids: ids[range].to_vec(),
            total_count,
            page,
            page_size: page_size.per_page(total_count),
            total_pages: page_size.total_pages(total_count),
        })
    }

    async fn ordered_ids(&self, query: &TrackListQuery) -> color_eyre::Result<Vec<i64>> {
        self.store
            .fetch_ordered_track_ids(query)
            .await
            .wrap_err("Failed to load track listing")
    }
}
