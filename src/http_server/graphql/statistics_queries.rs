use std::collections::HashMap;

use async_graphql::{Context, Object, SimpleObject};

use crate::engine::{FavoriteEntry, Statistics, round2};
use crate::http_server::graphql::context::{
    get_app_state, resolve_limit, resolve_locale, resolve_user,
};
use crate::http_server::graphql::map_track;
use crate::http_server::graphql::track_queries::Track;
use crate::http_server::graphql_error::GraphqlResult;
use crate::services::catalog::CatalogService;
use crate::services::insights::InsightsService;
use crate::services::store::SeaOrmRatingStore;

#[derive(Debug, Clone, SimpleObject)]
pub struct Favorite {
    pub name: String,
    pub avg_rating: f64,
    pub score: f64,
    pub rating_count: i32,
}

impl From<FavoriteEntry> for Favorite {
    fn from(entry: FavoriteEntry) -> Self {
        Self {
            name: entry.name,
            avg_rating: round2(entry.avg_rating),
            score: round2(entry.score),
            rating_count: entry.rating_count as i32,
        }
    }
}

#[derive(Debug, Clone, SimpleObject)]
pub struct RatingCount {
    pub rating: f64,
    pub count: i32,
}

#[derive(Debug, Clone, SimpleObject)]
pub struct StatisticsResponse {
    pub total_ratings: i32,
    pub average_rating: f64,
    pub median_rating: f64,
    pub top_producers: Vec<Favorite>,
    pub top_voicebanks: Vec<Favorite>,
    pub rating_distribution: Vec<RatingCount>,
}

impl From<Statistics> for StatisticsResponse {
    fn from(stats: Statistics) -> Self {
        Self {
            total_ratings: stats.total_ratings as i32,
            average_rating: stats.average_rating,
            median_rating: stats.median_rating,
            top_producers: stats.top_producers.into_iter().map(Into::into).collect(),
            top_voicebanks: stats.top_voicebanks.into_iter().map(Into::into).collect(),
            rating_distribution: stats
                .rating_distribution
                .into_iter()
                .map(|bucket| RatingCount {
                    rating: bucket.rating,
                    count: bucket.count as i32,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, SimpleObject)]
pub struct Recommendation {
    pub score: f64,
    pub track: Track,
}

#[derive(Default)]
pub struct StatisticsQuery;

#[Object]
impl StatisticsQuery {
    async fn statistics(
        &self,
        ctx: &Context<'_>,
        user_id: Option<i64>,
        locale: Option<String>,
    ) -> GraphqlResult<StatisticsResponse> {
        let app_state = get_app_state(ctx)?;
        let user_id = resolve_user(app_state, user_id);
        let locale = resolve_locale(app_state, locale);

        let insights = InsightsService::new(SeaOrmRatingStore::new(app_state.db.clone()));
        let stats = insights.statistics(user_id, locale).await?;
        Ok(stats.into())
    }

    /// Unrated tracks whose producers and voicebanks the ratings favor,
    /// best first.
    async fn recommendations(
        &self,
        ctx: &Context<'_>,
        user_id: Option<i64>,
        locale: Option<String>,
        limit: Option<i32>,
    ) -> GraphqlResult<Vec<Recommendation>> {
        let app_state = get_app_state(ctx)?;
        let user_id = resolve_user(app_state, user_id);
        let locale = resolve_locale(app_state, locale);
        let limit = resolve_limit(app_state, limit)?;

        let insights = InsightsService::new(SeaOrmRatingStore::new(app_state.db.clone()));
        let candidates = insights.recommendations(user_id, locale, limit).await?;

        let ids: Vec<i64> = candidates.iter().map(|c| c.track_id).collect();
        let mut tracks: HashMap<i64, _> = CatalogService::new(app_state.db.clone())
            .get_tracks(&ids)
            .await?
            .into_iter()
            .map(|track| (track.id, track))
            .collect();

        Ok(candidates
            .into_iter()
            .filter_map(|candidate| {
                tracks.remove(&candidate.track_id).map(|track| Recommendation {
                    score: round2(candidate.score),
                    track: map_track(track, None, locale),
                })
            })
            .collect())
    }
}
