use async_graphql::{Context, Object, SimpleObject};
use chrono::{DateTime, Utc};

use crate::http_server::graphql::context::{
    get_app_state, resolve_locale, resolve_page_size, resolve_user,
};
use crate::http_server::graphql::query_builder::{
    PaginationInput, TrackFilterInput, TrackSortInput,
};
use crate::http_server::graphql::{build_list_query, map_track};
use crate::http_server::graphql_error::GraphqlResult;
use crate::services::catalog::CatalogService;
use crate::services::insights::InsightsService;
use crate::services::rating::RatingService;
use crate::services::store::SeaOrmRatingStore;

#[derive(Debug, Clone, SimpleObject)]
pub struct Track {
    pub id: i64,
    pub title: String,
    pub title_jp: Option<String>,
    /// Title in the requested locale
    pub display_title: String,
    pub producer: String,
    pub producer_jp: Option<String>,
    pub voicebank: String,
    pub voicebank_jp: Option<String>,
    /// Producer names split for the requested locale
    pub producers: Vec<String>,
    pub voicebanks: Vec<String>,
    pub published_at: DateTime<Utc>,
    pub link: String,
    pub image_url: Option<String>,
    pub rank: Option<i32>,
    /// The requesting user's rating
    pub rating: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, SimpleObject)]
pub struct TracksResponse {
    pub tracks: Vec<Track>,
    pub total_count: i64,
    pub page: i32,
    pub page_size: i32,
    pub total_pages: i32,
}

#[derive(Debug, Clone, SimpleObject)]
pub struct TrackSnapshotEntry {
    pub id: i64,
    pub page: i32,
}

#[derive(Default)]
pub struct TrackQuery;

#[Object]
impl TrackQuery {
    /// One page of tracks. The same arguments passed to `trackSnapshot`
    /// give the page of every track in this listing.
    #[allow(clippy::too_many_arguments)]
    async fn tracks(
        &self,
        ctx: &Context<'_>,
        user_id: Option<i64>,
        locale: Option<String>,
        filter: Option<TrackFilterInput>,
        sort: Option<Vec<TrackSortInput>>,
        pagination: Option<PaginationInput>,
    ) -> GraphqlResult<TracksResponse> {
        let app_state = get_app_state(ctx)?;
        let user_id = resolve_user(app_state, user_id);
        let locale = resolve_locale(app_state, locale);
        let pagination = pagination.unwrap_or_default();
        let page_size = resolve_page_size(app_state, pagination.page_size);
        let page = pagination.page.unwrap_or(1).max(1) as usize;

        let query = build_list_query(user_id, locale, filter, sort);
        let insights = InsightsService::new(SeaOrmRatingStore::new(app_state.db.clone()));
        let result = insights.page(&query, page, page_size).await?;

        let models = CatalogService::new(app_state.db.clone())
            .get_tracks(&result.ids)
            .await?;
        let ratings = RatingService::new(app_state.db.clone())
            .user_ratings(user_id)
            .await?;

        let tracks = models
            .into_iter()
            .map(|model| {
                let rating = ratings.get(&model.id);
                map_track(model, rating, locale)
            })
            .collect();

        Ok(TracksResponse {
            tracks,
            total_count: result.total_count as i64,
            page: result.page as i32,
            page_size: result.page_size as i32,
            total_pages: result.total_pages as i32,
        })
    }

    /// Page number of every track in the listing described by the
    /// arguments, in listing order.
    async fn track_snapshot(
        &self,
        ctx: &Context<'_>,
        user_id: Option<i64>,
        locale: Option<String>,
        filter: Option<TrackFilterInput>,
        sort: Option<Vec<TrackSortInput>>,
        page_size: Option<i32>,
    ) -> GraphqlResult<Vec<TrackSnapshotEntry>> {
        let app_state = get_app_state(ctx)?;
        let user_id = resolve_user(app_state, user_id);
        let locale = resolve_locale(app_state, locale);
        let page_size = resolve_page_size(app_state, page_size);

        let query = build_list_query(user_id, locale, filter, sort);
        let insights = InsightsService::new(SeaOrmRatingStore::new(app_state.db.clone()));
        let entries = insights.snapshot(&query, page_size).await?;

        Ok(entries
            .into_iter()
            .map(|entry| TrackSnapshotEntry {
                id: entry.id,
                page: entry.page as i32,
            })
            .collect())
    }
}
