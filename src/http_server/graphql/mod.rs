use std::sync::Arc;

use async_graphql::http::GraphiQLSource;
use async_graphql::{EmptySubscription, MergedObject, Schema};
use axum::response::{Html, IntoResponse};

use crate::engine::Locale;
use crate::entities;
use crate::http_server::state::AppState;
use crate::ports::rating_store::TrackListQuery;

pub(crate) mod context;
pub mod catalog_mutations;
pub mod catalog_queries;
pub mod query_builder;
pub mod rating_mutations;
pub mod statistics_queries;
pub mod track_queries;

use catalog_mutations::CatalogMutation;
use catalog_queries::CatalogQuery;
use query_builder::{SortInput, TrackFilterInput, TrackSortInput};
use rating_mutations::RatingMutation;
use statistics_queries::StatisticsQuery;
use track_queries::{Track, TrackQuery};

pub(crate) fn build_list_query(
    user_id: i64,
    locale: Locale,
    filter: Option<TrackFilterInput>,
    sort: Option<Vec<TrackSortInput>>,
) -> TrackListQuery {
    TrackListQuery {
        user_id,
        filters: filter.unwrap_or_default().into(),
        sort: sort
            .unwrap_or_default()
            .into_iter()
            .map(SortInput::from)
            .collect(),
        locale,
    }
}

pub(crate) fn map_track(
    track: entities::track::Model,
    rating: Option<&entities::rating::Model>,
    locale: Locale,
) -> Track {
    let attributes = crate::engine::TrackAttributes::from(track.clone());

    Track {
        id: track.id,
        display_title: locale
            .pick(&track.title, track.title_jp.as_deref())
            .to_string(),
        producers: attributes.producers(locale),
        voicebanks: attributes.voicebanks(locale),
        title: track.title,
        title_jp: track.title_jp,
        producer: track.producer,
        producer_jp: track.producer_jp,
        voicebank: track.voicebank,
        voicebank_jp: track.voicebank_jp,
        published_at: track.published_at,
        link: track.link,
        image_url: track.image_url,
        rank: track.rank,
        rating: rating.map(|r| r.rating),
        notes: rating.and_then(|r| r.notes.clone()),
    }
}

#[derive(Default, MergedObject)]
pub struct Query(TrackQuery, StatisticsQuery, CatalogQuery);

#[derive(Default, MergedObject)]
pub struct Mutation(RatingMutation, CatalogMutation);

pub type AppSchema = Schema<Query, Mutation, EmptySubscription>;

pub async fn graphql() -> impl IntoResponse {
    Html(GraphiQLSource::build().endpoint("/graphql").finish())
}

pub fn create_schema(app_state: Arc<AppState>) -> AppSchema {
    Schema::build(Query::default(), Mutation::default(), EmptySubscription)
        .data(app_state)
        .finish()
}
