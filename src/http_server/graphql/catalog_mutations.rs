use async_graphql::{Context, InputObject, Object, SimpleObject};
use chrono::{DateTime, Utc};

use crate::http_server::graphql::context::get_app_state;
use crate::http_server::graphql_error::GraphqlResult;
use crate::services::catalog::{CatalogService, CatalogTrack};

#[derive(Debug, Clone, InputObject)]
pub struct CatalogTrackInput {
    pub title: String,
    pub title_jp: Option<String>,
    /// Comma-joined producer names
    pub producer: String,
    pub producer_jp: Option<String>,
    /// Comma-joined voicebank names
    pub voicebank: String,
    pub voicebank_jp: Option<String>,
    pub published_at: DateTime<Utc>,
    pub link: String,
    pub image_url: Option<String>,
    pub rank: Option<i32>,
}

impl From<CatalogTrackInput> for CatalogTrack {
    fn from(input: CatalogTrackInput) -> Self {
        Self {
            title: input.title,
            title_jp: input.title_jp,
            producer: input.producer,
            producer_jp: input.producer_jp,
            voicebank: input.voicebank,
            voicebank_jp: input.voicebank_jp,
            published_at: input.published_at,
            link: input.link,
            image_url: input.image_url,
            rank: input.rank,
        }
    }
}

#[derive(Debug, Clone, SimpleObject)]
pub struct UpsertTracksResponse {
    pub created: i32,
    pub updated: i32,
}

#[derive(Default)]
pub struct CatalogMutation;

#[Object]
impl CatalogMutation {
    /// Import tracks, matched by link. With `replaceChart` tracks missing
    /// from this import lose their rank.
    async fn upsert_tracks(
        &self,
        ctx: &Context<'_>,
        tracks: Vec<CatalogTrackInput>,
        replace_chart: Option<bool>,
    ) -> GraphqlResult<UpsertTracksResponse> {
        let db = &get_app_state(ctx)?.db;
        let service = CatalogService::new(db.clone());
        let summary = service
            .upsert_tracks(
                tracks.into_iter().map(Into::into).collect(),
                replace_chart.unwrap_or(false),
            )
            .await?;

        Ok(UpsertTracksResponse {
            created: summary.created as i32,
            updated: summary.updated as i32,
        })
    }
}
