use async_graphql::{Context, Object, SimpleObject};
use chrono::{DateTime, Utc};

use crate::http_server::graphql::context::{get_app_state, resolve_user};
use crate::http_server::graphql_error::GraphqlResult;
use crate::services::rating::RatingService;

#[derive(Debug, Clone, SimpleObject)]
pub struct Rating {
    pub id: i64,
    pub track_id: i64,
    pub user_id: i64,
    pub rating: f64,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Default)]
pub struct RatingMutation;

#[Object]
impl RatingMutation {
    /// Rate a track, replacing any earlier rating by the same user.
    async fn rate_track(
        &self,
        ctx: &Context<'_>,
        user_id: Option<i64>,
        track_id: i64,
        rating: f64,
        notes: Option<String>,
    ) -> GraphqlResult<Rating> {
        let app_state = get_app_state(ctx)?;
        let user_id = resolve_user(app_state, user_id);
        let service = RatingService::new(app_state.db.clone());
        let model = service.rate(user_id, track_id, rating, notes).await?;

        Ok(Rating {
            id: model.id,
            track_id: model.track_id,
            user_id: model.user_id,
            rating: model.rating,
            notes: model.notes,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }

    /// Returns false when there was nothing to delete.
    async fn delete_rating(
        &self,
        ctx: &Context<'_>,
        user_id: Option<i64>,
        track_id: i64,
    ) -> GraphqlResult<bool> {
        let app_state = get_app_state(ctx)?;
        let user_id = resolve_user(app_state, user_id);
        let service = RatingService::new(app_state.db.clone());
        Ok(service.delete(user_id, track_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::http_server::graphql::tests::{execute, test_schema};
    use crate::test_utils::{TrackSeed, insert_track};

    #[tokio::test]
    async fn test_rate_and_delete() {
        let (schema, app_state) = test_schema().await;
        insert_track(
            &app_state.db,
            TrackSeed {
                title: "Melt",
                producer: "ryo",
                voicebank: "Miku",
                rank: Some(1),
                published_day: 1,
            },
        )
        .await;

        let data = execute(
            &schema,
            r#"mutation { rateTrack(trackId: 1, rating: 9.5, notes: "classic") { trackId userId rating notes } }"#,
        )
        .await;
        assert_eq!(
            data["rateTrack"],
            json!({ "trackId": 1, "userId": 1, "rating": 9.5, "notes": "classic" })
        );

        let data = execute(
            &schema,
            "mutation { rateTrack(trackId: 1, rating: 7) { rating notes } }",
        )
        .await;
        assert_eq!(data["rateTrack"], json!({ "rating": 7.0, "notes": null }));

        let data = execute(&schema, "mutation { deleteRating(trackId: 1) }").await;
        assert_eq!(data["deleteRating"], json!(true));
        let data = execute(&schema, "mutation { deleteRating(trackId: 1) }").await;
        assert_eq!(data["deleteRating"], json!(false));
    }

    #[tokio::test]
    async fn test_rate_unknown_track_is_an_error() {
        let (schema, _) = test_schema().await;
        let response = schema
            .execute("mutation { rateTrack(trackId: 42, rating: 5) { id } }")
            .await;
        assert_eq!(response.errors.len(), 1);
        assert!(response.errors[0].message.contains("Track 42 not found"));
    }
}
