use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use color_eyre::eyre::{Context, OptionExt, eyre};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, Set};

use crate::database::Database;
use crate::entities;

pub struct RatingService {
    db: Arc<Database>,
}

impl RatingService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Create or overwrite the user's rating for a track.
    pub async fn rate(
        &self,
        user_id: i64,
        track_id: i64,
        rating: f64,
        notes: Option<String>,
    ) -> color_eyre::Result<entities::rating::Model> {
        if !rating.is_finite() {
            return Err(eyre!("Rating must be a finite number, got {}", rating));
        }

        entities::track::Entity::find_by_id(track_id)
            .one(&self.db.conn)
            .await
            .wrap_err("Failed to look up track")?
            .ok_or_eyre(format!("Track {} not found", track_id))?;

        log::debug!(
            "Saving rating for track {} by user {}: {}",
            track_id,
            user_id,
            rating
        );

        let now = Utc::now();
        let active = entities::rating::ActiveModel {
            track_id: Set(track_id),
            user_id: Set(user_id),
            rating: Set(rating),
            notes: Set(notes),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        // Single-statement upsert keyed on (track_id, user_id)
        entities::rating::Entity::insert(active)
            .on_conflict(
                sea_orm::sea_query::OnConflict::columns([
                    entities::rating::Column::TrackId,
                    entities::rating::Column::UserId,
                ])
                .update_columns([
                    entities::rating::Column::Rating,
                    entities::rating::Column::Notes,
                    entities::rating::Column::UpdatedAt,
                ])
                .to_owned(),
            )
            .exec_with_returning(&self.db.conn)
            .await
            .wrap_err("Failed to save rating")
    }

    /// Remove the user's rating. Returns whether there was one.
    pub async fn delete(&self, user_id: i64, track_id: i64) -> color_eyre::Result<bool> {
        let result = entities::rating::Entity::delete_many()
            .filter(entities::rating::Column::UserId.eq(user_id))
            .filter(entities::rating::Column::TrackId.eq(track_id))
            .exec(&self.db.conn)
            .await
            .wrap_err("Failed to delete rating")?;
        Ok(result.rows_affected > 0)
    }

    pub async fn get(
        &self,
        user_id: i64,
        track_id: i64,
    ) -> color_eyre::Result<Option<entities::rating::Model>> {
        entities::rating::Entity::find()
            .filter(entities::rating::Column::UserId.eq(user_id))
            .filter(entities::rating::Column::TrackId.eq(track_id))
            .one(&self.db.conn)
            .await
            .wrap_err("Failed to fetch rating")
    }

    /// The user's ratings keyed by track id.
    pub async fn user_ratings(
        &self,
        user_id: i64,
    ) -> color_eyre::Result<HashMap<i64, entities::rating::Model>> {
        let ratings = entities::rating::Entity::find()
            .filter(entities::rating::Column::UserId.eq(user_id))
            .all(&self.db.conn)
            .await
            .wrap_err("Failed to fetch user ratings")?;
        Ok(ratings.into_iter().map(|r| (r.track_id, r)).collect())
    }
}
