use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use sea_orm::{ActiveModelTrait, ConnectOptions, Database as SeaDatabase, Set};

use crate::database::Database;
use crate::entities;

pub async fn test_db() -> Arc<Database> {
    // A single connection so every query sees the same in-memory database
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).min_connections(1).sqlx_logging(false);

    let conn = SeaDatabase::connect(opt).await.unwrap();
    Arc::new(Database::from_connection(conn).await.unwrap())
}

pub fn day(n: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, n, 12, 0, 0).unwrap()
}

/// Minimal catalog row for storage tests. Credits are not written here;
/// go through `CatalogService::upsert_tracks` when a test needs them.
pub struct TrackSeed<'a> {
    pub title: &'a str,
    pub producer: &'a str,
    pub voicebank: &'a str,
    pub rank: Option<i32>,
    pub published_day: u32,
}

pub async fn insert_track(db: &Database, seed: TrackSeed<'_>) -> entities::track::Model {
    let now = Utc::now();
    entities::track::ActiveModel {
        title: Set(seed.title.to_string()),
        title_jp: Set(None),
        producer: Set(seed.producer.to_string()),
        producer_jp: Set(None),
        voicebank: Set(seed.voicebank.to_string()),
        voicebank_jp: Set(None),
        published_at: Set(day(seed.published_day)),
        link: Set(format!("https://example.invalid/{}", seed.title)),
        image_url: Set(None),
        rank: Set(seed.rank),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&db.conn)
    .await
    .unwrap()
}

pub async fn insert_rating(
    db: &Database,
    user_id: i64,
    track_id: i64,
    rating: f64,
) -> entities::rating::Model {
    let now = Utc::now();
    entities::rating::ActiveModel {
        track_id: Set(track_id),
        user_id: Set(user_id),
        rating: Set(rating),
        notes: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&db.conn)
    .await
    .unwrap()
}
