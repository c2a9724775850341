use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use color_eyre::eyre::Context;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};

use crate::database::Database;
use crate::engine::{Locale, split};
use crate::entities;

/// How long after the last import the catalog counts as outdated.
const CATALOG_MAX_AGE_HOURS: i64 = 24;

#[derive(async_graphql::Enum, clap::ValueEnum, Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum CreditRole {
    Producer,
    Voicebank,
}

impl CreditRole {
    pub const ALL: [CreditRole; 2] = [CreditRole::Producer, CreditRole::Voicebank];

    pub fn as_str(self) -> &'static str {
        match self {
            CreditRole::Producer => "producer",
            CreditRole::Voicebank => "voicebank",
        }
    }
}

/// One track as delivered by a catalog import.
#[derive(Debug, Clone)]
pub struct CatalogTrack {
    pub title: String,
    pub title_jp: Option<String>,
    pub producer: String,
    pub producer_jp: Option<String>,
    pub voicebank: String,
    pub voicebank_jp: Option<String>,
    pub published_at: DateTime<Utc>,
    /// Natural key of the track
    pub link: String,
    pub image_url: Option<String>,
    pub rank: Option<i32>,
}

impl CatalogTrack {
    fn field(&self, role: CreditRole) -> (&str, Option<&str>) {
        match role {
            CreditRole::Producer => (&self.producer, self.producer_jp.as_deref()),
            CreditRole::Voicebank => (&self.voicebank, self.voicebank_jp.as_deref()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertSummary {
    pub created: usize,
    pub updated: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogStatus {
    pub last_update: Option<DateTime<Utc>>,
    /// Whole days since the last update
    pub age_days: Option<i64>,
    pub is_outdated: bool,
}

impl CatalogStatus {
    pub fn at(last_update: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        match last_update {
            Some(last) => {
                let age = now.signed_duration_since(last);
                Self {
                    last_update: Some(last),
                    age_days: Some(age.num_days()),
                    is_outdated: age > Duration::hours(CATALOG_MAX_AGE_HOURS),
                }
            }
            None => Self {
                last_update: None,
                age_days: None,
                is_outdated: true,
            },
        }
    }
}

pub struct CatalogService {
    db: Arc<Database>,
}

impl CatalogService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert or update tracks by link and rebuild their credits.
    ///
    /// With `replace_chart` every existing rank is cleared first, so the
    /// imported ranks become the whole chart.
    pub async fn upsert_tracks(
        &self,
        tracks: Vec<CatalogTrack>,
        replace_chart: bool,
    ) -> color_eyre::Result<UpsertSummary> {
        let txn = self
            .db
            .conn
            .begin()
            .await
            .wrap_err("Failed to start catalog transaction")?;

        if replace_chart {
            let reset = entities::track::Entity::update_many()
                .col_expr(entities::track::Column::Rank, Expr::value(Option::<i32>::None))
                .exec(&txn)
                .await
                .wrap_err("Failed to reset chart ranks")?;
            log::debug!("Cleared rank on {} tracks", reset.rows_affected);
        }

        let now = Utc::now();
        let mut summary = UpsertSummary::default();

        for track in tracks {
            let existing = entities::track::Entity::find()
                .filter(entities::track::Column::Link.eq(&track.link))
                .one(&txn)
                .await
                .wrap_err_with(|| format!("Failed to look up track {}", track.link))?;

            let track_id = match existing {
                Some(model) => {
                    let id = model.id;
                    let mut active: entities::track::ActiveModel = model.into();
                    active.title = Set(track.title.clone());
                    active.title_jp = Set(track.title_jp.clone());
                    active.producer = Set(track.producer.clone());
                    active.producer_jp = Set(track.producer_jp.clone());
                    active.voicebank = Set(track.voicebank.clone());
                    active.voicebank_jp = Set(track.voicebank_jp.clone());
                    active.published_at = Set(track.published_at);
                    active.image_url = Set(track.image_url.clone());
                    active.rank = Set(track.rank);
                    active.updated_at = Set(now);
                    active
                        .update(&txn)
                        .await
                        .wrap_err_with(|| format!("Failed to update track {}", track.link))?;
                    summary.updated += 1;
                    id
                }
                None => {
                    let inserted = entities::track::ActiveModel {
                        title: Set(track.title.clone()),
                        title_jp: Set(track.title_jp.clone()),
                        producer: Set(track.producer.clone()),
                        producer_jp: Set(track.producer_jp.clone()),
                        voicebank: Set(track.voicebank.clone()),
                        voicebank_jp: Set(track.voicebank_jp.clone()),
                        published_at: Set(track.published_at),
                        link: Set(track.link.clone()),
                        image_url: Set(track.image_url.clone()),
                        rank: Set(track.rank),
                        created_at: Set(now),
                        updated_at: Set(now),
                        ..Default::default()
                    }
                    .insert(&txn)
                    .await
                    .wrap_err_with(|| format!("Failed to insert track {}", track.link))?;
                    summary.created += 1;
                    inserted.id
                }
            };

            replace_credits(&txn, track_id, &track).await?;
        }

        entities::catalog_update::ActiveModel {
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .wrap_err("Failed to record catalog update")?;

        txn.commit()
            .await
            .wrap_err("Failed to commit catalog transaction")?;

        log::info!(
            "Catalog updated: {} created, {} updated",
            summary.created,
            summary.updated
        );
        Ok(summary)
    }

    pub async fn last_update(&self) -> color_eyre::Result<Option<DateTime<Utc>>> {
        let latest = entities::catalog_update::Entity::find()
            .order_by_desc(entities::catalog_update::Column::UpdatedAt)
            .one(&self.db.conn)
            .await
            .wrap_err("Failed to fetch last catalog update")?;
        Ok(latest.map(|u| u.updated_at))
    }

    pub async fn status(&self) -> color_eyre::Result<CatalogStatus> {
        Ok(CatalogStatus::at(self.last_update().await?, Utc::now()))
    }

    /// Distinct credited names for `role` in `locale`, ascending.
    pub async fn credits(
        &self,
        role: CreditRole,
        locale: Locale,
    ) -> color_eyre::Result<Vec<String>> {
        let artist_ids: HashSet<i64> = entities::track_artist::Entity::find()
            .filter(entities::track_artist::Column::Role.eq(role.as_str()))
            .filter(entities::track_artist::Column::Locale.eq(locale.code()))
            .all(&self.db.conn)
            .await
            .wrap_err("Failed to fetch credits")?
            .into_iter()
            .map(|credit| credit.artist_id)
            .collect();

        if artist_ids.is_empty() {
            return Ok(Vec::new());
        }

        let artists = entities::artist::Entity::find()
            .filter(entities::artist::Column::Id.is_in(artist_ids))
            .order_by_asc(entities::artist::Column::Name)
            .all(&self.db.conn)
            .await
            .wrap_err("Failed to fetch credited artists")?;

        Ok(artists.into_iter().map(|a| a.name).collect())
    }

    /// Load tracks by id, keeping the order of `ids` and skipping unknown ids.
    pub async fn get_tracks(&self, ids: &[i64]) -> color_eyre::Result<Vec<entities::track::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut found: HashMap<i64, entities::track::Model> =
            entities::track::Entity::find()
                .filter(entities::track::Column::Id.is_in(ids.iter().copied()))
                .all(&self.db.conn)
                .await
                .wrap_err("Failed to fetch tracks")?
                .into_iter()
                .map(|t| (t.id, t))
                .collect();

        Ok(ids.iter().filter_map(|id| found.remove(id)).collect())
    }
}

/// Rebuild the credit rows of one track for every role and locale.
async fn replace_credits<C: ConnectionTrait>(
    conn: &C,
    track_id: i64,
    track: &CatalogTrack,
) -> color_eyre::Result<()> {
    entities::track_artist::Entity::delete_many()
        .filter(entities::track_artist::Column::TrackId.eq(track_id))
        .exec(conn)
        .await
        .wrap_err_with(|| format!("Failed to clear credits for track {}", track_id))?;

    for role in CreditRole::ALL {
        let (field_en, field_jp) = track.field(role);
        for locale in Locale::ALL {
            for (position, name) in split(field_en, field_jp, locale).into_iter().enumerate() {
                let artist_id = upsert_artist(conn, &name).await?;
                entities::track_artist::ActiveModel {
                    track_id: Set(track_id),
                    artist_id: Set(artist_id),
                    role: Set(role.as_str().to_string()),
                    locale: Set(locale.code().to_string()),
                    position: Set(position as i32),
                }
                .insert(conn)
                .await
                .wrap_err_with(|| {
                    format!("Failed to credit '{}' on track {}", name, track_id)
                })?;
            }
        }
    }

    Ok(())
}

async fn upsert_artist<C: ConnectionTrait>(conn: &C, name: &str) -> color_eyre::Result<i64> {
    if let Some(artist) = entities::artist::Entity::find()
        .filter(entities::artist::Column::Name.eq(name))
        .one(conn)
        .await
        .wrap_err("Failed to query artist by name")?
    {
        return Ok(artist.id);
    }

    log::debug!("Creating new artist: '{}'", name);
    let artist = entities::artist::ActiveModel {
        name: Set(name.to_string()),
        ..Default::default()
    }
    .insert(conn)
    .await
    .wrap_err_with(|| format!("Failed to insert artist '{}'", name))?;
    Ok(artist.id)
}
