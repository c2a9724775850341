use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "tracks")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub title: String,
    pub title_jp: Option<String>,
    /// Comma-joined producer names
    pub producer: String,
    pub producer_jp: Option<String>,
    /// Comma-joined voicebank names
    pub voicebank: String,
    pub voicebank_jp: Option<String>,
    pub published_at: DateTime<Utc>,
    #[sea_orm(unique)]
    pub link: String,
    pub image_url: Option<String>,
    /// Chart rank, `None` when the track is off the chart
    pub rank: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::rating::Entity")]
    Rating,
    #[sea_orm(has_many = "super::track_artist::Entity")]
    TrackArtist,
}

impl Related<super::rating::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Rating.def()
    }
}

impl Related<super::artist::Entity> for Entity {
    fn to() -> RelationDef {
        super::track_artist::Relation::Artist.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::track_artist::Relation::Track.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
