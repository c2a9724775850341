use sea_orm::entity::prelude::*;

/// A single attribution token (producer or voicebank name).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "artists")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::track_artist::Entity")]
    TrackArtist,
}

impl Related<super::track::Entity> for Entity {
    fn to() -> RelationDef {
        super::track_artist::Relation::Track.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::track_artist::Relation::Artist.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
