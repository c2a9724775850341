use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create tracks table
        manager
            .create_table(
                Table::create()
                    .table(Track::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Track::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Track::Title).string().not_null())
                    .col(ColumnDef::new(Track::TitleJp).string())
                    .col(ColumnDef::new(Track::Producer).string().not_null())
                    .col(ColumnDef::new(Track::ProducerJp).string())
                    .col(ColumnDef::new(Track::Voicebank).string().not_null())
                    .col(ColumnDef::new(Track::VoicebankJp).string())
                    .col(ColumnDef::new(Track::PublishedAt).timestamp().not_null())
                    .col(ColumnDef::new(Track::Link).string().not_null().unique_key())
                    .col(ColumnDef::new(Track::ImageUrl).string())
                    .col(ColumnDef::new(Track::Rank).integer())
                    .col(ColumnDef::new(Track::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Track::UpdatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        // Create artists table (normalized attribution tokens)
        manager
            .create_table(
                Table::create()
                    .table(Artist::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Artist::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Artist::Name).string().not_null().unique_key())
                    .to_owned(),
            )
            .await?;

        // Create track_artists junction table
        manager
            .create_table(
                Table::create()
                    .table(TrackArtist::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(TrackArtist::TrackId).integer().not_null())
                    .col(ColumnDef::new(TrackArtist::ArtistId).integer().not_null())
                    .col(ColumnDef::new(TrackArtist::Role).string().not_null())
                    .col(ColumnDef::new(TrackArtist::Locale).string().not_null())
                    .col(ColumnDef::new(TrackArtist::Position).integer().not_null())
                    .primary_key(
                        Index::create()
                            .col(TrackArtist::TrackId)
                            .col(TrackArtist::ArtistId)
                            .col(TrackArtist::Role)
                            .col(TrackArtist::Locale),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_track_artists_track_id")
                            .from(TrackArtist::Table, TrackArtist::TrackId)
                            .to(Track::Table, Track::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_track_artists_artist_id")
                            .from(TrackArtist::Table, TrackArtist::ArtistId)
                            .to(Artist::Table, Artist::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_tracks_rank")
                    .table(Track::Table)
                    .col(Track::Rank)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_track_artists_artist_id")
                    .table(TrackArtist::Table)
                    .col(TrackArtist::ArtistId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop tables in reverse order
        manager
            .drop_table(Table::drop().table(TrackArtist::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Artist::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Track::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
pub(crate) enum Track {
    #[sea_orm(iden = "tracks")]
    Table,
    Id,
    Title,
    TitleJp,
    Producer,
    ProducerJp,
    Voicebank,
    VoicebankJp,
    PublishedAt,
    Link,
    ImageUrl,
    Rank,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Artist {
    #[sea_orm(iden = "artists")]
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
enum TrackArtist {
    #[sea_orm(iden = "track_artists")]
    Table,
    TrackId,
    ArtistId,
    Role,
    Locale,
    Position,
}
