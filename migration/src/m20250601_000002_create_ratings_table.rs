use sea_orm_migration::prelude::*;

use crate::m20250601_000001_create_catalog_tables::Track;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Rating::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Rating::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Rating::TrackId).integer().not_null())
                    .col(ColumnDef::new(Rating::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Rating::Rating).double().not_null())
                    .col(ColumnDef::new(Rating::Notes).string())
                    .col(ColumnDef::new(Rating::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Rating::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ratings_track_id")
                            .from(Rating::Table, Rating::TrackId)
                            .to(Track::Table, Track::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One rating per (track, user)
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_ratings_track_user")
                    .table(Rating::Table)
                    .col(Rating::TrackId)
                    .col(Rating::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_ratings_user_id")
                    .table(Rating::Table)
                    .col(Rating::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Rating::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Rating {
    #[sea_orm(iden = "ratings")]
    Table,
    Id,
    TrackId,
    UserId,
    Rating,
    Notes,
    CreatedAt,
    UpdatedAt,
}
