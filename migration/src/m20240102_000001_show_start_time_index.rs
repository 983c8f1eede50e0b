use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_shows_start_time")
                    .table("shows")
                    .col("start_time")
                    .to_owned(),
            )
            .await?;

        // An artist can only be booked once per start instant. Racing booking
        // attempts are refused here even if both passed the conflict check.
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_shows_artist_id_start_time")
                    .table("shows")
                    .col("artist_id")
                    .col("start_time")
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_shows_artist_id_start_time")
                    .table("shows")
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_shows_start_time")
                    .table("shows")
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}
