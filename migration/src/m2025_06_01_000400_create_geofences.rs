//! Migration to create the geofences table.
//!
//! Circular alert zones. Read-only from the monitor's perspective.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Geofences::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Geofences::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Geofences::Name).text().not_null())
                    .col(ColumnDef::new(Geofences::Lat).double().not_null())
                    .col(ColumnDef::new(Geofences::Lon).double().not_null())
                    .col(ColumnDef::new(Geofences::RadiusMeters).double().not_null())
                    .col(
                        ColumnDef::new(Geofences::AlertOnEntry)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Geofences::AlertOnExit)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Geofences::Priority).text().not_null())
                    .col(
                        ColumnDef::new(Geofences::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Geofences::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_geofences_active")
                    .table(Geofences::Table)
                    .col(Geofences::Active)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_geofences_active").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Geofences::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Geofences {
    Table,
    Id,
    Name,
    Lat,
    Lon,
    RadiusMeters,
    AlertOnEntry,
    AlertOnExit,
    Priority,
    Active,
    CreatedAt,
}
