//! Migration to create the geofence_events table.
//!
//! Append-only entry/exit detections. Names are denormalized onto the row so
//! the event stays readable after a fence or unit is retired.

use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Statement;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(GeofenceEvents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GeofenceEvents::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(GeofenceEvents::EventType).text().not_null())
                    .col(ColumnDef::new(GeofenceEvents::GeofenceId).uuid().not_null())
                    .col(ColumnDef::new(GeofenceEvents::GeofenceName).text().not_null())
                    .col(ColumnDef::new(GeofenceEvents::UnitId).uuid().not_null())
                    .col(ColumnDef::new(GeofenceEvents::UnitName).text().not_null())
                    .col(ColumnDef::new(GeofenceEvents::Lat).double().not_null())
                    .col(ColumnDef::new(GeofenceEvents::Lon).double().not_null())
                    .col(
                        ColumnDef::new(GeofenceEvents::OccurredAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GeofenceEvents::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .get_connection()
            .execute(Statement::from_string(
                manager.get_database_backend(),
                "CREATE INDEX IF NOT EXISTS idx_geofence_events_fence_occurred \
                 ON geofence_events (geofence_id, occurred_at DESC)"
                    .to_string(),
            ))
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_geofence_events_fence_occurred")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(GeofenceEvents::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum GeofenceEvents {
    Table,
    Id,
    EventType,
    GeofenceId,
    GeofenceName,
    UnitId,
    UnitName,
    Lat,
    Lon,
    OccurredAt,
    CreatedAt,
}
