//! Migration to create the unit_location_history table.
//!
//! Append-only breadcrumb samples. The geofence monitor reads the newest
//! prior sample per unit, and the retention sweep prunes past the horizon,
//! so both access paths get a (unit_id, recorded_at) index.

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
                    .table(UnitLocationHistory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UnitLocationHistory::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UnitLocationHistory::UnitId).uuid().not_null())
                    .col(ColumnDef::new(UnitLocationHistory::Lat).double().not_null())
                    .col(ColumnDef::new(UnitLocationHistory::Lon).double().not_null())
                    .col(ColumnDef::new(UnitLocationHistory::SpeedMph).double().null())
                    .col(
                        ColumnDef::new(UnitLocationHistory::RecordedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_unit_location_history_unit_id")
                            .from(UnitLocationHistory::Table, UnitLocationHistory::UnitId)
                            .to(Units::Table, Units::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .get_connection()
            .execute(Statement::from_string(
                manager.get_database_backend(),
                "CREATE INDEX IF NOT EXISTS idx_unit_location_history_unit_recorded \
                 ON unit_location_history (unit_id, recorded_at DESC)"
                    .to_string(),
            ))
            .await?;

        manager
            .get_connection()
            .execute(Statement::from_string(
                manager.get_database_backend(),
                "CREATE INDEX IF NOT EXISTS idx_unit_location_history_recorded \
                 ON unit_location_history (recorded_at)"
                    .to_string(),
            ))
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_unit_location_history_unit_recorded")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_unit_location_history_recorded")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(UnitLocationHistory::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum UnitLocationHistory {
    Table,
    Id,
    UnitId,
    Lat,
    Lon,
    SpeedMph,
    RecordedAt,
}

#[derive(DeriveIden)]
enum Units {
    Table,
    Id,
}
