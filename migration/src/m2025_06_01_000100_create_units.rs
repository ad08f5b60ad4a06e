//! Migration to create the units table.
//!
//! Units are field officers/vehicles. Position and skill data live directly
//! on the row; `current_call_id` is a back-reference only and carries no
//! foreign key so a call can be archived out from under it.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Units::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Units::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Units::Name).text().not_null())
                    .col(ColumnDef::new(Units::Status).text().not_null())
                    .col(ColumnDef::new(Units::Lat).double().null())
                    .col(ColumnDef::new(Units::Lon).double().null())
                    .col(ColumnDef::new(Units::Skills).json_binary().not_null())
                    .col(
                        ColumnDef::new(Units::IsSupervisor)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Units::CurrentCallId).uuid().null())
                    .col(
                        ColumnDef::new(Units::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Units::UpdatedAt)
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
                    .name("idx_units_status")
                    .table(Units::Table)
                    .col(Units::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_units_status").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Units::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Units {
    Table,
    Id,
    Name,
    Status,
    Lat,
    Lon,
    Skills,
    IsSupervisor,
    CurrentCallId,
    CreatedAt,
    UpdatedAt,
}
