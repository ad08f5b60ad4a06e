//! Migration to create the call_history table.
//!
//! Permanent records produced by the stale-call sweep. The row keeps the
//! original call id so audit logs remain joinable after the live row is
//! deleted.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CallHistory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CallHistory::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CallHistory::IncidentType).text().not_null())
                    .col(ColumnDef::new(CallHistory::LocationText).text().not_null())
                    .col(ColumnDef::new(CallHistory::Lat).double().null())
                    .col(ColumnDef::new(CallHistory::Lon).double().null())
                    .col(ColumnDef::new(CallHistory::FinalStatus).text().not_null())
                    .col(ColumnDef::new(CallHistory::Priority).text().not_null())
                    .col(ColumnDef::new(CallHistory::Source).text().not_null())
                    .col(
                        ColumnDef::new(CallHistory::TimeReceived)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CallHistory::TimeClosed)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(CallHistory::ArchivedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CallHistory::CreatedAt)
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
                    .name("idx_call_history_time_received")
                    .table(CallHistory::Table)
                    .col(CallHistory::TimeReceived)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_call_history_time_received")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(CallHistory::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum CallHistory {
    Table,
    Id,
    IncidentType,
    LocationText,
    Lat,
    Lon,
    FinalStatus,
    Priority,
    Source,
    TimeReceived,
    TimeClosed,
    ArchivedAt,
    CreatedAt,
}
