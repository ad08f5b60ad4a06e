//! Migration to create the dispatch_calls table.
//!
//! Live operational calls. Lifecycle timestamps are nullable and stamped
//! exactly once by the state machine; the retention sweeps are the only
//! other writers (archive flags and auto-close).

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
                    .table(DispatchCalls::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DispatchCalls::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DispatchCalls::IncidentType).text().not_null())
                    .col(ColumnDef::new(DispatchCalls::LocationText).text().not_null())
                    .col(ColumnDef::new(DispatchCalls::Lat).double().null())
                    .col(ColumnDef::new(DispatchCalls::Lon).double().null())
                    .col(ColumnDef::new(DispatchCalls::Status).text().not_null())
                    .col(ColumnDef::new(DispatchCalls::Priority).text().not_null())
                    .col(ColumnDef::new(DispatchCalls::Source).text().not_null())
                    .col(ColumnDef::new(DispatchCalls::ExternalRef).text().null())
                    .col(
                        ColumnDef::new(DispatchCalls::TimeReceived)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DispatchCalls::TimeEnroute)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(DispatchCalls::TimeOnScene)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(DispatchCalls::TimeCleared)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(DispatchCalls::TimeClosed)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(DispatchCalls::Archived)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(DispatchCalls::ArchivedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(DispatchCalls::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(DispatchCalls::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Retention sweeps scan by source/archived/time_received; the active
        // board filters by status.
        manager
            .get_connection()
            .execute(Statement::from_string(
                manager.get_database_backend(),
                "CREATE INDEX IF NOT EXISTS idx_dispatch_calls_archived_received \
                 ON dispatch_calls (archived, time_received)"
                    .to_string(),
            ))
            .await?;

        manager
            .get_connection()
            .execute(Statement::from_string(
                manager.get_database_backend(),
                "CREATE INDEX IF NOT EXISTS idx_dispatch_calls_source_archived \
                 ON dispatch_calls (source, archived)"
                    .to_string(),
            ))
            .await?;

        manager
            .get_connection()
            .execute(Statement::from_string(
                manager.get_database_backend(),
                "CREATE INDEX IF NOT EXISTS idx_dispatch_calls_status \
                 ON dispatch_calls (status)"
                    .to_string(),
            ))
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_dispatch_calls_source_external_ref")
                    .table(DispatchCalls::Table)
                    .col(DispatchCalls::Source)
                    .col(DispatchCalls::ExternalRef)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_dispatch_calls_archived_received")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_dispatch_calls_source_archived")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(Index::drop().name("idx_dispatch_calls_status").to_owned())
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_dispatch_calls_source_external_ref")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(DispatchCalls::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum DispatchCalls {
    Table,
    Id,
    IncidentType,
    LocationText,
    Lat,
    Lon,
    Status,
    Priority,
    Source,
    ExternalRef,
    TimeReceived,
    TimeEnroute,
    TimeOnScene,
    TimeCleared,
    TimeClosed,
    Archived,
    ArchivedAt,
    CreatedAt,
    UpdatedAt,
}
