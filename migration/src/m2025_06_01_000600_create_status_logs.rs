//! Migration to create the call_status_log and unit_status_log tables.
//!
//! Append-only audit trails, one row per transition. `changed_by_unit_id`
//! is null for system-attributed changes (auto-close sweep).

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
                    .table(CallStatusLog::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CallStatusLog::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CallStatusLog::CallId).uuid().not_null())
                    .col(ColumnDef::new(CallStatusLog::OldStatus).text().not_null())
                    .col(ColumnDef::new(CallStatusLog::NewStatus).text().not_null())
                    .col(ColumnDef::new(CallStatusLog::ChangedByUnitId).uuid().null())
                    .col(ColumnDef::new(CallStatusLog::Note).text().null())
                    .col(
                        ColumnDef::new(CallStatusLog::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UnitStatusLog::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UnitStatusLog::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UnitStatusLog::UnitId).uuid().not_null())
                    .col(ColumnDef::new(UnitStatusLog::OldStatus).text().not_null())
                    .col(ColumnDef::new(UnitStatusLog::NewStatus).text().not_null())
                    .col(
                        ColumnDef::new(UnitStatusLog::CreatedAt)
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
                "CREATE INDEX IF NOT EXISTS idx_call_status_log_call_created \
                 ON call_status_log (call_id, created_at DESC)"
                    .to_string(),
            ))
            .await?;

        manager
            .get_connection()
            .execute(Statement::from_string(
                manager.get_database_backend(),
                "CREATE INDEX IF NOT EXISTS idx_unit_status_log_unit_created \
                 ON unit_status_log (unit_id, created_at DESC)"
                    .to_string(),
            ))
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_call_status_log_call_created")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_unit_status_log_unit_created")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(CallStatusLog::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(UnitStatusLog::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum CallStatusLog {
    Table,
    Id,
    CallId,
    OldStatus,
    NewStatus,
    ChangedByUnitId,
    Note,
    CreatedAt,
}

#[derive(DeriveIden)]
enum UnitStatusLog {
    Table,
    Id,
    UnitId,
    OldStatus,
    NewStatus,
    CreatedAt,
}
