//! Migration to create the call_assignments table.
//!
//! Links a unit to a call with a role. Rows are a historical record and are
//! never deleted; the unique (call_id, unit_id) guard enforces at most one
//! assignment per pair.

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
                    .table(CallAssignments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CallAssignments::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CallAssignments::CallId).uuid().not_null())
                    .col(ColumnDef::new(CallAssignments::UnitId).uuid().not_null())
                    .col(ColumnDef::new(CallAssignments::Role).text().not_null())
                    .col(ColumnDef::new(CallAssignments::Status).text().not_null())
                    .col(
                        ColumnDef::new(CallAssignments::AssignedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CallAssignments::ClearedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(CallAssignments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(CallAssignments::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_call_assignments_unit_id")
                            .from(CallAssignments::Table, CallAssignments::UnitId)
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
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_call_assignments_call_unit \
                 ON call_assignments (call_id, unit_id)"
                    .to_string(),
            ))
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_call_assignments_call_id")
                    .table(CallAssignments::Table)
                    .col(CallAssignments::CallId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_call_assignments_call_unit")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(Index::drop().name("idx_call_assignments_call_id").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(CallAssignments::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum CallAssignments {
    Table,
    Id,
    CallId,
    UnitId,
    Role,
    Status,
    AssignedAt,
    ClearedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Units {
    Table,
    Id,
}
