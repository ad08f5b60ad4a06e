//! Database migrations for the dispatch coordination service.
//!
//! All schema changes go through SeaORM Migration so the same DDL runs
//! against Postgres in deployment and in-memory SQLite in tests.

pub use sea_orm_migration::prelude::*;

mod m2025_06_01_000100_create_units;
mod m2025_06_01_000200_create_dispatch_calls;
mod m2025_06_01_000300_create_call_assignments;
mod m2025_06_01_000400_create_geofences;
mod m2025_06_01_000500_create_unit_location_history;
mod m2025_06_01_000600_create_status_logs;
mod m2025_06_01_000700_create_geofence_events;
mod m2025_06_01_000800_create_call_history;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2025_06_01_000100_create_units::Migration),
            Box::new(m2025_06_01_000200_create_dispatch_calls::Migration),
            Box::new(m2025_06_01_000300_create_call_assignments::Migration),
            Box::new(m2025_06_01_000400_create_geofences::Migration),
            Box::new(m2025_06_01_000500_create_unit_location_history::Migration),
            Box::new(m2025_06_01_000600_create_status_logs::Migration),
            Box::new(m2025_06_01_000700_create_geofence_events::Migration),
            Box::new(m2025_06_01_000800_create_call_history::Migration),
        ]
    }
}
