//! Unit status log entity model
//!
//! Append-only audit trail of officer status changes, written on every
//! accepted status update regardless of whether a call transition followed.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "unit_status_log")]
pub struct Model {
    /// Unique identifier for the log row (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub unit_id: Uuid,

    pub old_status: String,

    pub new_status: String,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
