//! Call assignment entity model
//!
//! Links a unit to a call with a role. At most one assignment exists per
//! (call, unit) pair, and at most one `primary` assignment drives the call's
//! lifecycle. Rows are historical records and are never deleted.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "call_assignments")]
pub struct Model {
    /// Unique identifier for the assignment (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub call_id: Uuid,

    pub unit_id: Uuid,

    /// Wire string of an `AssignmentRole`
    pub role: String,

    /// Wire string of an `AssignmentStatus`
    pub status: String,

    pub assigned_at: DateTimeWithTimeZone,

    /// Stamped when the assignment transitions to cleared
    pub cleared_at: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::dispatch_call::Entity",
        from = "Column::CallId",
        to = "super::dispatch_call::Column::Id"
    )]
    DispatchCall,
    #[sea_orm(
        belongs_to = "super::unit::Entity",
        from = "Column::UnitId",
        to = "super::unit::Column::Id"
    )]
    Unit,
}

impl Related<super::dispatch_call::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DispatchCall.def()
    }
}

impl Related<super::unit::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Unit.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
