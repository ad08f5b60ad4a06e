//! Call status log entity model
//!
//! Append-only audit trail, one row per call-status transition. Never
//! mutated. `changed_by_unit_id` is null for system-attributed changes
//! such as the auto-close sweep.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "call_status_log")]
pub struct Model {
    /// Unique identifier for the log row (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub call_id: Uuid,

    pub old_status: String,

    pub new_status: String,

    /// Unit whose status change drove the transition; null for the system
    pub changed_by_unit_id: Option<Uuid>,

    pub note: Option<String>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
