//! Call history entity model
//!
//! Permanent record produced by the stale-call sweep. Keeps the original
//! call id so status logs remain joinable after the live row is deleted.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "call_history")]
pub struct Model {
    /// Original dispatch call id (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub incident_type: String,

    pub location_text: String,

    pub lat: Option<f64>,

    pub lon: Option<f64>,

    /// Call status at the moment of archival
    pub final_status: String,

    pub priority: String,

    pub source: String,

    pub time_received: DateTimeWithTimeZone,

    pub time_closed: Option<DateTimeWithTimeZone>,

    /// When the sweep moved the call out of the live table
    pub archived_at: DateTimeWithTimeZone,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
