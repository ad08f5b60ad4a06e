//! Dispatch call entity model
//!
//! Live operational calls. Lifecycle timestamps are stamped exactly once by
//! the state machine in `crate::lifecycle`; retention sweeps flip `archived`
//! and perform the auto-close, and nothing else writes `status`.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "dispatch_calls")]
pub struct Model {
    /// Unique identifier for the call (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Free-text incident description (e.g. "Armed robbery in progress")
    pub incident_type: String,

    /// Human-readable location text
    pub location_text: String,

    /// Latitude, when the location could be resolved
    pub lat: Option<f64>,

    /// Longitude, when the location could be resolved
    pub lon: Option<f64>,

    /// Wire string of a `CallStatus`
    pub status: String,

    /// Wire string of a `CallPriority`
    pub priority: String,

    /// Origin feed slug, or "internal" for dispatcher-created calls
    pub source: String,

    /// Upstream identifier for externally-sourced calls, used for dedupe
    pub external_ref: Option<String>,

    /// When the call entered the system
    pub time_received: DateTimeWithTimeZone,

    /// Stamped when the primary unit first goes en route
    pub time_enroute: Option<DateTimeWithTimeZone>,

    /// Stamped when the primary unit first arrives on scene
    pub time_on_scene: Option<DateTimeWithTimeZone>,

    /// Stamped when the call is first cleared
    pub time_cleared: Option<DateTimeWithTimeZone>,

    /// Stamped by the auto-close sweep
    pub time_closed: Option<DateTimeWithTimeZone>,

    /// Outside the active operational window; never mutated further
    pub archived: bool,

    /// When the archival sweep flagged the call
    pub archived_at: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::call_assignment::Entity")]
    CallAssignments,
}

impl Related<super::call_assignment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CallAssignments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
