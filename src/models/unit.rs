//! Unit entity model
//!
//! A field officer/vehicle. The row is mutated by the unit's own status
//! updates and by accepted location updates; `current_call_id` is a
//! back-reference only, not an ownership link.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde_json::Value as JsonValue;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "units")]
pub struct Model {
    /// Unique identifier for the unit (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Call sign / display name (e.g. "Unit 12", "K9-3")
    pub name: String,

    /// Wire string of a `UnitStatus`
    pub status: String,

    /// Last reported latitude
    pub lat: Option<f64>,

    /// Last reported longitude
    pub lon: Option<f64>,

    /// JSON array of skill tags (e.g. ["K9", "EMS"])
    #[sea_orm(column_type = "JsonBinary")]
    pub skills: JsonValue,

    pub is_supervisor: bool,

    /// Call this unit is currently working, if any
    pub current_call_id: Option<Uuid>,

    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// Skill tags as strings; malformed JSON yields an empty set rather than
    /// an error since skills only ever bias ranking.
    pub fn skill_tags(&self) -> Vec<String> {
        self.skills
            .as_array()
            .map(|tags| {
                tags.iter()
                    .filter_map(|tag| tag.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::call_assignment::Entity")]
    CallAssignments,
    #[sea_orm(has_many = "super::unit_location_history::Entity")]
    LocationHistory,
}

impl Related<super::call_assignment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CallAssignments.def()
    }
}

impl Related<super::unit_location_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LocationHistory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
