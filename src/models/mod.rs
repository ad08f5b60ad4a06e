//! # Data Models
//!
//! SeaORM entities for the dispatch coordination service plus the shared
//! status vocabularies.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod call_assignment;
pub mod call_history;
pub mod call_status_log;
pub mod dispatch_call;
pub mod geofence;
pub mod geofence_event;
pub mod status;
pub mod unit;
pub mod unit_location_history;
pub mod unit_status_log;

pub use call_assignment::Entity as CallAssignment;
pub use call_history::Entity as CallHistory;
pub use call_status_log::Entity as CallStatusLog;
pub use dispatch_call::Entity as DispatchCall;
pub use geofence::Entity as Geofence;
pub use geofence_event::Entity as GeofenceEvent;
pub use unit::Entity as Unit;
pub use unit_location_history::Entity as UnitLocationHistory;
pub use unit_status_log::Entity as UnitStatusLog;

pub use status::{
    AssignmentRole, AssignmentStatus, CallPriority, CallStatus, GeofenceEventType, UnitStatus,
};

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "dispatch".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
