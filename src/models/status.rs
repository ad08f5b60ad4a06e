//! Domain status vocabularies shared by the entities, the lifecycle engine,
//! and the API surface.
//!
//! The database stores the wire strings (`as_str`) rather than enum
//! discriminants so rows stay readable in ad-hoc queries; `parse` is the
//! single place a stored string becomes typed again.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Lifecycle status of a dispatch call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum CallStatus {
    Dispatched,
    Enroute,
    #[serde(rename = "On Scene")]
    OnScene,
    Cleared,
    Closed,
}

impl CallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallStatus::Dispatched => "Dispatched",
            CallStatus::Enroute => "Enroute",
            CallStatus::OnScene => "On Scene",
            CallStatus::Cleared => "Cleared",
            CallStatus::Closed => "Closed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Dispatched" => Some(CallStatus::Dispatched),
            "Enroute" => Some(CallStatus::Enroute),
            "On Scene" => Some(CallStatus::OnScene),
            "Cleared" => Some(CallStatus::Cleared),
            "Closed" => Some(CallStatus::Closed),
            _ => None,
        }
    }

    /// Closed is the only hard-terminal state; Cleared may still be
    /// re-produced by a late primary-unit release.
    pub fn is_closed(&self) -> bool {
        matches!(self, CallStatus::Closed)
    }
}

impl std::fmt::Display for CallStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operational status of a field unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum UnitStatus {
    Available,
    Enroute,
    #[serde(rename = "On Scene")]
    OnScene,
    #[serde(rename = "On Patrol")]
    OnPatrol,
    #[serde(rename = "Out of Service")]
    OutOfService,
    #[serde(rename = "Off Duty")]
    OffDuty,
}

impl UnitStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitStatus::Available => "Available",
            UnitStatus::Enroute => "Enroute",
            UnitStatus::OnScene => "On Scene",
            UnitStatus::OnPatrol => "On Patrol",
            UnitStatus::OutOfService => "Out of Service",
            UnitStatus::OffDuty => "Off Duty",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Available" => Some(UnitStatus::Available),
            "Enroute" => Some(UnitStatus::Enroute),
            "On Scene" => Some(UnitStatus::OnScene),
            "On Patrol" => Some(UnitStatus::OnPatrol),
            "Out of Service" => Some(UnitStatus::OutOfService),
            "Off Duty" => Some(UnitStatus::OffDuty),
            _ => None,
        }
    }

    /// Statuses that mean "done with my current call".
    pub fn releases_call(&self) -> bool {
        matches!(
            self,
            UnitStatus::Available | UnitStatus::OutOfService | UnitStatus::OffDuty
        )
    }
}

impl std::fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Four-level call severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CallPriority {
    Low,
    Medium,
    High,
    Critical,
}

impl CallPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallPriority::Low => "low",
            CallPriority::Medium => "medium",
            CallPriority::High => "high",
            CallPriority::Critical => "critical",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "low" => Some(CallPriority::Low),
            "medium" => Some(CallPriority::Medium),
            "high" => Some(CallPriority::High),
            "critical" => Some(CallPriority::Critical),
            _ => None,
        }
    }

    /// Numeric weight used by the ranking engine as a score divisor.
    pub fn weight(&self) -> f64 {
        match self {
            CallPriority::Low => 1.0,
            CallPriority::Medium => 2.0,
            CallPriority::High => 3.0,
            CallPriority::Critical => 4.0,
        }
    }
}

impl std::fmt::Display for CallPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role of a unit on a call. Only the primary drives call-status transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentRole {
    Primary,
    Secondary,
}

impl AssignmentRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentRole::Primary => "primary",
            AssignmentRole::Secondary => "secondary",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "primary" => Some(AssignmentRole::Primary),
            "secondary" => Some(AssignmentRole::Secondary),
            _ => None,
        }
    }
}

/// Assignment progress mirrored from the primary unit's status changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    Assigned,
    Enroute,
    OnScene,
    Cleared,
}

impl AssignmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentStatus::Assigned => "assigned",
            AssignmentStatus::Enroute => "enroute",
            AssignmentStatus::OnScene => "on_scene",
            AssignmentStatus::Cleared => "cleared",
        }
    }
}

/// Direction of a geofence boundary crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum GeofenceEventType {
    Entry,
    Exit,
}

impl GeofenceEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeofenceEventType::Entry => "entry",
            GeofenceEventType::Exit => "exit",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_status_round_trips_through_wire_strings() {
        for status in [
            CallStatus::Dispatched,
            CallStatus::Enroute,
            CallStatus::OnScene,
            CallStatus::Cleared,
            CallStatus::Closed,
        ] {
            assert_eq!(CallStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(CallStatus::parse("bogus"), None);
    }

    #[test]
    fn unit_status_release_set() {
        assert!(UnitStatus::Available.releases_call());
        assert!(UnitStatus::OutOfService.releases_call());
        assert!(UnitStatus::OffDuty.releases_call());
        assert!(!UnitStatus::Enroute.releases_call());
        assert!(!UnitStatus::OnScene.releases_call());
        assert!(!UnitStatus::OnPatrol.releases_call());
    }

    #[test]
    fn priority_weights_are_monotonic() {
        assert!(CallPriority::Critical.weight() > CallPriority::High.weight());
        assert!(CallPriority::High.weight() > CallPriority::Medium.weight());
        assert!(CallPriority::Medium.weight() > CallPriority::Low.weight());
    }

    #[test]
    fn only_closed_is_terminal() {
        assert!(CallStatus::Closed.is_closed());
        assert!(!CallStatus::Cleared.is_closed());
    }
}
