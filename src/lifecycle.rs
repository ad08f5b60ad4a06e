//! Call lifecycle state machine.
//!
//! A unit status update is the only input. The unit row and its audit log
//! are always written; the associated call advances only when the updating
//! unit holds the `primary` assignment. This module is the sole writer of
//! `dispatch_calls.status` outside the auto-close sweep.

use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    QueryFilter,
};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{
    AssignmentRole, AssignmentStatus, CallStatus, UnitStatus, call_assignment, call_status_log,
    dispatch_call, unit, unit_status_log,
};

/// Errors from applying a unit status update.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("unit {0} not found")]
    UnitNotFound(Uuid),
    #[error("call {0} not found")]
    CallNotFound(Uuid),
    #[error("call {0} is closed or archived and cannot take assignments")]
    CallNotAssignable(Uuid),
    #[error("unit {unit_id} is already assigned to call {call_id}")]
    AlreadyAssigned { call_id: Uuid, unit_id: Uuid },
    #[error("call {0} already has a primary unit")]
    PrimaryTaken(Uuid),
    #[error("unit {unit_id} has unrecognized stored status '{value}'")]
    CorruptUnitStatus { unit_id: Uuid, value: String },
    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

/// Call-side effect of a unit status update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallTransition {
    pub call_id: Uuid,
    pub old_status: CallStatus,
    pub new_status: CallStatus,
}

/// What a status update actually changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdateOutcome {
    pub unit_id: Uuid,
    pub old_status: UnitStatus,
    pub new_status: UnitStatus,
    /// False when the update repeated the unit's current status
    pub unit_changed: bool,
    pub call_transition: Option<CallTransition>,
}

/// Call status the primary unit's new status maps to, if any.
fn map_call_status(status: UnitStatus) -> Option<CallStatus> {
    match status {
        UnitStatus::Enroute => Some(CallStatus::Enroute),
        UnitStatus::OnScene => Some(CallStatus::OnScene),
        UnitStatus::Available | UnitStatus::OutOfService | UnitStatus::OffDuty => {
            Some(CallStatus::Cleared)
        }
        UnitStatus::OnPatrol => None,
    }
}

fn map_assignment_status(status: CallStatus) -> Option<AssignmentStatus> {
    match status {
        CallStatus::Enroute => Some(AssignmentStatus::Enroute),
        CallStatus::OnScene => Some(AssignmentStatus::OnScene),
        CallStatus::Cleared => Some(AssignmentStatus::Cleared),
        CallStatus::Dispatched | CallStatus::Closed => None,
    }
}

/// Assign a unit to a call and point the unit at it.
///
/// A call takes at most one primary; any number of secondaries. Closed or
/// archived calls take no new assignments. The unit's `current_call_id` is
/// set regardless of role, so a later release status drops it cleanly.
pub async fn assign_unit(
    db: &DatabaseConnection,
    call_id: Uuid,
    unit_id: Uuid,
    role: AssignmentRole,
) -> Result<call_assignment::Model, LifecycleError> {
    let call = dispatch_call::Entity::find_by_id(call_id)
        .one(db)
        .await?
        .ok_or(LifecycleError::CallNotFound(call_id))?;
    if call.archived || CallStatus::parse(&call.status).is_none_or(|s| s.is_closed()) {
        return Err(LifecycleError::CallNotAssignable(call_id));
    }

    let unit_row = unit::Entity::find_by_id(unit_id)
        .one(db)
        .await?
        .ok_or(LifecycleError::UnitNotFound(unit_id))?;

    let existing = call_assignment::Entity::find()
        .filter(call_assignment::Column::CallId.eq(call_id))
        .all(db)
        .await?;
    if existing.iter().any(|a| a.unit_id == unit_id) {
        return Err(LifecycleError::AlreadyAssigned { call_id, unit_id });
    }
    if role == AssignmentRole::Primary
        && existing
            .iter()
            .any(|a| AssignmentRole::parse(&a.role) == Some(AssignmentRole::Primary))
    {
        return Err(LifecycleError::PrimaryTaken(call_id));
    }

    let now: DateTimeWithTimeZone = Utc::now().into();
    let assignment = call_assignment::ActiveModel {
        id: Set(Uuid::new_v4()),
        call_id: Set(call_id),
        unit_id: Set(unit_id),
        role: Set(role.as_str().to_string()),
        status: Set(AssignmentStatus::Assigned.as_str().to_string()),
        assigned_at: Set(now),
        cleared_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;

    let mut active = unit_row.into_active_model();
    active.current_call_id = Set(Some(call_id));
    active.updated_at = Set(now);
    active.update(db).await?;

    info!(
        call_id = %call_id,
        unit_id = %unit_id,
        role = role.as_str(),
        "unit assigned to call"
    );
    Ok(assignment)
}

/// Apply a unit status update and any call transition it implies.
///
/// Repeated statuses are accepted but change nothing. A unit entering a
/// release status (`Available`, `Out of Service`, `Off Duty`) always drops
/// its `current_call_id`, regardless of its role on that call.
pub async fn apply_unit_status(
    db: &DatabaseConnection,
    unit_id: Uuid,
    new_status: UnitStatus,
) -> Result<StatusUpdateOutcome, LifecycleError> {
    let unit_row = unit::Entity::find_by_id(unit_id)
        .one(db)
        .await?
        .ok_or(LifecycleError::UnitNotFound(unit_id))?;

    let old_status =
        UnitStatus::parse(&unit_row.status).ok_or_else(|| LifecycleError::CorruptUnitStatus {
            unit_id,
            value: unit_row.status.clone(),
        })?;

    if old_status == new_status {
        debug!(unit_id = %unit_id, status = %new_status, "status repeated, nothing to do");
        return Ok(StatusUpdateOutcome {
            unit_id,
            old_status,
            new_status,
            unit_changed: false,
            call_transition: None,
        });
    }

    let now: DateTimeWithTimeZone = Utc::now().into();
    let current_call_id = unit_row.current_call_id;

    let mut active = unit_row.into_active_model();
    active.status = Set(new_status.as_str().to_string());
    active.updated_at = Set(now);
    if new_status.releases_call() {
        active.current_call_id = Set(None);
    }
    active.update(db).await?;

    unit_status_log::ActiveModel {
        id: Set(Uuid::new_v4()),
        unit_id: Set(unit_id),
        old_status: Set(old_status.as_str().to_string()),
        new_status: Set(new_status.as_str().to_string()),
        created_at: Set(now),
    }
    .insert(db)
    .await?;

    let mut call_transition = None;
    if let (Some(call_id), Some(target)) = (current_call_id, map_call_status(new_status)) {
        call_transition = advance_call(db, call_id, unit_id, target, now).await?;
    }

    info!(
        unit_id = %unit_id,
        from = %old_status,
        to = %new_status,
        call_updated = call_transition.is_some(),
        "unit status applied"
    );

    Ok(StatusUpdateOutcome {
        unit_id,
        old_status,
        new_status,
        unit_changed: true,
        call_transition,
    })
}

/// Advance the call if `unit_id` is its primary and the transition is legal.
async fn advance_call(
    db: &DatabaseConnection,
    call_id: Uuid,
    unit_id: Uuid,
    target: CallStatus,
    now: DateTimeWithTimeZone,
) -> Result<Option<CallTransition>, LifecycleError> {
    let Some(assignment) = call_assignment::Entity::find()
        .filter(call_assignment::Column::CallId.eq(call_id))
        .filter(call_assignment::Column::UnitId.eq(unit_id))
        .one(db)
        .await?
    else {
        return Ok(None);
    };
    if AssignmentRole::parse(&assignment.role) != Some(AssignmentRole::Primary) {
        debug!(call_id = %call_id, unit_id = %unit_id, "non-primary update, call untouched");
        return Ok(None);
    }

    // Re-read immediately before writing; a sweep may have closed the call
    // since the unit row was loaded.
    let Some(call) = dispatch_call::Entity::find_by_id(call_id).one(db).await? else {
        return Ok(None);
    };
    let Some(current) = CallStatus::parse(&call.status) else {
        return Ok(None);
    };
    if current == target || current.is_closed() || current == CallStatus::Cleared {
        debug!(call_id = %call_id, current = %current, target = %target, "call transition suppressed");
        return Ok(None);
    }

    let time_enroute = call.time_enroute;
    let time_on_scene = call.time_on_scene;
    let time_cleared = call.time_cleared;

    let mut active = call.into_active_model();
    active.status = Set(target.as_str().to_string());
    active.updated_at = Set(now);
    // Each milestone timestamp is stamped at most once.
    match target {
        CallStatus::Enroute if time_enroute.is_none() => active.time_enroute = Set(Some(now)),
        CallStatus::OnScene if time_on_scene.is_none() => active.time_on_scene = Set(Some(now)),
        CallStatus::Cleared if time_cleared.is_none() => active.time_cleared = Set(Some(now)),
        _ => {}
    }
    active.update(db).await?;

    call_status_log::ActiveModel {
        id: Set(Uuid::new_v4()),
        call_id: Set(call_id),
        old_status: Set(current.as_str().to_string()),
        new_status: Set(target.as_str().to_string()),
        changed_by_unit_id: Set(Some(unit_id)),
        note: Set(None),
        created_at: Set(now),
    }
    .insert(db)
    .await?;

    if let Some(mirror) = map_assignment_status(target) {
        let cleared_at = assignment.cleared_at;
        let mut assignment_active = assignment.into_active_model();
        assignment_active.status = Set(mirror.as_str().to_string());
        assignment_active.updated_at = Set(now);
        if mirror == AssignmentStatus::Cleared && cleared_at.is_none() {
            assignment_active.cleared_at = Set(Some(now));
        }
        assignment_active.update(db).await?;
    }

    Ok(Some(CallTransition {
        call_id,
        old_status: current,
        new_status: target,
    }))
}

#[cfg(test)]
mod tests {
    use migration::Migrator;
    use sea_orm::{Database, DatabaseConnection};
    use sea_orm_migration::MigratorTrait;
    use serde_json::json;

    use super::*;
    use crate::models::CallPriority;

    async fn setup_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        db
    }

    async fn seed_unit(db: &DatabaseConnection, status: UnitStatus, call_id: Option<Uuid>) -> Uuid {
        let id = Uuid::new_v4();
        let now: DateTimeWithTimeZone = Utc::now().into();
        unit::ActiveModel {
            id: Set(id),
            name: Set(format!("Unit {}", &id.to_string()[..8])),
            status: Set(status.as_str().to_string()),
            lat: Set(Some(37.54)),
            lon: Set(Some(-77.43)),
            skills: Set(json!([])),
            is_supervisor: Set(false),
            current_call_id: Set(call_id),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await
        .unwrap();
        id
    }

    async fn seed_call(db: &DatabaseConnection, status: CallStatus) -> Uuid {
        let id = Uuid::new_v4();
        let now: DateTimeWithTimeZone = Utc::now().into();
        dispatch_call::ActiveModel {
            id: Set(id),
            incident_type: Set("Robbery in progress".to_string()),
            location_text: Set("5th and Main".to_string()),
            lat: Set(Some(37.54)),
            lon: Set(Some(-77.43)),
            status: Set(status.as_str().to_string()),
            priority: Set(CallPriority::High.as_str().to_string()),
            source: Set("internal".to_string()),
            external_ref: Set(None),
            time_received: Set(now),
            time_enroute: Set(None),
            time_on_scene: Set(None),
            time_cleared: Set(None),
            time_closed: Set(None),
            archived: Set(false),
            archived_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await
        .unwrap();
        id
    }

    async fn seed_assignment(
        db: &DatabaseConnection,
        call_id: Uuid,
        unit_id: Uuid,
        role: AssignmentRole,
    ) {
        let now: DateTimeWithTimeZone = Utc::now().into();
        call_assignment::ActiveModel {
            id: Set(Uuid::new_v4()),
            call_id: Set(call_id),
            unit_id: Set(unit_id),
            role: Set(role.as_str().to_string()),
            status: Set(AssignmentStatus::Assigned.as_str().to_string()),
            assigned_at: Set(now),
            cleared_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn primary_enroute_advances_the_call() {
        let db = setup_db().await;
        let call_id = seed_call(&db, CallStatus::Dispatched).await;
        let unit_id = seed_unit(&db, UnitStatus::Available, Some(call_id)).await;
        seed_assignment(&db, call_id, unit_id, AssignmentRole::Primary).await;

        let outcome = apply_unit_status(&db, unit_id, UnitStatus::Enroute)
            .await
            .unwrap();

        assert!(outcome.unit_changed);
        let transition = outcome.call_transition.unwrap();
        assert_eq!(transition.old_status, CallStatus::Dispatched);
        assert_eq!(transition.new_status, CallStatus::Enroute);

        let call = dispatch_call::Entity::find_by_id(call_id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(call.status, "Enroute");
        assert!(call.time_enroute.is_some());

        let logs = call_status_log::Entity::find().all(&db).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].changed_by_unit_id, Some(unit_id));

        let assignment = call_assignment::Entity::find()
            .filter(call_assignment::Column::CallId.eq(call_id))
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(assignment.status, "enroute");
    }

    #[tokio::test]
    async fn secondary_updates_never_touch_the_call() {
        let db = setup_db().await;
        let call_id = seed_call(&db, CallStatus::Enroute).await;
        let unit_id = seed_unit(&db, UnitStatus::Enroute, Some(call_id)).await;
        seed_assignment(&db, call_id, unit_id, AssignmentRole::Secondary).await;

        let outcome = apply_unit_status(&db, unit_id, UnitStatus::OnScene)
            .await
            .unwrap();

        assert!(outcome.unit_changed);
        assert!(outcome.call_transition.is_none());
        let call = dispatch_call::Entity::find_by_id(call_id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(call.status, "Enroute");
        assert!(call.time_on_scene.is_none());
    }

    #[tokio::test]
    async fn release_clears_current_call_for_any_role() {
        let db = setup_db().await;
        let call_id = seed_call(&db, CallStatus::OnScene).await;
        let unit_id = seed_unit(&db, UnitStatus::OnScene, Some(call_id)).await;
        seed_assignment(&db, call_id, unit_id, AssignmentRole::Secondary).await;

        apply_unit_status(&db, unit_id, UnitStatus::Available)
            .await
            .unwrap();

        let unit_row = unit::Entity::find_by_id(unit_id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(unit_row.current_call_id, None);
        // Call is untouched: released by a secondary.
        let call = dispatch_call::Entity::find_by_id(call_id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(call.status, "On Scene");
    }

    #[tokio::test]
    async fn primary_release_clears_the_call_and_stamps_assignment() {
        let db = setup_db().await;
        let call_id = seed_call(&db, CallStatus::OnScene).await;
        let unit_id = seed_unit(&db, UnitStatus::OnScene, Some(call_id)).await;
        seed_assignment(&db, call_id, unit_id, AssignmentRole::Primary).await;

        let outcome = apply_unit_status(&db, unit_id, UnitStatus::Available)
            .await
            .unwrap();

        let transition = outcome.call_transition.unwrap();
        assert_eq!(transition.new_status, CallStatus::Cleared);

        let call = dispatch_call::Entity::find_by_id(call_id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(call.status, "Cleared");
        assert!(call.time_cleared.is_some());

        let assignment = call_assignment::Entity::find()
            .filter(call_assignment::Column::CallId.eq(call_id))
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(assignment.status, "cleared");
        assert!(assignment.cleared_at.is_some());
    }

    #[tokio::test]
    async fn closed_call_is_terminal() {
        let db = setup_db().await;
        let call_id = seed_call(&db, CallStatus::Closed).await;
        let unit_id = seed_unit(&db, UnitStatus::Available, Some(call_id)).await;
        seed_assignment(&db, call_id, unit_id, AssignmentRole::Primary).await;

        let outcome = apply_unit_status(&db, unit_id, UnitStatus::Enroute)
            .await
            .unwrap();

        assert!(outcome.call_transition.is_none());
        let call = dispatch_call::Entity::find_by_id(call_id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(call.status, "Closed");
        assert!(
            call_status_log::Entity::find()
                .all(&db)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn milestone_timestamps_are_stamped_once() {
        let db = setup_db().await;
        let call_id = seed_call(&db, CallStatus::Dispatched).await;
        let unit_id = seed_unit(&db, UnitStatus::Available, Some(call_id)).await;
        seed_assignment(&db, call_id, unit_id, AssignmentRole::Primary).await;

        apply_unit_status(&db, unit_id, UnitStatus::Enroute)
            .await
            .unwrap();
        let first = dispatch_call::Entity::find_by_id(call_id)
            .one(&db)
            .await
            .unwrap()
            .unwrap()
            .time_enroute
            .unwrap();

        // Bounce to on-scene and back; the en-route stamp must not move.
        apply_unit_status(&db, unit_id, UnitStatus::OnScene)
            .await
            .unwrap();
        apply_unit_status(&db, unit_id, UnitStatus::Enroute)
            .await
            .unwrap();

        let call = dispatch_call::Entity::find_by_id(call_id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(call.status, "Enroute");
        assert_eq!(call.time_enroute.unwrap(), first);
        assert!(call.time_on_scene.is_some());
    }

    #[tokio::test]
    async fn repeated_status_is_a_no_op() {
        let db = setup_db().await;
        let unit_id = seed_unit(&db, UnitStatus::Available, None).await;

        let outcome = apply_unit_status(&db, unit_id, UnitStatus::Available)
            .await
            .unwrap();

        assert!(!outcome.unit_changed);
        assert!(
            unit_status_log::Entity::find()
                .all(&db)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn unit_without_call_logs_only() {
        let db = setup_db().await;
        let unit_id = seed_unit(&db, UnitStatus::Available, None).await;

        let outcome = apply_unit_status(&db, unit_id, UnitStatus::OnPatrol)
            .await
            .unwrap();

        assert!(outcome.unit_changed);
        assert!(outcome.call_transition.is_none());
        let logs = unit_status_log::Entity::find().all(&db).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].new_status, "On Patrol");
    }

    #[tokio::test]
    async fn unknown_unit_is_an_error() {
        let db = setup_db().await;
        let err = apply_unit_status(&db, Uuid::new_v4(), UnitStatus::Available)
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::UnitNotFound(_)));
    }

    #[tokio::test]
    async fn assignment_creates_row_and_points_unit_at_the_call() {
        let db = setup_db().await;
        let call_id = seed_call(&db, CallStatus::Dispatched).await;
        let unit_id = seed_unit(&db, UnitStatus::Available, None).await;

        let assignment = assign_unit(&db, call_id, unit_id, AssignmentRole::Primary)
            .await
            .unwrap();
        assert_eq!(assignment.role, "primary");
        assert_eq!(assignment.status, "assigned");

        let unit_row = unit::Entity::find_by_id(unit_id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(unit_row.current_call_id, Some(call_id));
    }

    #[tokio::test]
    async fn a_call_takes_one_primary_but_many_secondaries() {
        let db = setup_db().await;
        let call_id = seed_call(&db, CallStatus::Dispatched).await;
        let first = seed_unit(&db, UnitStatus::Available, None).await;
        let second = seed_unit(&db, UnitStatus::Available, None).await;
        let third = seed_unit(&db, UnitStatus::Available, None).await;

        assign_unit(&db, call_id, first, AssignmentRole::Primary)
            .await
            .unwrap();
        let err = assign_unit(&db, call_id, second, AssignmentRole::Primary)
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::PrimaryTaken(_)));

        assign_unit(&db, call_id, second, AssignmentRole::Secondary)
            .await
            .unwrap();
        assign_unit(&db, call_id, third, AssignmentRole::Secondary)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn duplicate_assignment_of_the_same_unit_is_rejected() {
        let db = setup_db().await;
        let call_id = seed_call(&db, CallStatus::Dispatched).await;
        let unit_id = seed_unit(&db, UnitStatus::Available, None).await;

        assign_unit(&db, call_id, unit_id, AssignmentRole::Secondary)
            .await
            .unwrap();
        let err = assign_unit(&db, call_id, unit_id, AssignmentRole::Secondary)
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::AlreadyAssigned { .. }));
    }

    #[tokio::test]
    async fn closed_calls_take_no_assignments() {
        let db = setup_db().await;
        let call_id = seed_call(&db, CallStatus::Closed).await;
        let unit_id = seed_unit(&db, UnitStatus::Available, None).await;

        let err = assign_unit(&db, call_id, unit_id, AssignmentRole::Primary)
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::CallNotAssignable(_)));

        let err = assign_unit(&db, Uuid::new_v4(), unit_id, AssignmentRole::Primary)
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::CallNotFound(_)));
    }
}
