//! # Dispatch Call Repository
//!
//! Intake and listing queries for live calls.

use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use uuid::Uuid;

use crate::models::dispatch_call::{self, Model as DispatchCallModel};
use crate::models::{CallPriority, CallStatus};
use crate::priority;

/// Request data for creating a new call.
#[derive(Debug, Clone)]
pub struct CreateCallRequest {
    pub incident_type: String,
    pub location_text: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    /// Classified from the incident text when absent
    pub priority: Option<CallPriority>,
    /// Defaults to "internal"
    pub source: Option<String>,
    pub external_ref: Option<String>,
}

/// Repository for dispatch call persistence.
pub struct DispatchCallRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> DispatchCallRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a call in `Dispatched` state.
    pub async fn create(&self, request: CreateCallRequest) -> Result<DispatchCallModel, DbErr> {
        let now: DateTimeWithTimeZone = Utc::now().into();
        let priority = request
            .priority
            .unwrap_or_else(|| priority::classify(&request.incident_type));

        dispatch_call::ActiveModel {
            id: Set(Uuid::new_v4()),
            incident_type: Set(request.incident_type),
            location_text: Set(request.location_text),
            lat: Set(request.lat),
            lon: Set(request.lon),
            status: Set(CallStatus::Dispatched.as_str().to_string()),
            priority: Set(priority.as_str().to_string()),
            source: Set(request.source.unwrap_or_else(|| "internal".to_string())),
            external_ref: Set(request.external_ref),
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
        .insert(self.db)
        .await
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<DispatchCallModel>, DbErr> {
        dispatch_call::Entity::find_by_id(id).one(self.db).await
    }

    /// Non-archived calls, newest first, optionally filtered by status.
    pub async fn list_active(
        &self,
        status: Option<CallStatus>,
        limit: u64,
    ) -> Result<Vec<DispatchCallModel>, DbErr> {
        let mut query = dispatch_call::Entity::find()
            .filter(dispatch_call::Column::Archived.eq(false))
            .order_by_desc(dispatch_call::Column::TimeReceived)
            .limit(limit);
        if let Some(status) = status {
            query = query.filter(dispatch_call::Column::Status.eq(status.as_str()));
        }
        query.all(self.db).await
    }
}

#[cfg(test)]
mod tests {
    use migration::Migrator;
    use sea_orm::Database;
    use sea_orm_migration::MigratorTrait;

    use super::*;

    async fn setup() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        db
    }

    fn request(incident_type: &str) -> CreateCallRequest {
        CreateCallRequest {
            incident_type: incident_type.to_string(),
            location_text: "100 Main St".to_string(),
            lat: Some(37.5),
            lon: Some(-77.4),
            priority: None,
            source: None,
            external_ref: None,
        }
    }

    #[tokio::test]
    async fn create_classifies_priority_when_absent() {
        let db = setup().await;
        let repo = DispatchCallRepository::new(&db);

        let call = repo.create(request("Shots fired downtown")).await.unwrap();
        assert_eq!(call.priority, "critical");
        assert_eq!(call.status, "Dispatched");
        assert_eq!(call.source, "internal");
    }

    #[tokio::test]
    async fn explicit_priority_wins_over_classification() {
        let db = setup().await;
        let repo = DispatchCallRepository::new(&db);

        let call = repo
            .create(CreateCallRequest {
                priority: Some(CallPriority::Low),
                ..request("Shots fired downtown")
            })
            .await
            .unwrap();
        assert_eq!(call.priority, "low");
    }

    #[tokio::test]
    async fn list_active_filters_status_and_respects_limit() {
        let db = setup().await;
        let repo = DispatchCallRepository::new(&db);
        for _ in 0..3 {
            repo.create(request("Theft")).await.unwrap();
        }

        let all = repo.list_active(None, 50).await.unwrap();
        assert_eq!(all.len(), 3);

        let limited = repo.list_active(None, 2).await.unwrap();
        assert_eq!(limited.len(), 2);

        let cleared = repo
            .list_active(Some(CallStatus::Cleared), 50)
            .await
            .unwrap();
        assert!(cleared.is_empty());
    }
}
