//! Append-only writer for `scourt_sync_logs`.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, Set};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::models::sync_log::{ActiveModel, Model};

/// Fields recorded for one sync log entry
#[derive(Debug, Clone)]
pub struct NewSyncLog {
    pub action: String,
    pub status: String,
    pub cases_synced: i32,
    pub cases_failed: i32,
    pub duration_ms: Option<i64>,
    pub details: Option<JsonValue>,
}

#[derive(Clone)]
pub struct SyncLogRepository {
    db: DatabaseConnection,
}

impl SyncLogRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn insert(&self, entry: NewSyncLog) -> Result<Model, DbErr> {
        ActiveModel {
            id: Set(Uuid::new_v4()),
            action: Set(entry.action),
            status: Set(entry.status),
            cases_synced: Set(entry.cases_synced),
            cases_failed: Set(entry.cases_failed),
            duration_ms: Set(entry.duration_ms),
            details: Set(entry.details),
            created_at: Set(Utc::now().fixed_offset()),
        }
        .insert(&self.db)
        .await
    }
}
