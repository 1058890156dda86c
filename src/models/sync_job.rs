//! SyncJob entity model
//!
//! SeaORM entity for the `scourt_sync_jobs` table: one row per request to
//! refresh a case (or a portal session) from the court portal.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use super::legal_case::Entity as LegalCase;

/// Queued court-portal sync job
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "scourt_sync_jobs")]
pub struct Model {
    /// Unique identifier for the sync job (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Case to refresh; `None` for tenant/global-scope jobs such as session renewal
    pub case_id: Option<Uuid>,

    /// Tenant owning the case, when known
    pub tenant_id: Option<Uuid>,

    /// Wire name of the sync type (progress, general, full, wmonid_renewal)
    pub sync_type: String,

    /// Lifecycle status; this service only writes `queued`
    pub status: String,

    /// Scheduling priority (higher values = more urgent)
    pub priority: i32,

    /// Number of executor attempts so far
    pub attempts: i32,

    /// Timestamp when the job becomes eligible
    pub scheduled_at: DateTimeWithTimeZone,

    pub backoff_until: Option<DateTimeWithTimeZone>,
    pub started_at: Option<DateTimeWithTimeZone>,
    pub finished_at: Option<DateTimeWithTimeZone>,
    pub last_error: Option<String>,
    pub worker_id: Option<String>,

    /// Trigger metadata (see [`crate::sync_queue::SyncJobPayload`])
    #[sea_orm(column_type = "JsonBinary")]
    pub payload: JsonValue,

    /// `{sync_type}:{case or global}:{bucket}`; unique across the table
    #[sea_orm(unique)]
    pub dedup_key: Option<String>,

    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "LegalCase",
        from = "Column::CaseId",
        to = "super::legal_case::Column::Id"
    )]
    LegalCase,
}

impl Related<LegalCase> for Entity {
    fn to() -> RelationDef {
        Relation::LegalCase.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
