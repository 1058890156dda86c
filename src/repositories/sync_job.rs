//! # SyncJob Repository
//!
//! SeaORM access to the `scourt_sync_jobs` table. Implements [`SyncJobStore`]
//! with a single `INSERT .. ON CONFLICT (dedup_key) DO NOTHING` per batch.

use async_trait::async_trait;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::models::sync_job::{ActiveModel, Column, Entity, Model};
use crate::sync_queue::{JobStatus, NewSyncJob, SyncJobStore, SyncType};

/// Optional filters for job listings
#[derive(Debug, Clone, Default)]
pub struct SyncJobFilter {
    pub status: Option<JobStatus>,
    pub sync_type: Option<SyncType>,
    pub case_id: Option<Uuid>,
}

/// Repository for sync job database operations
#[derive(Clone)]
pub struct SyncJobRepository {
    db: DatabaseConnection,
}

impl SyncJobRepository {
    /// Create a new SyncJobRepository with the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// List jobs owned by a tenant, ordered by `scheduled_at` then `id`
    pub async fn list_by_tenant(
        &self,
        tenant_id: Uuid,
        filter: &SyncJobFilter,
        limit: u64,
    ) -> Result<Vec<Model>, DbErr> {
        let mut query = Entity::find().filter(Column::TenantId.eq(tenant_id));

        if let Some(status) = filter.status {
            query = query.filter(Column::Status.eq(status.as_str()));
        }
        if let Some(sync_type) = filter.sync_type {
            query = query.filter(Column::SyncType.eq(sync_type.as_str()));
        }
        if let Some(case_id) = filter.case_id {
            query = query.filter(Column::CaseId.eq(case_id));
        }

        query
            .order_by_asc(Column::ScheduledAt)
            .order_by_asc(Column::Id)
            .limit(limit)
            .all(&self.db)
            .await
    }

    pub async fn find_by_dedup_key(&self, dedup_key: &str) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .filter(Column::DedupKey.eq(dedup_key))
            .one(&self.db)
            .await
    }
}

fn to_active_model(job: NewSyncJob) -> ActiveModel {
    ActiveModel {
        id: Set(job.id),
        case_id: Set(job.case_id),
        tenant_id: Set(job.tenant_id),
        sync_type: Set(job.sync_type.as_str().to_string()),
        status: Set(job.status.as_str().to_string()),
        priority: Set(job.priority),
        attempts: Set(0),
        scheduled_at: Set(job.scheduled_at),
        backoff_until: Set(None),
        started_at: Set(None),
        finished_at: Set(None),
        last_error: Set(None),
        worker_id: Set(None),
        payload: Set(job.payload),
        dedup_key: Set(job.dedup_key),
        created_at: Set(job.created_at),
        updated_at: Set(job.created_at),
    }
}

#[async_trait]
impl SyncJobStore for SyncJobRepository {
    async fn insert_ignoring_duplicates(&self, jobs: Vec<NewSyncJob>) -> Result<u64, DbErr> {
        if jobs.is_empty() {
            return Ok(0);
        }

        Entity::insert_many(jobs.into_iter().map(to_active_model))
            .on_conflict(OnConflict::column(Column::DedupKey).do_nothing().to_owned())
            .exec_without_returning(&self.db)
            .await
    }
}
