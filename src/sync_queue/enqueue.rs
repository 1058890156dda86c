//! Batch enqueue with duplicate suppression.
//!
//! Rows are handed to a [`SyncJobStore`] in a single insert. Rows whose
//! `dedup_key` already exists are silently skipped by the store, so the
//! returned count is the number of jobs actually created.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use metrics::counter;
use sea_orm::DbErr;
use serde::Serialize;
use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::{debug, error, info};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{JobStatus, SyncJobRequest, SyncType};

/// Fully materialized row ready for insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSyncJob {
    pub id: Uuid,
    pub case_id: Option<Uuid>,
    pub tenant_id: Option<Uuid>,
    pub sync_type: SyncType,
    pub status: JobStatus,
    pub priority: i32,
    pub scheduled_at: DateTime<FixedOffset>,
    pub payload: JsonValue,
    pub dedup_key: Option<String>,
    pub created_at: DateTime<FixedOffset>,
}

impl NewSyncJob {
    fn from_request(
        request: &SyncJobRequest,
        now: DateTime<Utc>,
    ) -> Result<Self, SyncEnqueueError> {
        let payload = serde_json::to_value(&request.payload).map_err(|e| SyncEnqueueError {
            message: format!("invalid payload: {e}"),
        })?;

        Ok(Self {
            id: Uuid::new_v4(),
            case_id: request.case_id,
            tenant_id: request.tenant_id,
            sync_type: request.sync_type,
            status: JobStatus::Queued,
            priority: request.priority,
            scheduled_at: request.scheduled_at.fixed_offset(),
            payload,
            dedup_key: request.dedup_key.clone(),
            created_at: now.fixed_offset(),
        })
    }
}

/// Persistence seam for enqueueing.
///
/// Implementations must insert every row whose `dedup_key` is absent or not yet
/// present, skip the rest without error, and report how many rows were created.
#[async_trait]
pub trait SyncJobStore: Send + Sync {
    async fn insert_ignoring_duplicates(&self, jobs: Vec<NewSyncJob>) -> Result<u64, DbErr>;
}

/// Result of an enqueue call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct EnqueueOutcome {
    /// Rows actually created; duplicates are not counted
    pub inserted: u64,
}

/// Persistence failure while enqueueing. Carries the store's message.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("failed to enqueue sync jobs: {message}")]
pub struct SyncEnqueueError {
    pub message: String,
}

impl From<DbErr> for SyncEnqueueError {
    fn from(err: DbErr) -> Self {
        Self {
            message: err.to_string(),
        }
    }
}

/// Queue a batch of sync jobs, suppressing duplicates by `dedup_key`.
///
/// An empty batch returns `inserted = 0` without touching the store.
pub async fn enqueue_sync_jobs<S>(
    store: &S,
    requests: &[SyncJobRequest],
) -> Result<EnqueueOutcome, SyncEnqueueError>
where
    S: SyncJobStore + ?Sized,
{
    if requests.is_empty() {
        debug!("No sync jobs to enqueue");
        return Ok(EnqueueOutcome { inserted: 0 });
    }

    let now = Utc::now();
    let rows = requests
        .iter()
        .map(|request| NewSyncJob::from_request(request, now))
        .collect::<Result<Vec<_>, _>>()?;
    let requested = rows.len() as u64;

    let inserted = store.insert_ignoring_duplicates(rows).await.map_err(|e| {
        error!(error = %e, requested, "Failed to insert sync jobs");
        SyncEnqueueError::from(e)
    })?;

    counter!("scourt_sync_jobs_requested_total").increment(requested);
    counter!("scourt_sync_jobs_inserted_total").increment(inserted);

    let skipped = requested.saturating_sub(inserted);
    if skipped > 0 {
        debug!(skipped, "Suppressed duplicate sync jobs");
    }
    info!(requested, inserted, "Enqueued sync jobs");

    Ok(EnqueueOutcome { inserted })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync_queue::{SyncJobPayload, TriggerSource, build_dedup_key};
    use chrono::TimeZone;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory store honoring the unique `dedup_key` contract.
    #[derive(Default)]
    struct MemoryStore {
        calls: AtomicUsize,
        keys: Mutex<HashSet<String>>,
        rows: Mutex<Vec<NewSyncJob>>,
        fail_with: Option<String>,
    }

    impl MemoryStore {
        fn failing(message: &str) -> Self {
            Self {
                fail_with: Some(message.to_string()),
                ..Default::default()
            }
        }

        fn row_count(&self) -> usize {
            self.rows.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl SyncJobStore for MemoryStore {
        async fn insert_ignoring_duplicates(&self, jobs: Vec<NewSyncJob>) -> Result<u64, DbErr> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(message) = &self.fail_with {
                return Err(DbErr::Custom(message.clone()));
            }

            let mut keys = self.keys.lock().unwrap();
            let mut rows = self.rows.lock().unwrap();
            let mut inserted = 0;
            for job in jobs {
                if let Some(key) = &job.dedup_key
                    && !keys.insert(key.clone())
                {
                    continue;
                }
                rows.push(job);
                inserted += 1;
            }
            Ok(inserted)
        }
    }

    fn full_refresh(case_id: Uuid, minute: u32) -> SyncJobRequest {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 10, minute, 0).unwrap();
        SyncJobRequest::new(SyncType::Full, at)
            .for_case(case_id, Uuid::new_v4())
            .with_priority(10)
            .with_payload(SyncJobPayload::triggered_by(TriggerSource::Manual))
            .with_derived_dedup_key()
    }

    #[tokio::test]
    async fn empty_batch_skips_store() {
        let store = MemoryStore::default();
        let outcome = enqueue_sync_jobs(&store, &[]).await.unwrap();

        assert_eq!(outcome.inserted, 0);
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn non_empty_batch_uses_one_store_call() {
        let store = MemoryStore::default();
        let requests: Vec<_> = (0..5).map(|_| full_refresh(Uuid::new_v4(), 0)).collect();

        let outcome = enqueue_sync_jobs(&store, &requests).await.unwrap();

        assert_eq!(outcome.inserted, 5);
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn repeated_dedup_key_is_inserted_once() {
        let store = MemoryStore::default();
        let case_id = Uuid::new_v4();

        let first = enqueue_sync_jobs(&store, &[full_refresh(case_id, 15)]).await.unwrap();
        let second = enqueue_sync_jobs(&store, &[full_refresh(case_id, 59)]).await.unwrap();

        assert_eq!(first.inserted, 1);
        assert_eq!(second.inserted, 0);
        assert_eq!(store.row_count(), 1);
    }

    #[tokio::test]
    async fn duplicates_within_batch_collapse() {
        let store = MemoryStore::default();
        let case_id = Uuid::new_v4();
        let requests = vec![full_refresh(case_id, 1), full_refresh(case_id, 2)];

        let outcome = enqueue_sync_jobs(&store, &requests).await.unwrap();

        assert_eq!(outcome.inserted, 1);
    }

    #[tokio::test]
    async fn jobs_without_key_are_never_collapsed() {
        let store = MemoryStore::default();
        let at = Utc::now();
        let request = SyncJobRequest::new(SyncType::Progress, at);

        let outcome = enqueue_sync_jobs(&store, &[request.clone(), request]).await.unwrap();

        assert_eq!(outcome.inserted, 2);
    }

    #[tokio::test]
    async fn rows_are_queued_with_serialized_payload() {
        let store = MemoryStore::default();
        let case_id = Uuid::new_v4();
        enqueue_sync_jobs(&store, &[full_refresh(case_id, 0)]).await.unwrap();

        let rows = store.rows.lock().unwrap();
        let row = &rows[0];
        assert_eq!(row.status, JobStatus::Queued);
        assert_eq!(row.case_id, Some(case_id));
        assert_eq!(row.payload["triggerSource"], "manual");
        assert_eq!(
            row.dedup_key.as_deref(),
            Some(
                build_dedup_key(
                    SyncType::Full,
                    Some(&case_id.to_string()),
                    Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap()
                )
                .as_str()
            )
        );
    }

    #[tokio::test]
    async fn store_failure_surfaces_message() {
        let store = MemoryStore::failing("connection reset");
        let err = enqueue_sync_jobs(&store, &[full_refresh(Uuid::new_v4(), 0)])
            .await
            .unwrap_err();

        assert!(err.message.contains("connection reset"));
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
    }
}
