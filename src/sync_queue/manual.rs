//! Operator-triggered refreshes for explicit case ids.
//!
//! Shared by the admin endpoint and the `scourt-enqueue` CLI. Case ownership is
//! resolved through the case registry; ids that are not found are skipped.

use chrono::{DateTime, Utc};
use sea_orm::DbErr;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use super::{
    MANUAL_PRIORITY, SyncEnqueueError, SyncJobPayload, SyncJobRequest, SyncJobStore, SyncType,
    TriggerSource, enqueue_sync_jobs,
};
use crate::repositories::LegalCaseRepository;

/// Upper bound on distinct case ids in one manual request; keeps the single
/// batch insert under the database's bind-parameter limit.
pub const MAX_MANUAL_CASE_IDS: usize = 500;

/// A manual refresh request for one or more cases
#[derive(Debug, Clone)]
pub struct ManualSync {
    pub case_ids: Vec<Uuid>,
    pub sync_type: SyncType,
    pub priority: i32,
    pub party_name: Option<String>,
}

impl ManualSync {
    pub fn new(case_ids: Vec<Uuid>, sync_type: SyncType) -> Self {
        Self {
            case_ids,
            sync_type,
            priority: MANUAL_PRIORITY,
            party_name: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualSyncOutcome {
    pub inserted: u64,
    /// Requested ids with no matching case
    pub unresolved: Vec<Uuid>,
}

#[derive(Debug, Error)]
pub enum ManualSyncError {
    #[error("failed to resolve case owners: {0}")]
    Lookup(#[from] DbErr),
    #[error("too many case ids: {requested} (max {max})")]
    TooManyCases { requested: usize, max: usize },
    #[error(transparent)]
    Enqueue(#[from] SyncEnqueueError),
}

/// Queue one job per known case, all scheduled at `now` with a derived dedup key.
pub async fn enqueue_manual_sync<S>(
    cases: &LegalCaseRepository,
    store: &S,
    request: &ManualSync,
    now: DateTime<Utc>,
) -> Result<ManualSyncOutcome, ManualSyncError>
where
    S: SyncJobStore + ?Sized,
{
    let mut case_ids = request.case_ids.clone();
    let mut seen = std::collections::HashSet::new();
    case_ids.retain(|id| seen.insert(*id));

    if case_ids.len() > MAX_MANUAL_CASE_IDS {
        return Err(ManualSyncError::TooManyCases {
            requested: case_ids.len(),
            max: MAX_MANUAL_CASE_IDS,
        });
    }

    let owners = cases.resolve_owners(&case_ids).await?;

    let mut unresolved = Vec::new();
    let mut jobs = Vec::with_capacity(case_ids.len());
    for case_id in case_ids {
        let Some(tenant_id) = owners.get(&case_id) else {
            warn!(case_id = %case_id, "Skipping sync request for unknown case");
            unresolved.push(case_id);
            continue;
        };

        let payload = SyncJobPayload::triggered_by(TriggerSource::Manual)
            .with_party_name(request.party_name.clone());

        jobs.push(
            SyncJobRequest::new(request.sync_type, now)
                .for_case(case_id, *tenant_id)
                .with_priority(request.priority)
                .with_payload(payload)
                .with_derived_dedup_key(),
        );
    }

    let outcome = enqueue_sync_jobs(store, &jobs).await?;

    Ok(ManualSyncOutcome {
        inserted: outcome.inserted,
        unresolved,
    })
}
