//! # SCOURT Sync Queue
//!
//! Records intents to refresh case data from the court portal. Repeated
//! triggers for the same case and sync type inside one time bucket collapse to
//! a single queued job through the `dedup_key` uniqueness constraint.
//!
//! The executor that drains the queue lives elsewhere; this module only ever
//! creates jobs in the [`JobStatus::Queued`] state.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

pub mod dedup;
pub mod enqueue;
pub mod manual;
pub mod payload;

pub use dedup::{BucketGranularity, GLOBAL_SCOPE, build_dedup_key};
pub use enqueue::{EnqueueOutcome, NewSyncJob, SyncEnqueueError, SyncJobStore, enqueue_sync_jobs};
pub use manual::{
    MAX_MANUAL_CASE_IDS, ManualSync, ManualSyncError, ManualSyncOutcome, enqueue_manual_sync,
};
pub use payload::{SyncJobPayload, TriggerSource};

/// Priority assigned to operator-triggered jobs; the executor treats `>= 10` as manual.
pub const MANUAL_PRIORITY: i32 = 10;

/// Priority assigned to portal session renewal jobs.
pub const SESSION_RENEWAL_PRIORITY: i32 = 5;

/// Kind of refresh requested from the court portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SyncType {
    /// Lightweight refresh of the case progress timeline
    Progress,
    /// Refresh of general case information
    General,
    /// Full refresh of every section
    Full,
    /// Periodic renewal of a portal session (WMONID)
    WmonidRenewal,
}

impl SyncType {
    pub const ALL: [SyncType; 4] = [
        SyncType::Progress,
        SyncType::General,
        SyncType::Full,
        SyncType::WmonidRenewal,
    ];

    /// Wire name stored in `sync_type` and used as the first dedup key segment.
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncType::Progress => "progress",
            SyncType::General => "general",
            SyncType::Full => "full",
            SyncType::WmonidRenewal => "wmonid_renewal",
        }
    }

    /// Width of the dedup window for this sync type.
    ///
    /// General case info changes slowly, and sessions renew once a day, so those
    /// dedupe per UTC day. Progress and full syncs may be re-requested within a
    /// day and dedupe per UTC hour.
    pub fn bucket_granularity(&self) -> BucketGranularity {
        match self {
            SyncType::General | SyncType::WmonidRenewal => BucketGranularity::Day,
            SyncType::Progress | SyncType::Full => BucketGranularity::Hour,
        }
    }
}

impl fmt::Display for SyncType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string does not name a known sync type.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown sync type '{0}'; expected one of: progress, general, full, wmonid_renewal")]
pub struct ParseSyncTypeError(pub String);

impl FromStr for SyncType {
    type Err = ParseSyncTypeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        SyncType::ALL
            .into_iter()
            .find(|sync_type| sync_type.as_str() == value)
            .ok_or_else(|| ParseSyncTypeError(value.to_string()))
    }
}

/// Job lifecycle state. Only `Queued` is written here; the rest belong to the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Success,
    Failed,
    Skipped,
}

impl JobStatus {
    pub const ALL: [JobStatus; 5] = [
        JobStatus::Queued,
        JobStatus::Running,
        JobStatus::Success,
        JobStatus::Failed,
        JobStatus::Skipped,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Success => "success",
            JobStatus::Failed => "failed",
            JobStatus::Skipped => "skipped",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        JobStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| format!("unknown job status '{value}'"))
    }
}

/// A single request to queue a sync job.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncJobRequest {
    /// Case to refresh; `None` for tenant/global-scope jobs
    pub case_id: Option<Uuid>,
    pub tenant_id: Option<Uuid>,
    pub sync_type: SyncType,
    /// Higher = more urgent; defaults to 0
    pub priority: i32,
    /// When the job becomes eligible
    pub scheduled_at: DateTime<Utc>,
    pub payload: SyncJobPayload,
    /// Deduplication key; jobs without one are never collapsed
    pub dedup_key: Option<String>,
}

impl SyncJobRequest {
    /// Create a request with default priority, empty payload and no dedup key.
    pub fn new(sync_type: SyncType, scheduled_at: DateTime<Utc>) -> Self {
        Self {
            case_id: None,
            tenant_id: None,
            sync_type,
            priority: 0,
            scheduled_at,
            payload: SyncJobPayload::default(),
            dedup_key: None,
        }
    }

    pub fn for_case(mut self, case_id: Uuid, tenant_id: Uuid) -> Self {
        self.case_id = Some(case_id);
        self.tenant_id = Some(tenant_id);
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_payload(mut self, payload: SyncJobPayload) -> Self {
        self.payload = payload;
        self
    }

    pub fn with_dedup_key(mut self, dedup_key: impl Into<String>) -> Self {
        self.dedup_key = Some(dedup_key.into());
        self
    }

    /// Set the dedup key derived from this request's sync type, case and schedule.
    pub fn with_derived_dedup_key(mut self) -> Self {
        let case_id = self.case_id.map(|id| id.to_string());
        self.dedup_key = Some(build_dedup_key(
            self.sync_type,
            case_id.as_deref(),
            self.scheduled_at,
        ));
        self
    }
}
