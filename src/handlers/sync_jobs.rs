//! Admin trigger and tenant-scoped listing for SCOURT sync jobs.

use axum::{
    extract::{Query, State, rejection::JsonRejection, rejection::QueryRejection},
    response::Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::auth::{OperatorAuth, TenantId};
use crate::error::{ApiError, validation_error};
use crate::models::sync_job;
use crate::repositories::{LegalCaseRepository, SyncJobFilter, SyncJobRepository};
use crate::server::AppState;
use crate::sync_queue::{JobStatus, ManualSync, SyncType, enqueue_manual_sync};

const DEFAULT_LIST_LIMIT: u64 = 50;
const MAX_LIST_LIMIT: u64 = 100;

/// Request body for the admin trigger
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TriggerSyncJobsRequest {
    /// Case ids (UUID) to refresh
    #[serde(default)]
    #[schema(example = json!(["550e8400-e29b-41d4-a716-446655440000"]))]
    pub case_ids: Vec<String>,
    /// Sync type; defaults to `full`
    #[serde(default)]
    pub sync_type: Option<SyncType>,
    /// Party name hint for masked-name matching
    #[serde(default)]
    pub party_name: Option<String>,
}

/// Response of the admin trigger
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TriggerSyncJobsResponse {
    pub success: bool,
    /// Jobs actually created; already-queued jobs in the same window are not counted
    #[schema(example = 1)]
    pub inserted: u64,
}

/// Queue sync jobs for explicit cases
#[utoipa::path(
    post,
    path = "/admin/scourt/sync-jobs",
    security(("bearer_auth" = [])),
    request_body = TriggerSyncJobsRequest,
    responses(
        (status = 200, description = "Jobs queued", body = TriggerSyncJobsResponse),
        (status = 400, description = "Empty, oversized or invalid case ids", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 500, description = "Enqueue failed", body = ApiError)
    ),
    tag = "sync-jobs"
)]
pub async fn trigger_sync_jobs(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    payload: Result<Json<TriggerSyncJobsRequest>, JsonRejection>,
) -> Result<Json<TriggerSyncJobsResponse>, ApiError> {
    let Json(body) = payload?;

    if body.case_ids.is_empty() {
        return Err(validation_error(
            "caseIds is required",
            json!({ "caseIds": "Must contain at least one case id" }),
        ));
    }

    let case_ids = parse_case_ids(&body.case_ids)?;
    let mut request = ManualSync::new(case_ids, body.sync_type.unwrap_or(SyncType::Full));
    request.party_name = body.party_name;

    let cases = LegalCaseRepository::new(state.db.clone());
    let jobs = SyncJobRepository::new(state.db.clone());
    let outcome = enqueue_manual_sync(&cases, &jobs, &request, Utc::now()).await?;

    tracing::info!(
        requested = request.case_ids.len(),
        inserted = outcome.inserted,
        unresolved = outcome.unresolved.len(),
        sync_type = %request.sync_type,
        "Manual sync triggered"
    );

    Ok(Json(TriggerSyncJobsResponse {
        success: true,
        inserted: outcome.inserted,
    }))
}

fn parse_case_ids(raw: &[String]) -> Result<Vec<Uuid>, ApiError> {
    let mut invalid = Vec::new();
    let mut parsed = Vec::with_capacity(raw.len());

    for value in raw {
        match Uuid::parse_str(value.trim()) {
            Ok(id) => parsed.push(id),
            Err(_) => invalid.push(value.clone()),
        }
    }

    if invalid.is_empty() {
        Ok(parsed)
    } else {
        Err(validation_error(
            "Invalid case id",
            json!({ "caseIds": "Each case id must be a valid UUID", "invalid": invalid }),
        ))
    }
}

/// Query parameters for listing sync jobs
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListSyncJobsQuery {
    /// Filter by job status (queued, running, success, failed, skipped)
    pub status: Option<String>,
    /// Filter by sync type (progress, general, full, wmonid_renewal)
    pub sync_type: Option<String>,
    /// Filter by case id (UUID)
    pub case_id: Option<String>,
    /// Maximum number of jobs to return (default: 50, max: 100)
    pub limit: Option<u64>,
}

/// Sync job as returned by the listing endpoint
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SyncJobInfo {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: String,
    pub case_id: Option<String>,
    #[schema(example = "progress")]
    pub sync_type: String,
    #[schema(example = "queued")]
    pub status: String,
    #[schema(example = 0)]
    pub priority: i32,
    pub attempts: i32,
    #[schema(example = "2025-03-01T10:00:00+00:00")]
    pub scheduled_at: String,
    pub started_at: Option<String>,
    pub finished_at: Option<String>,
    pub last_error: Option<String>,
    #[schema(value_type = Object)]
    pub payload: JsonValue,
    #[schema(example = "progress:550e8400-e29b-41d4-a716-446655440000:2025030110")]
    pub dedup_key: Option<String>,
    pub created_at: String,
}

impl From<sync_job::Model> for SyncJobInfo {
    fn from(model: sync_job::Model) -> Self {
        Self {
            id: model.id.to_string(),
            case_id: model.case_id.map(|id| id.to_string()),
            sync_type: model.sync_type,
            status: model.status,
            priority: model.priority,
            attempts: model.attempts,
            scheduled_at: model.scheduled_at.to_rfc3339(),
            started_at: model.started_at.map(|dt| dt.to_rfc3339()),
            finished_at: model.finished_at.map(|dt| dt.to_rfc3339()),
            last_error: model.last_error,
            payload: model.payload,
            dedup_key: model.dedup_key,
            created_at: model.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SyncJobsResponse {
    pub jobs: Vec<SyncJobInfo>,
}

/// List the tenant's sync jobs, ordered by scheduled time
#[utoipa::path(
    get,
    path = "/scourt/sync-jobs",
    security(("bearer_auth" = [])),
    params(ListSyncJobsQuery, crate::auth::TenantHeader),
    responses(
        (status = 200, description = "Sync jobs for the tenant", body = SyncJobsResponse),
        (status = 400, description = "Invalid filters or tenant header", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "sync-jobs"
)]
pub async fn list_sync_jobs(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantId(tenant_id): TenantId,
    query: Result<Query<ListSyncJobsQuery>, QueryRejection>,
) -> Result<Json<SyncJobsResponse>, ApiError> {
    let Query(params) = query?;

    let limit = match params.limit {
        None => DEFAULT_LIST_LIMIT,
        Some(limit) if (1..=MAX_LIST_LIMIT).contains(&limit) => limit,
        Some(_) => {
            return Err(validation_error(
                "Invalid limit",
                json!({ "limit": "Must be between 1 and 100" }),
            ));
        }
    };

    let status = params
        .status
        .as_deref()
        .map(|value| {
            value.parse::<JobStatus>().map_err(|_| {
                validation_error(
                    "Invalid status",
                    json!({ "status": "Must be one of: queued, running, success, failed, skipped" }),
                )
            })
        })
        .transpose()?;

    let sync_type = params
        .sync_type
        .as_deref()
        .map(|value| {
            value.parse::<SyncType>().map_err(|err| {
                validation_error("Invalid sync_type", json!({ "sync_type": err.to_string() }))
            })
        })
        .transpose()?;

    let case_id = params
        .case_id
        .as_deref()
        .map(|value| {
            Uuid::parse_str(value).map_err(|_| {
                validation_error("Invalid case_id", json!({ "case_id": "Must be a valid UUID" }))
            })
        })
        .transpose()?;

    let filter = SyncJobFilter {
        status,
        sync_type,
        case_id,
    };

    let jobs = SyncJobRepository::new(state.db.clone())
        .list_by_tenant(tenant_id, &filter, limit)
        .await?;

    Ok(Json(SyncJobsResponse {
        jobs: jobs.into_iter().map(SyncJobInfo::from).collect(),
    }))
}
