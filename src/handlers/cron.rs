//! Cron-invoked scheduler trigger.

use axum::{
    extract::{Query, State, rejection::QueryRejection},
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::auth::verify_cron_secret;
use crate::error::ApiError;
use crate::scheduler::{SchedulerReport, SyncScheduler};
use crate::server::AppState;

#[derive(Debug, Deserialize, IntoParams)]
pub struct CronQuery {
    /// Shared cron secret
    pub secret: Option<String>,
}

/// Scheduler pass summary
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerRunResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "Auto sync disabled")]
    pub message: Option<String>,
    pub scheduled_jobs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wmonid_jobs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initialized_cases: Option<u64>,
    pub duration_ms: u64,
}

impl From<SchedulerReport> for SchedulerRunResponse {
    fn from(report: SchedulerReport) -> Self {
        if report.disabled {
            return Self {
                success: true,
                message: Some("Auto sync disabled".to_string()),
                scheduled_jobs: 0,
                wmonid_jobs: None,
                initialized_cases: None,
                duration_ms: report.duration_ms,
            };
        }

        Self {
            success: true,
            message: None,
            scheduled_jobs: report.scheduled_jobs,
            wmonid_jobs: Some(report.wmonid_jobs),
            initialized_cases: Some(report.initialized_cases),
            duration_ms: report.duration_ms,
        }
    }
}

/// Run one scheduler pass
#[utoipa::path(
    get,
    path = "/cron/scourt-sync-scheduler",
    params(CronQuery),
    responses(
        (status = 200, description = "Pass completed or auto sync disabled", body = SchedulerRunResponse),
        (status = 401, description = "Missing or invalid cron secret", body = ApiError),
        (status = 500, description = "Candidate query or enqueue failed", body = ApiError)
    ),
    tag = "cron"
)]
pub async fn run_scheduler(
    State(state): State<AppState>,
    query: Result<Query<CronQuery>, QueryRejection>,
) -> Result<Json<SchedulerRunResponse>, ApiError> {
    let Query(query) = query?;
    verify_cron_secret(&state.config, query.secret.as_deref())?;

    let scheduler = SyncScheduler::new(state.db.clone(), state.config.sync.clone());
    let report = scheduler.run_pass().await?;

    Ok(Json(report.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_report_has_message_and_no_counts() {
        let response = SchedulerRunResponse::from(SchedulerReport {
            disabled: true,
            duration_ms: 3,
            ..Default::default()
        });
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["success"], true);
        assert_eq!(value["message"], "Auto sync disabled");
        assert_eq!(value["scheduledJobs"], 0);
        assert!(value.get("wmonidJobs").is_none());
    }

    #[test]
    fn completed_report_uses_camel_case() {
        let response = SchedulerRunResponse::from(SchedulerReport {
            disabled: false,
            scheduled_jobs: 4,
            wmonid_jobs: 1,
            initialized_cases: 2,
            candidates: 9,
            duration_ms: 12,
        });
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["scheduledJobs"], 4);
        assert_eq!(value["wmonidJobs"], 1);
        assert_eq!(value["initializedCases"], 2);
        assert_eq!(value["durationMs"], 12);
        assert!(value.get("message").is_none());
    }
}
