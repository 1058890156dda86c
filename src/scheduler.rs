//! # Sync Scheduler
//!
//! One scheduler pass, triggered by an external cron: queues `progress` jobs
//! for cases whose due time has passed, spreads newly enabled cases across the
//! interval, and queues renewal jobs for portal sessions close to expiry.
//!
//! Each pass is idempotent per time bucket because every job carries a dedup
//! key; overlapping passes cannot queue the same case twice in one hour.

use std::time::Instant;

use axum::http::StatusCode;
use chrono::{DateTime, Duration, Timelike, Utc};
use metrics::{counter, histogram};
use rand::{Rng, SeedableRng, rngs::StdRng};
use sea_orm::{DatabaseConnection, DbErr};
use serde::Serialize;
use serde_json::json;
use sha2::{Digest, Sha256};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::config::{ActiveCaseRule, SyncSettings};
use crate::error::ApiError;
use crate::models::legal_case;
use crate::repositories::{
    LegalCaseRepository, NewSyncLog, SyncJobRepository, SyncLogRepository, WmonidRepository,
};
use crate::sync_queue::{
    SESSION_RENEWAL_PRIORITY, SyncJobPayload, SyncJobRequest, SyncType, TriggerSource,
    build_dedup_key, enqueue_sync_jobs,
};

/// Outcome of one scheduler pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchedulerReport {
    /// Auto sync was switched off; nothing was read or written
    pub disabled: bool,
    /// Progress jobs actually inserted
    pub scheduled_jobs: u64,
    /// Session renewal jobs actually inserted
    pub wmonid_jobs: u64,
    /// Cases that received their first due time
    pub initialized_cases: u64,
    /// Cases returned by the candidate query, before filtering
    pub candidates: u64,
    pub duration_ms: u64,
}

/// Work derived from the candidate list, before any write.
#[derive(Debug, Default)]
struct PassPlan {
    initial_due: Vec<(Uuid, DateTime<Utc>)>,
    advanced_due: Vec<(Uuid, DateTime<Utc>)>,
    jobs: Vec<SyncJobRequest>,
}

/// Scheduler pass over the case registry and portal sessions.
pub struct SyncScheduler {
    settings: SyncSettings,
    cases: LegalCaseRepository,
    jobs: SyncJobRepository,
    wmonids: WmonidRepository,
    logs: SyncLogRepository,
}

impl SyncScheduler {
    pub fn new(db: DatabaseConnection, settings: SyncSettings) -> Self {
        Self {
            settings,
            cases: LegalCaseRepository::new(db.clone()),
            jobs: SyncJobRepository::new(db.clone()),
            wmonids: WmonidRepository::new(db.clone()),
            logs: SyncLogRepository::new(db),
        }
    }

    /// Run a pass at the current time.
    pub async fn run_pass(&self) -> Result<SchedulerReport, ApiError> {
        let mut rng = StdRng::from_entropy();
        self.run_pass_at(Utc::now(), &mut rng).await
    }

    /// Run a pass as of `now`, drawing due-time jitter from `rng`.
    #[instrument(skip_all, fields(now = %now))]
    pub async fn run_pass_at<R>(
        &self,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<SchedulerReport, ApiError>
    where
        R: Rng + Send + ?Sized,
    {
        let started = Instant::now();

        if !self.settings.auto_sync_enabled {
            info!("Auto sync disabled; skipping scheduler pass");
            return Ok(SchedulerReport {
                disabled: true,
                duration_ms: started.elapsed().as_millis() as u64,
                ..Default::default()
            });
        }

        let batch_size = self.settings.scheduler_batch_size as usize;
        let fetch_limit = (batch_size * 2).max(batch_size) as u64;

        let candidates = self
            .cases
            .find_sync_candidates(&self.settings.active_case_rule, now, fetch_limit)
            .await
            .map_err(|e| map_db_err("Candidate query failed", e))?;
        let candidate_count = candidates.len() as u64;

        let selected: Vec<legal_case::Model> = candidates
            .into_iter()
            .filter(|case| is_schedulable(case, &self.settings.active_case_rule, now))
            .take(batch_size)
            .collect();

        let plan = plan_pass(&self.settings, &selected, now, rng);

        for (case_id, due_at) in &plan.initial_due {
            self.cases
                .set_next_progress_sync_at(*case_id, *due_at)
                .await
                .map_err(|e| map_db_err("Failed to initialize progress due time", e))?;
        }

        let scheduled = enqueue_sync_jobs(&self.jobs, &plan.jobs).await?;

        // Advance only after the jobs are stored so a failed enqueue is retried next pass
        for (case_id, next_at) in &plan.advanced_due {
            self.cases
                .set_next_progress_sync_at(*case_id, *next_at)
                .await
                .map_err(|e| map_db_err("Failed to advance progress due time", e))?;
        }

        let wmonid_jobs = if self.settings.wmonid.auto_rotate_enabled {
            self.enqueue_session_renewals(now).await?
        } else {
            0
        };

        let duration_ms = started.elapsed().as_millis() as u64;
        let report = SchedulerReport {
            disabled: false,
            scheduled_jobs: scheduled.inserted,
            wmonid_jobs,
            initialized_cases: plan.initial_due.len() as u64,
            candidates: candidate_count,
            duration_ms,
        };

        self.record_log(&report).await;

        counter!("scourt_scheduler_passes_total").increment(1);
        histogram!("scourt_scheduler_pass_duration_ms").record(duration_ms as f64);
        info!(
            candidates = report.candidates,
            scheduled = report.scheduled_jobs,
            initialized = report.initialized_cases,
            wmonid = report.wmonid_jobs,
            duration_ms,
            "Scheduler pass completed"
        );

        Ok(report)
    }

    async fn enqueue_session_renewals(&self, now: DateTime<Utc>) -> Result<u64, ApiError> {
        let threshold = now + Duration::days(i64::from(self.settings.wmonid.renewal_before_days));

        let sessions = match self.wmonids.find_expiring(threshold).await {
            Ok(sessions) => sessions,
            Err(err) => {
                warn!(error = %err, "WMONID renewal query failed");
                return Ok(0);
            }
        };

        if sessions.is_empty() {
            debug!("No portal sessions due for renewal");
            return Ok(0);
        }

        let requests: Vec<SyncJobRequest> = sessions
            .iter()
            .map(|session| {
                SyncJobRequest::new(SyncType::WmonidRenewal, now)
                    .with_priority(SESSION_RENEWAL_PRIORITY)
                    .with_payload(SyncJobPayload::session_renewal(session.id, session.user_id))
                    .with_dedup_key(build_dedup_key(
                        SyncType::WmonidRenewal,
                        Some(&session.id.to_string()),
                        now,
                    ))
            })
            .collect();

        Ok(enqueue_sync_jobs(&self.jobs, &requests).await?.inserted)
    }

    async fn record_log(&self, report: &SchedulerReport) {
        let entry = NewSyncLog {
            action: "scheduler".to_string(),
            status: "success".to_string(),
            cases_synced: i32::try_from(report.scheduled_jobs).unwrap_or(i32::MAX),
            cases_failed: 0,
            duration_ms: i64::try_from(report.duration_ms).ok(),
            details: Some(json!({
                "candidates": report.candidates,
                "queued": report.scheduled_jobs,
                "wmonidQueued": report.wmonid_jobs,
            })),
        };

        if let Err(err) = self.logs.insert(entry).await {
            warn!(error = %err, "Failed to record scheduler log");
        }
    }
}

/// Whether a case satisfies the active-case rule at `now`.
///
/// Mirrors the candidate query; rows that changed between query and pass are dropped here.
pub fn is_schedulable(case: &legal_case::Model, rule: &ActiveCaseRule, now: DateTime<Utc>) -> bool {
    if rule.require_linked && !case.is_linked() {
        return false;
    }

    if rule.exclude_final_result && case.has_final_result() {
        return false;
    }

    if rule.status_allow_list.is_empty() && !rule.status_block_list.is_empty() {
        let status = case.status.as_deref().unwrap_or_default();
        if rule.status_block_list.iter().any(|blocked| blocked == status) {
            return false;
        }
    }

    if let Some(cooldown) = case.scourt_sync_cooldown_until
        && cooldown.with_timezone(&Utc) > now
    {
        return false;
    }

    true
}

fn plan_pass<R: Rng + ?Sized>(
    settings: &SyncSettings,
    selected: &[legal_case::Model],
    now: DateTime<Utc>,
    rng: &mut R,
) -> PassPlan {
    let interval_minutes = settings.interval_minutes();
    let mut plan = PassPlan::default();

    for case in selected {
        let Some(due_at) = case.scourt_next_progress_sync_at else {
            plan.initial_due
                .push((case.id, initial_next_progress_at(case.id, now, interval_minutes)));
            continue;
        };

        if due_at.with_timezone(&Utc) > now {
            continue;
        }

        plan.jobs.push(
            SyncJobRequest::new(SyncType::Progress, now)
                .for_case(case.id, case.tenant_id)
                .with_payload(SyncJobPayload::triggered_by(TriggerSource::Cron))
                .with_derived_dedup_key(),
        );
        plan.advanced_due.push((
            case.id,
            next_progress_at(
                now,
                settings.progress_interval_hours,
                settings.progress_jitter_minutes,
                rng,
            ),
        ));
    }

    plan
}

/// First due time for a case, spread across the interval by a hash of its id.
///
/// The offset is stable per case, so a fleet of newly enabled cases does not
/// come due in the same minute.
pub fn initial_next_progress_at(
    case_id: Uuid,
    now: DateTime<Utc>,
    interval_minutes: u32,
) -> DateTime<Utc> {
    let interval_minutes = interval_minutes.max(1);
    let offset = hash_offset(&case_id.to_string(), interval_minutes);

    let minute = now.minute();
    let floored = minute - minute % interval_minutes;
    let base = now
        - Duration::minutes(i64::from(minute - floored))
        - Duration::seconds(i64::from(now.second()))
        - Duration::nanoseconds(i64::from(now.nanosecond()));

    let candidate = base + Duration::minutes(i64::from(offset));
    if candidate <= now {
        candidate + Duration::minutes(i64::from(interval_minutes))
    } else {
        candidate
    }
}

/// `now + interval_hours` plus a uniform jitter in `[0, jitter_minutes)` minutes.
pub fn next_progress_at<R: Rng + ?Sized>(
    now: DateTime<Utc>,
    interval_hours: f64,
    jitter_minutes: u32,
    rng: &mut R,
) -> DateTime<Utc> {
    let interval = Duration::milliseconds((interval_hours * 3_600_000.0).round() as i64);
    let jitter = if jitter_minutes > 0 {
        rng.gen_range(0..jitter_minutes)
    } else {
        0
    };

    now + interval + Duration::minutes(i64::from(jitter))
}

fn hash_offset(value: &str, range: u32) -> u32 {
    if range == 0 {
        return 0;
    }
    let digest = Sha256::digest(value.as_bytes());
    let prefix = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
    prefix % range
}

fn map_db_err(context: &'static str, err: DbErr) -> ApiError {
    error!(error = ?err, context, "Database operation failed");
    ApiError::new(
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_SERVER_ERROR",
        context,
    )
}
