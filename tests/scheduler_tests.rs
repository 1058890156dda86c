//! Scheduler passes against an in-memory database.

mod test_utils;

use chrono::{Duration, TimeZone, Utc};
use rand::{SeedableRng, rngs::StdRng};
use scourt_sync::config::SyncSettings;
use scourt_sync::models::{LegalCase, SyncLog};
use scourt_sync::repositories::{SyncJobFilter, SyncJobRepository};
use scourt_sync::scheduler::SyncScheduler;
use scourt_sync::sync_queue::SyncType;
use sea_orm::EntityTrait;
use test_utils::{CaseFixture, insert_wmonid, setup_test_db};
use uuid::Uuid;

fn settings() -> SyncSettings {
    let mut settings = SyncSettings::default();
    settings.wmonid.auto_rotate_enabled = false;
    settings
}

#[tokio::test]
async fn due_case_gets_one_progress_job_and_advanced_due_time() {
    let db = setup_test_db().await.unwrap();
    let now = Utc.with_ymd_and_hms(2025, 3, 1, 10, 15, 0).unwrap();
    let tenant_id = Uuid::new_v4();
    let case = CaseFixture::new(tenant_id)
        .due_at(now - Duration::minutes(5))
        .insert(&db)
        .await
        .unwrap();

    let scheduler = SyncScheduler::new(db.clone(), settings());
    let mut rng = StdRng::seed_from_u64(7);
    let report = scheduler.run_pass_at(now, &mut rng).await.unwrap();

    assert!(!report.disabled);
    assert_eq!(report.scheduled_jobs, 1);
    assert_eq!(report.initialized_cases, 0);

    let jobs = SyncJobRepository::new(db.clone())
        .list_by_tenant(tenant_id, &SyncJobFilter::default(), 50)
        .await
        .unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].sync_type, "progress");
    assert_eq!(jobs[0].case_id, Some(case.id));
    assert_eq!(
        jobs[0].dedup_key.as_deref(),
        Some(format!("progress:{}:2025030110", case.id).as_str())
    );

    let stored = LegalCase::find_by_id(case.id).one(&db).await.unwrap().unwrap();
    let next = stored.scourt_next_progress_sync_at.unwrap().with_timezone(&Utc);
    assert!(next >= now + Duration::hours(6));
    assert!(next < now + Duration::hours(6) + Duration::minutes(30));
}

#[tokio::test]
async fn second_pass_in_same_hour_queues_nothing() {
    let db = setup_test_db().await.unwrap();
    let now = Utc.with_ymd_and_hms(2025, 3, 1, 10, 15, 0).unwrap();
    let tenant_id = Uuid::new_v4();
    let case = CaseFixture::new(tenant_id)
        .due_at(now - Duration::hours(1))
        .insert(&db)
        .await
        .unwrap();

    let mut s = settings();
    s.progress_interval_hours = 0.25;
    s.progress_jitter_minutes = 0;
    let scheduler = SyncScheduler::new(db.clone(), s);
    let mut rng = StdRng::seed_from_u64(1);

    let first = scheduler.run_pass_at(now, &mut rng).await.unwrap();
    // Due again at 10:30, still inside the 10:00 bucket.
    let second = scheduler
        .run_pass_at(now + Duration::minutes(30), &mut rng)
        .await
        .unwrap();

    assert_eq!(first.scheduled_jobs, 1);
    assert_eq!(second.scheduled_jobs, 0);

    let jobs = SyncJobRepository::new(db.clone())
        .list_by_tenant(
            tenant_id,
            &SyncJobFilter {
                case_id: Some(case.id),
                ..Default::default()
            },
            50,
        )
        .await
        .unwrap();
    assert_eq!(jobs.len(), 1);
}

#[tokio::test]
async fn new_case_is_initialized_without_a_job() {
    let db = setup_test_db().await.unwrap();
    let now = Utc.with_ymd_and_hms(2025, 3, 1, 10, 15, 0).unwrap();
    let tenant_id = Uuid::new_v4();
    let case = CaseFixture::new(tenant_id).insert(&db).await.unwrap();

    let scheduler = SyncScheduler::new(db.clone(), settings());
    let report = scheduler
        .run_pass_at(now, &mut StdRng::seed_from_u64(3))
        .await
        .unwrap();

    assert_eq!(report.initialized_cases, 1);
    assert_eq!(report.scheduled_jobs, 0);

    let stored = LegalCase::find_by_id(case.id).one(&db).await.unwrap().unwrap();
    let due = stored.scourt_next_progress_sync_at.unwrap().with_timezone(&Utc);
    assert!(due > now);
    assert!(due <= now + Duration::hours(6));
}

#[tokio::test]
async fn ineligible_cases_are_skipped() {
    let db = setup_test_db().await.unwrap();
    let now = Utc.with_ymd_and_hms(2025, 3, 1, 10, 15, 0).unwrap();
    let tenant_id = Uuid::new_v4();
    let past = now - Duration::hours(1);

    let mut cooling = CaseFixture::new(tenant_id).due_at(past);
    cooling.cooldown_until = Some(now + Duration::hours(2));
    cooling.insert(&db).await.unwrap();

    let mut finished = CaseFixture::new(tenant_id).due_at(past);
    finished.case_result = Some("원고승".to_string());
    finished.insert(&db).await.unwrap();

    let mut disabled = CaseFixture::new(tenant_id).due_at(past);
    disabled.sync_enabled = false;
    disabled.insert(&db).await.unwrap();

    let mut unlinked = CaseFixture::new(tenant_id).due_at(past);
    unlinked.linked = false;
    unlinked.insert(&db).await.unwrap();

    let mut blocked = CaseFixture::new(tenant_id).due_at(past);
    blocked.status = Some("closed".to_string());
    blocked.insert(&db).await.unwrap();

    let mut s = settings();
    s.active_case_rule.status_block_list = vec!["closed".to_string()];
    let scheduler = SyncScheduler::new(db.clone(), s);
    let report = scheduler
        .run_pass_at(now, &mut StdRng::seed_from_u64(5))
        .await
        .unwrap();

    assert_eq!(report.scheduled_jobs, 0);
    assert_eq!(report.initialized_cases, 0);
}

#[tokio::test]
async fn batch_size_caps_jobs_per_pass() {
    let db = setup_test_db().await.unwrap();
    let now = Utc.with_ymd_and_hms(2025, 3, 1, 10, 15, 0).unwrap();
    let tenant_id = Uuid::new_v4();
    for minutes in 1..=5 {
        CaseFixture::new(tenant_id)
            .due_at(now - Duration::minutes(minutes))
            .insert(&db)
            .await
            .unwrap();
    }

    let mut s = settings();
    s.scheduler_batch_size = 2;
    let report = SyncScheduler::new(db.clone(), s)
        .run_pass_at(now, &mut StdRng::seed_from_u64(9))
        .await
        .unwrap();

    assert_eq!(report.scheduled_jobs, 2);
}

#[tokio::test]
async fn ineligible_cases_do_not_crowd_out_due_cases() {
    let db = setup_test_db().await.unwrap();
    let now = Utc.with_ymd_and_hms(2025, 3, 1, 10, 15, 0).unwrap();
    let tenant_id = Uuid::new_v4();

    let mut decided = CaseFixture::new(tenant_id).due_at(now - Duration::days(30));
    decided.case_result = Some("원고승".to_string());
    decided.insert(&db).await.unwrap();

    let mut closed = CaseFixture::new(tenant_id).due_at(now - Duration::days(29));
    closed.status = Some("closed".to_string());
    closed.insert(&db).await.unwrap();

    let mut cooling = CaseFixture::new(tenant_id).due_at(now - Duration::days(28));
    cooling.cooldown_until = Some(now + Duration::days(1));
    cooling.insert(&db).await.unwrap();

    let eligible = CaseFixture::new(tenant_id)
        .due_at(now - Duration::hours(1))
        .insert(&db)
        .await
        .unwrap();

    let mut s = settings();
    s.scheduler_batch_size = 1;
    s.active_case_rule.status_block_list = vec!["closed".to_string()];
    let report = SyncScheduler::new(db.clone(), s)
        .run_pass_at(now, &mut StdRng::seed_from_u64(13))
        .await
        .unwrap();

    assert_eq!(report.candidates, 1);
    assert_eq!(report.scheduled_jobs, 1);

    let jobs = SyncJobRepository::new(db.clone())
        .list_by_tenant(tenant_id, &SyncJobFilter::default(), 50)
        .await
        .unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].case_id, Some(eligible.id));
}

#[tokio::test]
async fn expiring_sessions_get_one_renewal_per_day() {
    let db = setup_test_db().await.unwrap();
    let now = Utc.with_ymd_and_hms(2025, 3, 1, 1, 0, 0).unwrap();
    let expiring = insert_wmonid(&db, "active", now + Duration::days(10))
        .await
        .unwrap();
    insert_wmonid(&db, "active", now + Duration::days(90))
        .await
        .unwrap();
    insert_wmonid(&db, "revoked", now + Duration::days(1))
        .await
        .unwrap();

    let mut s = settings();
    s.wmonid.auto_rotate_enabled = true;
    let scheduler = SyncScheduler::new(db.clone(), s);
    let mut rng = StdRng::seed_from_u64(11);

    let first = scheduler.run_pass_at(now, &mut rng).await.unwrap();
    let later = scheduler
        .run_pass_at(now + Duration::hours(20), &mut rng)
        .await
        .unwrap();

    assert_eq!(first.wmonid_jobs, 1);
    assert_eq!(later.wmonid_jobs, 0);

    let key = format!("{}:{}:20250301", SyncType::WmonidRenewal, expiring.id);
    let job = SyncJobRepository::new(db.clone())
        .find_by_dedup_key(&key)
        .await
        .unwrap()
        .expect("renewal job stored");
    assert_eq!(job.case_id, None);
    assert_eq!(job.payload["wmonidId"], expiring.id.to_string());
    assert_eq!(job.payload["userId"], expiring.user_id.to_string());
}

#[tokio::test]
async fn disabled_auto_sync_does_nothing() {
    let db = setup_test_db().await.unwrap();
    let now = Utc.with_ymd_and_hms(2025, 3, 1, 10, 15, 0).unwrap();
    CaseFixture::new(Uuid::new_v4())
        .due_at(now - Duration::hours(1))
        .insert(&db)
        .await
        .unwrap();

    let mut s = settings();
    s.auto_sync_enabled = false;
    let report = SyncScheduler::new(db.clone(), s)
        .run_pass_at(now, &mut StdRng::seed_from_u64(2))
        .await
        .unwrap();

    assert!(report.disabled);
    assert_eq!(report.scheduled_jobs, 0);
    assert!(SyncLog::find().all(&db).await.unwrap().is_empty());
}

#[tokio::test]
async fn completed_pass_is_logged() {
    let db = setup_test_db().await.unwrap();
    let now = Utc.with_ymd_and_hms(2025, 3, 1, 10, 15, 0).unwrap();
    CaseFixture::new(Uuid::new_v4())
        .due_at(now - Duration::hours(1))
        .insert(&db)
        .await
        .unwrap();

    SyncScheduler::new(db.clone(), settings())
        .run_pass_at(now, &mut StdRng::seed_from_u64(4))
        .await
        .unwrap();

    let logs = SyncLog::find().all(&db).await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].action, "scheduler");
    assert_eq!(logs[0].cases_synced, 1);
    let details = logs[0].details.clone().unwrap();
    assert_eq!(details["queued"], 1);
}
