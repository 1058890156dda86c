//! Queue manual SCOURT sync jobs from the command line.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use scourt_sync::{
    config::ConfigLoader,
    db,
    repositories::{LegalCaseRepository, SyncJobRepository},
    sync_queue::{ManualSync, SyncType, enqueue_manual_sync},
    telemetry,
};
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "scourt-enqueue", about = "Queue SCOURT sync jobs for specific cases")]
struct Args {
    /// Case id to refresh (repeatable)
    #[arg(long = "case-id", required = true, num_args = 1..)]
    case_ids: Vec<Uuid>,

    /// Sync type: progress, general, full or wmonid_renewal
    #[arg(long, default_value = "full")]
    sync_type: SyncType,

    /// Job priority
    #[arg(long, default_value_t = scourt_sync::sync_queue::MANUAL_PRIORITY)]
    priority: i32,

    /// Party name hint passed to the executor
    #[arg(long)]
    party_name: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = ConfigLoader::new().load().context("loading configuration")?;
    telemetry::init_tracing(&config).context("initializing tracing")?;

    let db = db::init_pool(&config)
        .await
        .context("initializing database connection pool")?;

    let mut request = ManualSync::new(args.case_ids, args.sync_type);
    request.priority = args.priority;
    request.party_name = args.party_name;

    let cases = LegalCaseRepository::new(db.clone());
    let jobs = SyncJobRepository::new(db);
    let outcome = enqueue_manual_sync(&cases, &jobs, &request, Utc::now())
        .await
        .context("queueing sync jobs")?;

    for case_id in &outcome.unresolved {
        eprintln!("skipped unknown case {case_id}");
    }
    println!("inserted {} job(s)", outcome.inserted);

    Ok(())
}
