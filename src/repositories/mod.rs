//! # Repository Layer
//!
//! Repository implementations that encapsulate SeaORM operations for the sync
//! queue and the tables it reads.

pub mod legal_case;
pub mod sync_job;
pub mod sync_log;
pub mod wmonid;

pub use legal_case::LegalCaseRepository;
pub use sync_job::{SyncJobFilter, SyncJobRepository};
pub use sync_log::{NewSyncLog, SyncLogRepository};
pub use wmonid::WmonidRepository;
