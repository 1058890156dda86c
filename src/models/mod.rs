//! # Data Models
//!
//! SeaORM entities for the sync queue and the tables it reads, plus the
//! service-info payload returned from the root endpoint.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod legal_case;
pub mod sync_job;
pub mod sync_log;
pub mod wmonid;

pub use legal_case::Entity as LegalCase;
pub use sync_job::Entity as SyncJob;
pub use sync_log::Entity as SyncLog;
pub use wmonid::Entity as Wmonid;

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "scourt-sync".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
