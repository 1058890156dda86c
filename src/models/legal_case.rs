//! LegalCase entity model
//!
//! Read-mostly view of the `legal_cases` table. The sync service resolves case
//! ownership from it and maintains the progress-sync cadence columns.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use uuid::Uuid;

/// Case registry row
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "legal_cases")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Tenant that owns the case
    pub tenant_id: Uuid,

    /// Court-assigned case number (e.g. `2024드단12345`)
    pub court_case_number: Option<String>,

    /// Practice-internal case status
    pub status: Option<String>,

    /// Whether automatic portal sync is enabled for this case
    pub scourt_sync_enabled: bool,

    /// Encrypted portal case number; present once the case is linked
    pub scourt_enc_cs_no: Option<String>,

    /// Portal session identifier the case was linked with
    pub scourt_wmonid: Option<String>,

    /// Next time a progress sync is due
    pub scourt_next_progress_sync_at: Option<DateTimeWithTimeZone>,

    /// Automatic syncs are suppressed until this time
    pub scourt_sync_cooldown_until: Option<DateTimeWithTimeZone>,

    pub case_result: Option<String>,
    pub case_result_date: Option<Date>,

    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// A case is linked once both the portal case number and session are known.
    pub fn is_linked(&self) -> bool {
        self.scourt_enc_cs_no.is_some() && self.scourt_wmonid.is_some()
    }

    /// A case with a recorded outcome is considered closed by the court.
    pub fn has_final_result(&self) -> bool {
        self.case_result.as_deref().is_some_and(|value| !value.is_empty())
            || self.case_result_date.is_some()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::sync_job::Entity")]
    SyncJobs,
}

impl Related<super::sync_job::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SyncJobs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
