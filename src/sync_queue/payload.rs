//! Typed job payload.
//!
//! Stored as a JSON object with camelCase keys. Every field is optional so an
//! empty payload serializes to `{}`.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Why a job was queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TriggerSource {
    /// Operator pressed refresh (admin endpoint or CLI)
    Manual,
    /// Pushed by an upstream notification
    Webhook,
    /// Periodic scheduler pass; older rows recorded this as `auto`
    #[serde(alias = "auto")]
    Cron,
}

/// Trigger metadata consumed by the executor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncJobPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_source: Option<TriggerSource>,

    /// Party name hint used to match masked names returned by the portal
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub party_name: Option<String>,

    /// Allow the executor to upgrade to a full sync when the case is not linked
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub allow_full_fallback: bool,

    /// Portal session to renew (session renewal jobs)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wmonid_id: Option<Uuid>,

    /// Owner of the portal session (session renewal jobs)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
}

impl SyncJobPayload {
    pub fn triggered_by(source: TriggerSource) -> Self {
        Self {
            trigger_source: Some(source),
            ..Default::default()
        }
    }

    pub fn with_party_name(mut self, party_name: Option<String>) -> Self {
        self.party_name = party_name.filter(|name| !name.trim().is_empty());
        self
    }

    pub fn session_renewal(wmonid_id: Uuid, user_id: Uuid) -> Self {
        Self {
            trigger_source: Some(TriggerSource::Cron),
            wmonid_id: Some(wmonid_id),
            user_id: Some(user_id),
            ..Default::default()
        }
    }
}
