//! Test utilities for database testing.
//!
//! In-memory SQLite databases with migrations applied, plus typed fixture
//! builders for cases and portal sessions.

#![allow(dead_code)]

use anyhow::Result;
use chrono::{DateTime, Utc};
use migration::{Migrator, MigratorTrait};
use scourt_sync::config::AppConfig;
use scourt_sync::models::{legal_case, wmonid};
use sea_orm::{ActiveModelTrait, ConnectionTrait, Database, DatabaseConnection, Set, Statement};
use uuid::Uuid;

pub const OPERATOR_TOKEN: &str = "test-operator-token";
pub const CRON_SECRET: &str = "test-cron-secret";

/// Sets up an in-memory SQLite database with all migrations applied.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await?;

    Migrator::up(&db, None).await?;

    // Fixtures do not always carry a tenants row.
    db.execute(Statement::from_string(
        db.get_database_backend(),
        "PRAGMA foreign_keys = OFF".to_string(),
    ))
    .await?;

    Ok(db)
}

/// Configuration with known operator token and cron secret.
pub fn test_config() -> AppConfig {
    AppConfig {
        operator_tokens: vec![OPERATOR_TOKEN.to_string()],
        cron_secret: Some(CRON_SECRET.to_string()),
        ..Default::default()
    }
}

/// Case fixture; defaults describe a linked, sync-enabled case with no due time yet.
#[derive(Debug, Clone)]
pub struct CaseFixture {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub status: Option<String>,
    pub sync_enabled: bool,
    pub linked: bool,
    pub next_progress_sync_at: Option<DateTime<Utc>>,
    pub cooldown_until: Option<DateTime<Utc>>,
    pub case_result: Option<String>,
}

impl CaseFixture {
    pub fn new(tenant_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            status: Some("active".to_string()),
            sync_enabled: true,
            linked: true,
            next_progress_sync_at: None,
            cooldown_until: None,
            case_result: None,
        }
    }

    pub fn due_at(mut self, at: DateTime<Utc>) -> Self {
        self.next_progress_sync_at = Some(at);
        self
    }

    pub async fn insert(self, db: &DatabaseConnection) -> Result<legal_case::Model> {
        let now = Utc::now().fixed_offset();
        let model = legal_case::ActiveModel {
            id: Set(self.id),
            tenant_id: Set(self.tenant_id),
            court_case_number: Set(Some("2024가단12345".to_string())),
            status: Set(self.status),
            scourt_sync_enabled: Set(self.sync_enabled),
            scourt_enc_cs_no: Set(self.linked.then(|| "enc-cs-no".to_string())),
            scourt_wmonid: Set(self.linked.then(|| "wmonid".to_string())),
            scourt_next_progress_sync_at: Set(self.next_progress_sync_at.map(|t| t.fixed_offset())),
            scourt_sync_cooldown_until: Set(self.cooldown_until.map(|t| t.fixed_offset())),
            case_result: Set(self.case_result),
            case_result_date: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(model.insert(db).await?)
    }
}

/// Inserts a portal session expiring at `expires_at`.
pub async fn insert_wmonid(
    db: &DatabaseConnection,
    status: &str,
    expires_at: DateTime<Utc>,
) -> Result<wmonid::Model> {
    let model = wmonid::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(Uuid::new_v4()),
        wmonid: Set(format!("WMONID-{}", Uuid::new_v4().simple())),
        status: Set(status.to_string()),
        expires_at: Set(expires_at.fixed_offset()),
        created_at: Set(Utc::now().fixed_offset()),
    };

    Ok(model.insert(db).await?)
}
