//! Creates the scourt_sync_jobs queue table.
//!
//! `dedup_key` carries a unique index: enqueue relies on it as the conflict
//! target for `ON CONFLICT DO NOTHING`, so repeated triggers in the same time
//! bucket collapse to one row. Rows without a key are never deduplicated.

use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Statement;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ScourtSyncJobs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ScourtSyncJobs::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ScourtSyncJobs::CaseId).uuid().null())
                    .col(ColumnDef::new(ScourtSyncJobs::TenantId).uuid().null())
                    .col(ColumnDef::new(ScourtSyncJobs::SyncType).text().not_null())
                    .col(
                        ColumnDef::new(ScourtSyncJobs::Status)
                            .text()
                            .not_null()
                            .default("queued"),
                    )
                    .col(
                        ColumnDef::new(ScourtSyncJobs::Priority)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ScourtSyncJobs::Attempts)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ScourtSyncJobs::ScheduledAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(ScourtSyncJobs::BackoffUntil)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ScourtSyncJobs::StartedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ScourtSyncJobs::FinishedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(ScourtSyncJobs::LastError).text().null())
                    .col(ColumnDef::new(ScourtSyncJobs::WorkerId).text().null())
                    .col(
                        ColumnDef::new(ScourtSyncJobs::Payload)
                            .json_binary()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ScourtSyncJobs::DedupKey).text().null())
                    .col(
                        ColumnDef::new(ScourtSyncJobs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(ScourtSyncJobs::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_scourt_sync_jobs_case_id")
                            .from(ScourtSyncJobs::Table, ScourtSyncJobs::CaseId)
                            .to(LegalCases::Table, LegalCases::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_scourt_sync_jobs_tenant_id")
                            .from(ScourtSyncJobs::Table, ScourtSyncJobs::TenantId)
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_scourt_sync_jobs_dedup_key")
                    .table(ScourtSyncJobs::Table)
                    .col(ScourtSyncJobs::DedupKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Dequeue order: ready jobs by schedule, most urgent first
        manager
            .get_connection()
            .execute(Statement::from_string(
                manager.get_database_backend(),
                "CREATE INDEX IF NOT EXISTS idx_scourt_sync_jobs_status_scheduled_priority ON scourt_sync_jobs (status, scheduled_at, priority DESC)".to_string(),
            ))
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_scourt_sync_jobs_tenant_status")
                    .table(ScourtSyncJobs::Table)
                    .col(ScourtSyncJobs::TenantId)
                    .col(ScourtSyncJobs::Status)
                    .col(ScourtSyncJobs::ScheduledAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for name in [
            "uq_scourt_sync_jobs_dedup_key",
            "idx_scourt_sync_jobs_status_scheduled_priority",
            "idx_scourt_sync_jobs_tenant_status",
        ] {
            manager
                .drop_index(Index::drop().name(name).to_owned())
                .await?;
        }

        manager
            .drop_table(Table::drop().table(ScourtSyncJobs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ScourtSyncJobs {
    Table,
    Id,
    CaseId,
    TenantId,
    SyncType,
    Status,
    Priority,
    Attempts,
    ScheduledAt,
    BackoffUntil,
    StartedAt,
    FinishedAt,
    LastError,
    WorkerId,
    Payload,
    DedupKey,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum LegalCases {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Tenants {
    Table,
    Id,
}
