//! Creates the legal_cases table.
//!
//! Only the columns the court-portal sync needs are modelled here: ownership,
//! the court case number, the portal link (`scourt_enc_cs_no` + `scourt_wmonid`)
//! and the progress-sync cadence bookkeeping.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(LegalCases::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LegalCases::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LegalCases::TenantId).uuid().not_null())
                    .col(ColumnDef::new(LegalCases::CourtCaseNumber).text().null())
                    .col(ColumnDef::new(LegalCases::Status).text().null())
                    .col(
                        ColumnDef::new(LegalCases::ScourtSyncEnabled)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(LegalCases::ScourtEncCsNo).text().null())
                    .col(ColumnDef::new(LegalCases::ScourtWmonid).text().null())
                    .col(
                        ColumnDef::new(LegalCases::ScourtNextProgressSyncAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(LegalCases::ScourtSyncCooldownUntil)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(LegalCases::CaseResult).text().null())
                    .col(ColumnDef::new(LegalCases::CaseResultDate).date().null())
                    .col(
                        ColumnDef::new(LegalCases::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(LegalCases::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_legal_cases_tenant_id")
                            .from(LegalCases::Table, LegalCases::TenantId)
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_legal_cases_scourt_next_progress")
                    .table(LegalCases::Table)
                    .col(LegalCases::ScourtSyncEnabled)
                    .col(LegalCases::ScourtNextProgressSyncAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_legal_cases_tenant")
                    .table(LegalCases::Table)
                    .col(LegalCases::TenantId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_legal_cases_scourt_next_progress")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(Index::drop().name("idx_legal_cases_tenant").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(LegalCases::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum LegalCases {
    Table,
    Id,
    TenantId,
    CourtCaseNumber,
    Status,
    ScourtSyncEnabled,
    ScourtEncCsNo,
    ScourtWmonid,
    ScourtNextProgressSyncAt,
    ScourtSyncCooldownUntil,
    CaseResult,
    CaseResultDate,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Tenants {
    Table,
    Id,
}
