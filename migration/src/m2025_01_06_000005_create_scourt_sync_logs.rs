//! Creates the scourt_sync_logs audit table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ScourtSyncLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ScourtSyncLogs::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ScourtSyncLogs::Action).text().not_null())
                    .col(ColumnDef::new(ScourtSyncLogs::Status).text().not_null())
                    .col(
                        ColumnDef::new(ScourtSyncLogs::CasesSynced)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ScourtSyncLogs::CasesFailed)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(ScourtSyncLogs::DurationMs).big_integer().null())
                    .col(ColumnDef::new(ScourtSyncLogs::Details).json_binary().null())
                    .col(
                        ColumnDef::new(ScourtSyncLogs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ScourtSyncLogs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ScourtSyncLogs {
    Table,
    Id,
    Action,
    Status,
    CasesSynced,
    CasesFailed,
    DurationMs,
    Details,
    CreatedAt,
}
