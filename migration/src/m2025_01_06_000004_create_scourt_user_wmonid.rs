//! Creates the scourt_user_wmonid table holding portal session identifiers.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ScourtUserWmonid::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ScourtUserWmonid::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ScourtUserWmonid::UserId).uuid().not_null())
                    .col(ColumnDef::new(ScourtUserWmonid::Wmonid).text().not_null())
                    .col(
                        ColumnDef::new(ScourtUserWmonid::Status)
                            .text()
                            .not_null()
                            .default("active"),
                    )
                    .col(
                        ColumnDef::new(ScourtUserWmonid::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ScourtUserWmonid::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_scourt_user_wmonid_status_expires")
                    .table(ScourtUserWmonid::Table)
                    .col(ScourtUserWmonid::Status)
                    .col(ScourtUserWmonid::ExpiresAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_scourt_user_wmonid_status_expires")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(ScourtUserWmonid::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ScourtUserWmonid {
    Table,
    Id,
    UserId,
    Wmonid,
    Status,
    ExpiresAt,
    CreatedAt,
}
