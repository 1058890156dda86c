//! # Case Registry Repository
//!
//! Reads case ownership and scheduler candidates from `legal_cases` and
//! maintains the progress-sync cadence column.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use uuid::Uuid;

use crate::config::ActiveCaseRule;
use crate::models::legal_case::{Column, Entity, Model};

/// Repository for `legal_cases` lookups used by the sync queue
#[derive(Clone)]
pub struct LegalCaseRepository {
    db: DatabaseConnection,
}

impl LegalCaseRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Map each known case id to its owning tenant. Unknown ids are absent from the map.
    pub async fn resolve_owners(&self, case_ids: &[Uuid]) -> Result<HashMap<Uuid, Uuid>, DbErr> {
        if case_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(Uuid, Uuid)> = Entity::find()
            .select_only()
            .column(Column::Id)
            .column(Column::TenantId)
            .filter(Column::Id.is_in(case_ids.iter().copied()))
            .into_tuple()
            .all(&self.db)
            .await?;

        Ok(rows.into_iter().collect())
    }

    /// Cases eligible for automatic progress sync whose due time is unset or has passed.
    ///
    /// Every rule is applied in the query so that ineligible cases, which are
    /// never advanced, cannot fill the limited window ahead of eligible ones.
    pub async fn find_sync_candidates(
        &self,
        rule: &ActiveCaseRule,
        now: DateTime<Utc>,
        limit: u64,
    ) -> Result<Vec<Model>, DbErr> {
        let mut query = Entity::find()
            .filter(Column::ScourtSyncEnabled.eq(true))
            .filter(Column::CourtCaseNumber.is_not_null())
            .filter(
                Condition::any()
                    .add(Column::ScourtNextProgressSyncAt.is_null())
                    .add(Column::ScourtNextProgressSyncAt.lte(now.fixed_offset())),
            );

        if !rule.status_allow_list.is_empty() {
            query = query.filter(Column::Status.is_in(rule.status_allow_list.iter().cloned()));
        } else if !rule.status_block_list.is_empty() {
            query = query.filter(
                Condition::any()
                    .add(Column::Status.is_null())
                    .add(Column::Status.is_not_in(rule.status_block_list.iter().cloned())),
            );
        }

        if rule.exclude_final_result {
            query = query
                .filter(
                    Condition::any()
                        .add(Column::CaseResult.is_null())
                        .add(Column::CaseResult.eq("")),
                )
                .filter(Column::CaseResultDate.is_null());
        }

        query = query.filter(
            Condition::any()
                .add(Column::ScourtSyncCooldownUntil.is_null())
                .add(Column::ScourtSyncCooldownUntil.lte(now.fixed_offset())),
        );

        if rule.require_linked {
            query = query
                .filter(Column::ScourtEncCsNo.is_not_null())
                .filter(Column::ScourtWmonid.is_not_null());
        }

        query
            .order_by_asc(Column::ScourtNextProgressSyncAt)
            .order_by_asc(Column::Id)
            .limit(limit)
            .all(&self.db)
            .await
    }

    /// Set the next progress-sync due time for a case.
    pub async fn set_next_progress_sync_at(
        &self,
        case_id: Uuid,
        next_at: DateTime<Utc>,
    ) -> Result<(), DbErr> {
        Entity::update_many()
            .col_expr(
                Column::ScourtNextProgressSyncAt,
                Expr::value(next_at.fixed_offset()),
            )
            .col_expr(Column::UpdatedAt, Expr::value(Utc::now().fixed_offset()))
            .filter(Column::Id.eq(case_id))
            .exec(&self.db)
            .await?;

        Ok(())
    }
}
