//! Portal session (WMONID) lookups.

use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder};

use crate::models::wmonid::{Column, Entity, Model};

/// Session statuses that are still worth renewing
pub const RENEWABLE_STATUSES: [&str; 2] = ["active", "expiring"];

#[derive(Clone)]
pub struct WmonidRepository {
    db: DatabaseConnection,
}

impl WmonidRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Renewable sessions expiring at or before `threshold`
    pub async fn find_expiring(&self, threshold: DateTime<Utc>) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::ExpiresAt.lte(threshold.fixed_offset()))
            .filter(Column::Status.is_in(RENEWABLE_STATUSES))
            .order_by_asc(Column::ExpiresAt)
            .all(&self.db)
            .await
    }
}
