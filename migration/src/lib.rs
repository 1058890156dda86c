//! Database migrations for the SCOURT sync service.

pub use sea_orm_migration::prelude::*;

mod m2025_01_06_000001_create_tenants;
mod m2025_01_06_000002_create_legal_cases;
mod m2025_01_06_000003_create_scourt_sync_jobs;
mod m2025_01_06_000004_create_scourt_user_wmonid;
mod m2025_01_06_000005_create_scourt_sync_logs;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2025_01_06_000001_create_tenants::Migration),
            Box::new(m2025_01_06_000002_create_legal_cases::Migration),
            Box::new(m2025_01_06_000003_create_scourt_sync_jobs::Migration),
            Box::new(m2025_01_06_000004_create_scourt_user_wmonid::Migration),
            Box::new(m2025_01_06_000005_create_scourt_sync_logs::Migration),
        ]
    }
}
