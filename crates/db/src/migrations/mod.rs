//! Database migrations.
//!
//! Schema migrations for the database.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20250901_000001_create_user_table;
mod m20250901_000002_create_profile_table;
mod m20250901_000003_create_transport_request_table;
mod m20250901_000004_create_assignment_table;
mod m20250901_000005_create_rejection_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250901_000001_create_user_table::Migration),
            Box::new(m20250901_000002_create_profile_table::Migration),
            Box::new(m20250901_000003_create_transport_request_table::Migration),
            Box::new(m20250901_000004_create_assignment_table::Migration),
            Box::new(m20250901_000005_create_rejection_table::Migration),
        ]
    }
}
