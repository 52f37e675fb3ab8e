//! SeaORM database migrations.

pub use sea_orm_migration::prelude::*;

mod m20261001_000001_create_users;
mod m20261001_000002_create_sessions;
mod m20261001_000003_create_mail_accounts;
mod m20261001_000004_create_launch_tokens;
mod m20261001_000005_single_admin_index;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261001_000001_create_users::Migration),
            Box::new(m20261001_000002_create_sessions::Migration),
            Box::new(m20261001_000003_create_mail_accounts::Migration),
            Box::new(m20261001_000004_create_launch_tokens::Migration),
            Box::new(m20261001_000005_single_admin_index::Migration),
        ]
    }
}
