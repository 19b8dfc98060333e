//! Миграции схемы локального хранилища.

pub use sea_orm_migration::prelude::*;

mod m001_create_server_groups;
mod m002_create_keypairs;
mod m003_create_servers;
mod m004_create_command_logs;
mod m005_create_settings;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m001_create_server_groups::Migration),
            Box::new(m002_create_keypairs::Migration),
            Box::new(m003_create_servers::Migration),
            Box::new(m004_create_command_logs::Migration),
            Box::new(m005_create_settings::Migration),
        ]
    }
}
