pub use sea_orm_migration::prelude::*;

mod m20250815_000000_create_schema_and_base_db_setup;
mod m20250815_000001_create_conference_tables;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250815_000000_create_schema_and_base_db_setup::Migration),
            Box::new(m20250815_000001_create_conference_tables::Migration),
        ]
    }
}
