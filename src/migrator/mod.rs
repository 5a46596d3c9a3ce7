use sea_orm_migration::prelude::*;

mod m20240401_000001_create_installed_mods;
mod m20240401_000002_create_mod_versions;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240401_000001_create_installed_mods::InstalledModTableMigration),
            Box::new(m20240401_000002_create_mod_versions::ModVersionTableMigration),
        ]
    }
}
