use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct InstalledModTableMigration;

#[async_trait::async_trait]
impl MigrationTrait for InstalledModTableMigration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(InstalledMod::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(InstalledMod::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(InstalledMod::Title)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(InstalledMod::Slug)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(InstalledMod::Filename).string().not_null())
                    .col(ColumnDef::new(InstalledMod::VersionId).string().null())
                    .col(ColumnDef::new(InstalledMod::Updated).timestamp().not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(InstalledMod::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum InstalledMod {
    #[sea_orm(iden = "installed_mods")]
    Table,
    Id,
    Title,
    Slug,
    Filename,
    VersionId,
    Updated,
}
