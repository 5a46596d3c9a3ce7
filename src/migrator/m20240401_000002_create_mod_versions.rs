use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct ModVersionTableMigration;

#[async_trait::async_trait]
impl MigrationTrait for ModVersionTableMigration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ModVersion::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ModVersion::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ModVersion::Slug).string().not_null())
                    .col(ColumnDef::new(ModVersion::VersionId).string().null())
                    .col(ColumnDef::new(ModVersion::Filename).string().not_null())
                    .col(ColumnDef::new(ModVersion::ArchivePath).string().null())
                    .col(ColumnDef::new(ModVersion::Created).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx-mod_versions-slug")
                    .table(ModVersion::Table)
                    .col(ModVersion::Slug)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ModVersion::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ModVersion {
    #[sea_orm(iden = "mod_versions")]
    Table,
    Id,
    Slug,
    VersionId,
    Filename,
    ArchivePath,
    Created,
}
