use sea_orm::{prelude::*, *};
use tracing::debug;

use crate::entities::{prelude::*, *};

/// Values written to a mod record when a file is installed.
#[derive(Clone, Debug)]
pub struct RecordValues<'a> {
    pub title: &'a str,
    pub slug: &'a str,
    pub filename: &'a str,
    pub version_id: Option<&'a str>,
}

pub async fn find_by_slug<C>(db: &C, slug: &str) -> Result<Option<installed_mod::Model>, DbErr>
where
    C: ConnectionTrait,
{
    InstalledMod::find()
        .filter(installed_mod::Column::Slug.eq(slug))
        .one(db)
        .await
}

pub async fn find_by_title<C>(db: &C, title: &str) -> Result<Option<installed_mod::Model>, DbErr>
where
    C: ConnectionTrait,
{
    InstalledMod::find()
        .filter(installed_mod::Column::Title.eq(title))
        .one(db)
        .await
}

pub async fn find_by_filename<C>(
    db: &C,
    filename: &str,
) -> Result<Option<installed_mod::Model>, DbErr>
where
    C: ConnectionTrait,
{
    InstalledMod::find()
        .filter(installed_mod::Column::Filename.eq(filename))
        .one(db)
        .await
}

pub async fn all_records<C>(db: &C) -> Result<Vec<installed_mod::Model>, DbErr>
where
    C: ConnectionTrait,
{
    InstalledMod::find()
        .order_by_asc(installed_mod::Column::Title)
        .all(db)
        .await
}

pub async fn create_record<C>(db: &C, values: RecordValues<'_>) -> Result<i32, DbErr>
where
    C: ConnectionTrait,
{
    debug!("Adding record for {}", values.slug);
    let new_mod = installed_mod::ActiveModel {
        title: ActiveValue::Set(values.title.to_string()),
        slug: ActiveValue::Set(values.slug.to_string()),
        filename: ActiveValue::Set(values.filename.to_string()),
        version_id: ActiveValue::Set(values.version_id.map(str::to_string)),
        updated: ActiveValue::Set(chrono::offset::Local::now()),
        ..Default::default()
    };
    let res = InstalledMod::insert(new_mod).exec(db).await?;
    debug!("Record ID: {}", res.last_insert_id);
    Ok(res.last_insert_id)
}

pub async fn update_record<C>(
    db: &C,
    existing: installed_mod::Model,
    values: RecordValues<'_>,
) -> Result<installed_mod::Model, DbErr>
where
    C: ConnectionTrait,
{
    debug!("Updating record for {}", existing.slug);
    let mut updated_model = existing.into_active_model();
    updated_model.title = ActiveValue::Set(values.title.to_string());
    updated_model.slug = ActiveValue::Set(values.slug.to_string());
    updated_model.filename = ActiveValue::Set(values.filename.to_string());
    updated_model.version_id = ActiveValue::Set(values.version_id.map(str::to_string));
    updated_model.updated = ActiveValue::Set(chrono::offset::Local::now());
    InstalledMod::update(updated_model).exec(db).await
}

/// Remembers a file that was replaced, and where it was archived to if it
/// was kept.
pub async fn add_history<C>(
    db: &C,
    superseded: &installed_mod::Model,
    archive_path: Option<String>,
) -> Result<i32, DbErr>
where
    C: ConnectionTrait,
{
    let entry = mod_version::ActiveModel {
        slug: ActiveValue::Set(superseded.slug.clone()),
        version_id: ActiveValue::Set(superseded.version_id.clone()),
        filename: ActiveValue::Set(superseded.filename.clone()),
        archive_path: ActiveValue::Set(archive_path),
        created: ActiveValue::Set(chrono::offset::Local::now()),
        ..Default::default()
    };
    Ok(ModVersion::insert(entry).exec(db).await?.last_insert_id)
}

pub async fn history_for<C>(db: &C, slug: &str) -> Result<Vec<mod_version::Model>, DbErr>
where
    C: ConnectionTrait,
{
    ModVersion::find()
        .filter(mod_version::Column::Slug.eq(slug))
        .order_by_desc(mod_version::Column::Id)
        .all(db)
        .await
}

/// Most recent archived file for `slug` that can be restored.
pub async fn latest_archived<C>(db: &C, slug: &str) -> Result<Option<mod_version::Model>, DbErr>
where
    C: ConnectionTrait,
{
    ModVersion::find()
        .filter(
            Condition::all()
                .add(mod_version::Column::Slug.eq(slug))
                .add(mod_version::Column::ArchivePath.is_not_null()),
        )
        .order_by_desc(mod_version::Column::Id)
        .one(db)
        .await
}

pub async fn delete_history<C>(db: &C, id: i32) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    ModVersion::delete_by_id(id).exec(db).await?;
    Ok(())
}
