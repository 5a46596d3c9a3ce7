use std::path::Path;

use colored::*;
use sea_orm::DatabaseConnection;
use tracing::{debug, info, warn};

use super::util::{get_file_sha1, get_jar_files};
use crate::catalog::{Catalog, ModrinthClient};
use crate::config::Config;
use crate::store::{self, RecordValues};
use crate::Result as CrateResult;

pub async fn import(config: &Config) -> CrateResult<()> {
    config.validate_for_catalog()?;
    let db = crate::util::open_database(&config.database_path()).await?;
    let client = ModrinthClient::new(config)?;

    let imported = import_installed(&client, &db, &config.mods_dir()).await?;
    println!("Imported {} mods.", imported.to_string().blue().bold());
    Ok(())
}

/// Adds records for mod files that are on disk but not tracked, identifying
/// them on Modrinth by their SHA-1.
pub async fn import_installed<C>(
    catalog: &C,
    db: &DatabaseConnection,
    mods_dir: &Path,
) -> CrateResult<usize>
where
    C: Catalog + Sync,
{
    if !mods_dir.is_dir() {
        info!("No mods directory at {}", mods_dir.display());
        return Ok(0);
    }

    info!("Scanning for existing mods...");
    let mut imported = 0;
    for path in get_jar_files(mods_dir)? {
        match import_file(catalog, db, &path).await {
            Ok(true) => imported += 1,
            Ok(false) => {}
            Err(e) => warn!("Failed to import {}: {}", path.display(), e),
        }
    }
    Ok(imported)
}

async fn import_file<C>(catalog: &C, db: &DatabaseConnection, path: &Path) -> CrateResult<bool>
where
    C: Catalog + Sync,
{
    let Some(filename) = path.file_name().and_then(|n| n.to_str()) else {
        warn!("Skipping {}: file name is not UTF-8", path.display());
        return Ok(false);
    };

    if store::find_by_filename(db, filename).await?.is_some() {
        debug!("{} is already tracked", filename);
        return Ok(false);
    }

    let hash = get_file_sha1(path)?;
    let version = match catalog.get_version_by_hash(&hash).await {
        Ok(version) => version,
        Err(e) => {
            debug!("{} not found on Modrinth by hash: {}", filename, e);
            return Ok(false);
        }
    };
    let project = catalog.get_project(&version.project_id).await?;

    if let Some(existing) = store::find_by_slug(db, &project.slug).await? {
        warn!(
            "{} belongs to {}, which is already tracked as {}",
            filename, project.slug, existing.filename
        );
        return Ok(false);
    }

    store::create_record(
        db,
        RecordValues {
            title: &project.title,
            slug: &project.slug,
            filename,
            version_id: Some(version.id.as_str()),
        },
    )
    .await?;
    info!(
        "Imported existing mod {} ({})",
        project.title, version.version_number
    );
    Ok(true)
}
