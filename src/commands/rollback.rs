use std::path::{Path, PathBuf};

use colored::*;
use inquire::Confirm;
use sea_orm::DatabaseConnection;
use tracing::{info, warn};
use tracing_unwrap::OptionExt;

use crate::config::Config;
use crate::entities::{installed_mod, mod_version};
use crate::store::{self, RecordValues};
use crate::Result as CrateResult;

pub async fn rollback(config: &Config, slug: &str, yes: bool) -> CrateResult<()> {
    let db = crate::util::open_existing_database(&config.database_path()).await?;

    let Some(current) = store::find_by_slug(&db, slug).await? else {
        eprintln!("Mod not found in database: {}", slug);
        return Err(std::io::Error::from(std::io::ErrorKind::NotFound).into());
    };
    let Some(previous) = store::latest_archived(&db, slug).await? else {
        eprintln!("No archived versions found for {}", current.title.bold());
        return Err(std::io::Error::from(std::io::ErrorKind::NotFound).into());
    };

    if !yes
        && !Confirm::new(
            format!(
                "Replace {} with {}?",
                current.filename.yellow().bold(),
                previous.filename.green().bold()
            )
            .as_str(),
        )
        .with_default(false)
        .prompt()?
    {
        println!("Leaving {} unchanged", current.title);
        return Ok(());
    }

    let restored = restore_previous(&db, &config.mods_dir(), current, previous).await?;
    println!(
        "Rolled back {} to {}",
        restored.title.bold(),
        restored.filename.green()
    );
    Ok(())
}

/// Swaps the current file of a mod for a copy of an archived one and points
/// the record at it. The archive stays in place; its history entry is removed.
pub async fn restore_previous(
    db: &DatabaseConnection,
    mods_dir: &Path,
    current: installed_mod::Model,
    previous: mod_version::Model,
) -> CrateResult<installed_mod::Model> {
    let archive_path = PathBuf::from(
        previous
            .archive_path
            .as_deref()
            .expect_or_log("Archived version has no archive path"),
    );
    if !archive_path.is_file() {
        eprintln!("Archive file not found: {}", archive_path.display());
        return Err(std::io::Error::from(std::io::ErrorKind::NotFound).into());
    }

    let current_path = mods_dir.join(&current.filename);
    info!("Removing current version {}", current_path.display());
    if let Err(e) = tokio::fs::remove_file(&current_path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            return Err(e.into());
        }
        warn!("Current file {} was already gone", current_path.display());
    }

    let target = mods_dir.join(&previous.filename);
    info!(
        "Restoring {} from {}",
        previous.filename,
        archive_path.display()
    );
    tokio::fs::copy(&archive_path, &target).await?;

    let title = current.title.clone();
    let slug = current.slug.clone();
    let restored = store::update_record(
        db,
        current,
        RecordValues {
            title: &title,
            slug: &slug,
            filename: &previous.filename,
            version_id: previous.version_id.as_deref(),
        },
    )
    .await?;
    store::delete_history(db, previous.id).await?;
    Ok(restored)
}
