use crate::{migrator::Migrator, Result};
use sea_orm_migration::prelude::*;
use std::io::{Error as IOError, ErrorKind as IOErrorKind};
use std::path::Path;
use tracing::{debug, info};
use tracing_unwrap::OptionExt;

async fn open_db_internal(database_path: &Path, create: bool) -> Result<sea_orm::DbConn> {
    debug!("Opening database with create = {}", create);
    debug!("Database path: {}", database_path.display());
    if create {
        if let Some(parent) = database_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    let dbpath = format!(
        "sqlite://{}?mode={}",
        database_path
            .to_str()
            .expect_or_log("Failed to parse path as UTF-8"),
        if create { "rwc" } else { "rw" }
    );
    let connect_options = sea_orm::ConnectOptions::new(dbpath);
    sea_orm::SqlxSqliteConnector::connect(connect_options)
        .await
        .map_err(|e| e.into())
}

/// Opens the record store, creating it and applying pending migrations
/// as needed.
pub async fn open_database(database_path: &Path) -> Result<sea_orm::DbConn> {
    debug!("Opening mod database");
    let db = open_db_internal(database_path, true).await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

/// Opens a database that must already exist.
pub async fn open_existing_database(database_path: &Path) -> Result<sea_orm::DbConn> {
    if !database_path.is_file() {
        return Err(IOError::new(
            IOErrorKind::NotFound,
            format!("No database at {}", database_path.display()),
        )
        .into());
    }
    let db = open_db_internal(database_path, false).await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

pub async fn init_database(database_path: &Path, force: bool) -> Result<()> {
    debug!("Initializing database");
    if database_path.is_file() {
        if force {
            info!("Deleting existing database...");
            tokio::fs::remove_file(database_path).await?;
        } else {
            return Err(IOError::new(IOErrorKind::AlreadyExists, "Database file exists!").into());
        }
    }
    info!("Opening database...");
    let db = open_db_internal(database_path, true).await?;
    info!("Initializing...");
    Migrator::refresh(&db).await?;
    Ok(())
}
