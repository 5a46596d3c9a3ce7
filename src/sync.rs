//! Converges the local mods directory and record store to the newest
//! compatible file of every followed project.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use sea_orm::{DatabaseConnection, DbErr, TransactionTrait};
use thiserror::Error;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::catalog::{Catalog, CatalogError, Project};
use crate::config::Config;
use crate::entities::installed_mod;
use crate::store::{self, RecordValues};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("database error: {0}")]
    Database(#[from] DbErr),

    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("refusing to write catalog file name {0:?}")]
    InvalidFilename(String),
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> SyncError + '_ {
    move |source| SyncError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SkipReason {
    ProjectType(String),
    GameVersion,
    InstallationType,
    NoVersions,
    /// Another followed project is already recorded under the same title.
    TitleConflict(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Skipped(SkipReason),
    /// The desired file is already on disk.
    AlreadyPresent,
    /// First download for this project.
    Installed,
    /// A different file replaced the recorded one.
    Updated,
    /// The recorded file was written again under the same name.
    Reinstalled,
}

#[derive(Debug, Default)]
pub struct SyncReport {
    pub installed: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub failed: Vec<(String, SyncError)>,
}

impl SyncReport {
    fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Skipped(_) => self.skipped += 1,
            Outcome::AlreadyPresent => self.unchanged += 1,
            Outcome::Installed => self.installed += 1,
            Outcome::Updated | Outcome::Reinstalled => self.updated += 1,
        }
    }
}

pub struct Reconciler<'a, C> {
    catalog: &'a C,
    db: &'a DatabaseConnection,
    config: &'a Config,
    force: bool,
}

impl<'a, C> Reconciler<'a, C>
where
    C: Catalog + Sync,
{
    pub fn new(catalog: &'a C, db: &'a DatabaseConnection, config: &'a Config) -> Self {
        Self {
            catalog,
            db,
            config,
            force: false,
        }
    }

    /// Download the desired file even when it already exists.
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Checks every followed project. A catalog failure while listing
    /// follows means there is nothing to check.
    pub async fn run(&self) -> SyncReport {
        info!("Fetching followed projects...");
        let follows = match self.catalog.get_follows().await {
            Ok(follows) => follows,
            Err(e) => {
                error!("Failed to get followed projects: {}", e);
                return SyncReport::default();
            }
        };
        info!(
            "Found {} followed projects. Checking for updates for Minecraft {} ({})...",
            follows.len(),
            self.config.game_version(),
            self.config.loader
        );
        self.sync_all(&follows).await
    }

    pub async fn sync_all(&self, projects: &[Project]) -> SyncReport {
        let mut report = SyncReport::default();
        for project in projects {
            let span = info_span!("project", slug = %project.slug);
            match self.sync_project(project).instrument(span).await {
                Ok(outcome) => {
                    debug!("{}: {:?}", project.slug, outcome);
                    report.record(&outcome);
                }
                Err(e) => {
                    error!("Failed to update {}: {}", project.title, e);
                    report.failed.push((project.slug.clone(), e));
                }
            }
        }
        report
    }

    pub async fn sync_project(&self, project: &Project) -> Result<Outcome, SyncError> {
        if !project.project_type.is_empty() && project.project_type != "mod" {
            info!(
                "Skipping {}: project type {} is not a mod",
                project.title, project.project_type
            );
            return Ok(Outcome::Skipped(SkipReason::ProjectType(
                project.project_type.clone(),
            )));
        }

        let game_version = self.config.game_version();
        if !project.supports_game_version(game_version) {
            info!(
                "Did not find {} for game version {}",
                project.title, game_version
            );
            return Ok(Outcome::Skipped(SkipReason::GameVersion));
        }

        if !project.supports_installation(self.config.installation_type) {
            info!(
                "Skipping {}: unsupported on {}",
                project.title, self.config.installation_type
            );
            return Ok(Outcome::Skipped(SkipReason::InstallationType));
        }

        let versions = self
            .catalog
            .get_project_versions(&project.slug, game_version, &self.config.loader)
            .await?;

        let Some((version, file)) = versions
            .first()
            .and_then(|v| v.files.first().map(|f| (v, f)))
        else {
            warn!(
                "Did not find {} for game version {} ({})",
                project.title, game_version, self.config.loader
            );
            return Ok(Outcome::Skipped(SkipReason::NoVersions));
        };
        debug!(
            "Latest compatible version {} ({})",
            version.version_number, version.id
        );
        check_filename(&file.filename)?;

        let values = RecordValues {
            title: &project.title,
            slug: &project.slug,
            filename: &file.filename,
            version_id: Some(version.id.as_str()),
        };
        let existing = store::find_by_slug(self.db, &project.slug).await?;
        if let Some(other) = store::find_by_title(self.db, &project.title).await? {
            if other.slug != project.slug {
                warn!(
                    "Skipping {}: title is already used by {}",
                    project.slug, other.slug
                );
                return Ok(Outcome::Skipped(SkipReason::TitleConflict(other.slug)));
            }
        }
        let target = self.config.mods_dir().join(&file.filename);

        if !self.force && file_exists(&target).await? {
            info!("Already downloaded {}", file.filename);
            if existing.is_none() {
                store::create_record(self.db, values).await?;
            }
            return Ok(Outcome::AlreadyPresent);
        }

        info!("Downloading {}", file.url);
        let bytes = self.catalog.download_file(&file.url).await?;

        let (outcome, evicted) = match &existing {
            Some(record) if record.filename != file.filename => {
                info!(
                    "New version of {} found, replacing {}",
                    project.title, record.filename
                );
                (Outcome::Updated, Some(self.evict(record).await?))
            }
            Some(_) => (Outcome::Reinstalled, None),
            None => (Outcome::Installed, None),
        };

        write_file(&target, &bytes).await?;
        self.save_record(existing, values, evicted).await?;
        info!("Saved {}", target.display());
        Ok(outcome)
    }

    /// Points the record at the new file. `evicted` carries the archive path
    /// of a replaced file, which goes into the version history alongside.
    async fn save_record(
        &self,
        existing: Option<installed_mod::Model>,
        values: RecordValues<'_>,
        evicted: Option<Option<String>>,
    ) -> Result<(), DbErr> {
        let txn = self.db.begin().await?;
        match existing {
            Some(record) => {
                if let Some(archive_path) = evicted {
                    store::add_history(&txn, &record, archive_path).await?;
                }
                store::update_record(&txn, record, values).await?;
            }
            None => {
                store::create_record(&txn, values).await?;
            }
        }
        txn.commit().await
    }

    /// Removes or archives the file a record points to, returning where it
    /// was archived. A file that is already gone is not an error.
    async fn evict(&self, record: &installed_mod::Model) -> Result<Option<String>, SyncError> {
        check_filename(&record.filename)?;
        let old_path = self.config.mods_dir().join(&record.filename);

        let archive_path = if self.config.keep_old_versions {
            let archive_dir = self.config.archive_dir();
            tokio::fs::create_dir_all(&archive_dir)
                .await
                .map_err(io_error(&archive_dir))?;
            let archived = archive_dir.join(format!(
                "{}-{}",
                record.version_id.as_deref().unwrap_or("unknown"),
                record.filename
            ));
            match tokio::fs::rename(&old_path, &archived).await {
                Ok(()) => {
                    info!("Archived {} to {}", record.filename, archived.display());
                    Some(archived.to_string_lossy().into_owned())
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    warn!("Old file {} is already gone", old_path.display());
                    file_exists(&archived)
                        .await?
                        .then(|| archived.to_string_lossy().into_owned())
                }
                Err(e) => return Err(io_error(&old_path)(e)),
            }
        } else {
            match tokio::fs::remove_file(&old_path).await {
                Ok(()) => debug!("Deleted {}", old_path.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    warn!("Old file {} is already gone", old_path.display());
                }
                Err(e) => return Err(io_error(&old_path)(e)),
            }
            None
        };
        Ok(archive_path)
    }
}

/// Catalog file names become paths under the mods directory, so they must
/// be a single plain component.
fn check_filename(filename: &str) -> Result<(), SyncError> {
    let path = Path::new(filename);
    if filename.is_empty() || path.file_name() != Some(OsStr::new(filename)) {
        return Err(SyncError::InvalidFilename(filename.to_string()));
    }
    Ok(())
}

async fn file_exists(path: &Path) -> Result<bool, SyncError> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) => Ok(metadata.is_file()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(io_error(path)(e)),
    }
}

/// Writes through a sibling `.part` file so a failed write never leaves a
/// truncated file under the final name.
async fn write_file(path: &Path, bytes: &[u8]) -> Result<(), SyncError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(io_error(parent))?;
    }

    let mut partial = OsString::from(path.as_os_str());
    partial.push(".part");
    let partial = PathBuf::from(partial);

    if let Err(e) = tokio::fs::write(&partial, bytes).await {
        let _ = tokio::fs::remove_file(&partial).await;
        return Err(io_error(&partial)(e));
    }
    tokio::fs::rename(&partial, path)
        .await
        .map_err(io_error(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogResult, SideSupport, Version, VersionFile};
    use crate::config::{test_config, InstallationType};
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeCatalog {
        follows: Option<Vec<Project>>,
        versions: HashMap<String, Vec<Version>>,
        failing: HashSet<String>,
        files: HashMap<String, Vec<u8>>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeCatalog {
        fn with_version(mut self, slug: &str, version_id: &str, filename: &str) -> Self {
            let url = format!("https://cdn/{}", filename);
            self.files
                .insert(url.clone(), format!("contents of {}", filename).into_bytes());
            self.versions.insert(
                slug.to_string(),
                vec![Version {
                    id: version_id.to_string(),
                    version_number: version_id.to_string(),
                    files: vec![VersionFile {
                        filename: filename.to_string(),
                        url,
                        primary: true,
                        ..Default::default()
                    }],
                    ..Default::default()
                }],
            );
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn log(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }
    }

    fn unavailable(what: &str) -> CatalogError {
        CatalogError::Status {
            url: what.to_string(),
            status: 503,
        }
    }

    #[async_trait::async_trait]
    impl Catalog for FakeCatalog {
        async fn get_follows(&self) -> CatalogResult<Vec<Project>> {
            self.log("follows".to_string());
            self.follows.clone().ok_or_else(|| unavailable("follows"))
        }

        async fn get_project_versions(
            &self,
            slug: &str,
            game_version: &str,
            loader: &str,
        ) -> CatalogResult<Vec<Version>> {
            self.log(format!("versions {} {} {}", slug, game_version, loader));
            if self.failing.contains(slug) {
                return Err(unavailable(slug));
            }
            Ok(self.versions.get(slug).cloned().unwrap_or_default())
        }

        async fn get_project(&self, id_or_slug: &str) -> CatalogResult<Project> {
            self.log(format!("project {}", id_or_slug));
            Err(unavailable(id_or_slug))
        }

        async fn get_version_by_hash(&self, sha1: &str) -> CatalogResult<Version> {
            self.log(format!("hash {}", sha1));
            Err(unavailable(sha1))
        }

        async fn download_file(&self, url: &str) -> CatalogResult<Vec<u8>> {
            self.log(format!("download {}", url));
            self.files.get(url).cloned().ok_or_else(|| unavailable(url))
        }
    }

    fn project(slug: &str, title: &str) -> Project {
        Project {
            id: format!("id-{}", slug),
            slug: slug.to_string(),
            title: title.to_string(),
            project_type: "mod".to_string(),
            game_versions: vec!["1.20.1".to_string()],
            client_side: SideSupport::Required,
            server_side: SideSupport::Optional,
        }
    }

    struct Fixture {
        dir: tempfile::TempDir,
        db: DatabaseConnection,
        config: Config,
    }

    impl Fixture {
        async fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let config = test_config(dir.path());
            let db = crate::util::open_database(&config.database_path())
                .await
                .unwrap();
            Self { dir, db, config }
        }

        fn mod_file(&self, name: &str) -> PathBuf {
            self.dir.path().join("mods").join(name)
        }

        fn put_mod_file(&self, name: &str, contents: &str) {
            std::fs::create_dir_all(self.dir.path().join("mods")).unwrap();
            std::fs::write(self.mod_file(name), contents).unwrap();
        }

        async fn record(&self, slug: &str) -> Option<installed_mod::Model> {
            store::find_by_slug(&self.db, slug).await.unwrap()
        }

        async fn seed_record(&self, filename: &str, version_id: &str) {
            store::create_record(
                &self.db,
                RecordValues {
                    title: "Foo",
                    slug: "foo",
                    filename,
                    version_id: Some(version_id),
                },
            )
            .await
            .unwrap();
        }
    }

    #[tokio::test]
    async fn first_sight_downloads_and_records() {
        let fx = Fixture::new().await;
        let catalog = FakeCatalog::default().with_version("foo", "v10", "foo-1.0.jar");
        let reconciler = Reconciler::new(&catalog, &fx.db, &fx.config);

        let outcome = reconciler.sync_project(&project("foo", "Foo")).await.unwrap();
        assert_eq!(outcome, Outcome::Installed);

        let record = fx.record("foo").await.unwrap();
        assert_eq!(record.title, "Foo");
        assert_eq!(record.filename, "foo-1.0.jar");
        assert_eq!(record.version_id.as_deref(), Some("v10"));
        assert_eq!(
            std::fs::read_to_string(fx.mod_file("foo-1.0.jar")).unwrap(),
            "contents of foo-1.0.jar"
        );
        assert!(!fx.mod_file("foo-1.0.jar.part").exists());
        assert_eq!(
            catalog.calls(),
            vec![
                "versions foo 1.20.1 fabric".to_string(),
                "download https://cdn/foo-1.0.jar".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn existing_file_is_not_downloaded_again() {
        let fx = Fixture::new().await;
        fx.put_mod_file("foo-1.0.jar", "already here");
        fx.seed_record("foo-1.0.jar", "v10").await;
        let before = fx.record("foo").await.unwrap();
        let catalog = FakeCatalog::default().with_version("foo", "v10", "foo-1.0.jar");

        let outcome = Reconciler::new(&catalog, &fx.db, &fx.config)
            .sync_project(&project("foo", "Foo"))
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::AlreadyPresent);
        assert_eq!(fx.record("foo").await.unwrap(), before);
        assert_eq!(
            std::fs::read_to_string(fx.mod_file("foo-1.0.jar")).unwrap(),
            "already here"
        );
        assert!(!catalog.calls().iter().any(|c| c.starts_with("download")));
    }

    #[tokio::test]
    async fn existing_file_without_record_is_adopted() {
        let fx = Fixture::new().await;
        fx.put_mod_file("foo-1.0.jar", "already here");
        let catalog = FakeCatalog::default().with_version("foo", "v10", "foo-1.0.jar");

        let outcome = Reconciler::new(&catalog, &fx.db, &fx.config)
            .sync_project(&project("foo", "Foo"))
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::AlreadyPresent);
        assert_eq!(fx.record("foo").await.unwrap().filename, "foo-1.0.jar");
        assert!(!catalog.calls().iter().any(|c| c.starts_with("download")));
    }

    #[tokio::test]
    async fn new_version_replaces_old_file() {
        let fx = Fixture::new().await;
        fx.put_mod_file("foo-0.9.jar", "old");
        fx.seed_record("foo-0.9.jar", "v09").await;
        let catalog = FakeCatalog::default().with_version("foo", "v10", "foo-1.0.jar");
        let reconciler = Reconciler::new(&catalog, &fx.db, &fx.config);

        let outcome = reconciler.sync_project(&project("foo", "Foo")).await.unwrap();
        assert_eq!(outcome, Outcome::Updated);
        assert!(!fx.mod_file("foo-0.9.jar").exists());
        assert!(fx.mod_file("foo-1.0.jar").exists());
        let record = fx.record("foo").await.unwrap();
        assert_eq!(record.filename, "foo-1.0.jar");
        assert_eq!(record.version_id.as_deref(), Some("v10"));

        let history = store::history_for(&fx.db, "foo").await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].filename, "foo-0.9.jar");
        assert_eq!(history[0].archive_path, None);

        // unchanged remote data makes the second run a no-op
        let again = reconciler.sync_project(&project("foo", "Foo")).await.unwrap();
        assert_eq!(again, Outcome::AlreadyPresent);
        assert_eq!(
            catalog
                .calls()
                .iter()
                .filter(|c| c.starts_with("download"))
                .count(),
            1
        );
        assert_eq!(store::history_for(&fx.db, "foo").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn old_versions_can_be_archived() {
        let mut fx = Fixture::new().await;
        fx.config.keep_old_versions = true;
        fx.put_mod_file("foo-0.9.jar", "old");
        fx.seed_record("foo-0.9.jar", "v09").await;
        let catalog = FakeCatalog::default().with_version("foo", "v10", "foo-1.0.jar");

        let outcome = Reconciler::new(&catalog, &fx.db, &fx.config)
            .sync_project(&project("foo", "Foo"))
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Updated);

        let archived = fx.dir.path().join("mods/versions/v09-foo-0.9.jar");
        assert_eq!(std::fs::read_to_string(&archived).unwrap(), "old");
        assert!(!fx.mod_file("foo-0.9.jar").exists());
        let history = store::history_for(&fx.db, "foo").await.unwrap();
        assert_eq!(
            history[0].archive_path.as_deref(),
            Some(&*archived.to_string_lossy())
        );
    }

    #[tokio::test]
    async fn missing_old_file_does_not_block_update() {
        let fx = Fixture::new().await;
        fx.seed_record("foo-0.9.jar", "v09").await;
        let catalog = FakeCatalog::default().with_version("foo", "v10", "foo-1.0.jar");

        let outcome = Reconciler::new(&catalog, &fx.db, &fx.config)
            .sync_project(&project("foo", "Foo"))
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Updated);
        assert_eq!(fx.record("foo").await.unwrap().filename, "foo-1.0.jar");
    }

    #[tokio::test]
    async fn wrong_game_version_makes_no_calls() {
        let fx = Fixture::new().await;
        let catalog = FakeCatalog::default().with_version("foo", "v10", "foo-1.0.jar");
        let mut foo = project("foo", "Foo");
        foo.game_versions = vec!["1.19".to_string()];

        let outcome = Reconciler::new(&catalog, &fx.db, &fx.config)
            .sync_project(&foo)
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Skipped(SkipReason::GameVersion));
        assert!(catalog.calls().is_empty());
        assert!(fx.record("foo").await.is_none());
    }

    #[tokio::test]
    async fn unsupported_installation_is_skipped() {
        let fx = Fixture::new().await;
        let catalog = FakeCatalog::default().with_version("foo", "v10", "foo-1.0.jar");
        let mut foo = project("foo", "Foo");
        foo.client_side = SideSupport::Unsupported;

        let outcome = Reconciler::new(&catalog, &fx.db, &fx.config)
            .sync_project(&foo)
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Skipped(SkipReason::InstallationType));
        assert!(catalog.calls().is_empty());

        let mut config = fx.config.clone();
        config.installation_type = InstallationType::Server;
        let outcome = Reconciler::new(&catalog, &fx.db, &config)
            .sync_project(&foo)
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Installed);
    }

    #[tokio::test]
    async fn non_mod_projects_are_skipped() {
        let fx = Fixture::new().await;
        let catalog = FakeCatalog::default();
        let mut shader = project("glow", "Glow");
        shader.project_type = "shader".to_string();

        let outcome = Reconciler::new(&catalog, &fx.db, &fx.config)
            .sync_project(&shader)
            .await
            .unwrap();
        assert_eq!(
            outcome,
            Outcome::Skipped(SkipReason::ProjectType("shader".to_string()))
        );
        assert!(catalog.calls().is_empty());
    }

    #[tokio::test]
    async fn empty_versions_are_skipped() {
        let fx = Fixture::new().await;
        let mut catalog = FakeCatalog::default();
        catalog.versions.insert("foo".to_string(), vec![]);
        catalog.versions.insert(
            "bar".to_string(),
            vec![Version {
                id: "v1".to_string(),
                ..Default::default()
            }],
        );
        let reconciler = Reconciler::new(&catalog, &fx.db, &fx.config);

        for slug in ["foo", "bar"] {
            let outcome = reconciler.sync_project(&project(slug, slug)).await.unwrap();
            assert_eq!(outcome, Outcome::Skipped(SkipReason::NoVersions));
            assert!(fx.record(slug).await.is_none());
        }
    }

    #[tokio::test]
    async fn failures_do_not_stop_the_run() {
        let fx = Fixture::new().await;
        let mut catalog = FakeCatalog::default()
            .with_version("bar", "b1", "bar-1.0.jar")
            .with_version("baz", "z1", "baz-1.0.jar");
        catalog.failing.insert("foo".to_string());
        catalog.versions.get_mut("baz").unwrap()[0].files[0].filename = "../baz.jar".to_string();
        let mut old = project("old", "Old");
        old.game_versions = vec!["1.16.5".to_string()];

        let report = Reconciler::new(&catalog, &fx.db, &fx.config)
            .sync_all(&[
                project("foo", "Foo"),
                project("baz", "Baz"),
                old,
                project("bar", "Bar"),
            ])
            .await;

        assert_eq!(report.installed, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.failed.len(), 2);
        assert_eq!(report.failed[0].0, "foo");
        assert!(matches!(report.failed[0].1, SyncError::Catalog(_)));
        assert!(matches!(report.failed[1].1, SyncError::InvalidFilename(_)));
        assert!(fx.mod_file("bar-1.0.jar").exists());
        assert!(!fx.dir.path().join("baz.jar").exists());
    }

    #[tokio::test]
    async fn filesystem_errors_fail_only_their_project() {
        let fx = Fixture::new().await;
        std::fs::write(fx.dir.path().join("mods"), b"not a directory").unwrap();
        let catalog = FakeCatalog::default()
            .with_version("a", "a1", "a-1.0.jar")
            .with_version("b", "b1", "b-1.0.jar");
        let mut old = project("old", "Old");
        old.game_versions = vec!["1.16.5".to_string()];

        let report = Reconciler::new(&catalog, &fx.db, &fx.config)
            .sync_all(&[project("a", "A"), project("b", "B"), old])
            .await;

        assert_eq!(report.skipped, 1);
        assert_eq!(report.failed.len(), 2);
        assert_eq!(report.failed[0].0, "a");
        assert_eq!(report.failed[1].0, "b");
        assert!(report
            .failed
            .iter()
            .all(|(_, e)| matches!(e, SyncError::Io { .. })));
        assert!(fx.record("a").await.is_none());
        assert!(fx.record("b").await.is_none());
    }

    #[tokio::test]
    async fn duplicate_titles_are_skipped_before_download() {
        let fx = Fixture::new().await;
        let catalog = FakeCatalog::default()
            .with_version("a", "a1", "a-1.0.jar")
            .with_version("b", "b1", "b-1.0.jar");
        let projects = [project("a", "Same"), project("b", "Same")];
        let reconciler = Reconciler::new(&catalog, &fx.db, &fx.config);

        let report = reconciler.sync_all(&projects).await;
        assert_eq!(report.installed, 1);
        assert_eq!(report.skipped, 1);
        assert!(report.failed.is_empty());
        assert!(fx.mod_file("a-1.0.jar").exists());
        assert!(!fx.mod_file("b-1.0.jar").exists());
        assert!(fx.record("b").await.is_none());
        assert!(!catalog.calls().contains(&"download https://cdn/b-1.0.jar".to_string()));

        let outcome = reconciler.sync_project(&projects[1]).await.unwrap();
        assert_eq!(
            outcome,
            Outcome::Skipped(SkipReason::TitleConflict("a".to_string()))
        );

        let again = reconciler.sync_all(&projects).await;
        assert_eq!(again.unchanged, 1);
        assert_eq!(again.skipped, 1);
        assert!(again.failed.is_empty());
    }

    #[tokio::test]
    async fn failed_write_after_archiving_records_history_once() {
        let mut fx = Fixture::new().await;
        fx.config.keep_old_versions = true;
        fx.put_mod_file("foo-0.9.jar", "old");
        fx.seed_record("foo-0.9.jar", "v09").await;
        std::fs::create_dir(fx.mod_file("foo-1.0.jar.part")).unwrap();
        let catalog = FakeCatalog::default().with_version("foo", "v10", "foo-1.0.jar");
        let reconciler = Reconciler::new(&catalog, &fx.db, &fx.config);

        let result = reconciler.sync_project(&project("foo", "Foo")).await;
        assert!(matches!(result, Err(SyncError::Io { .. })));
        assert_eq!(fx.record("foo").await.unwrap().filename, "foo-0.9.jar");
        assert!(store::history_for(&fx.db, "foo").await.unwrap().is_empty());

        std::fs::remove_dir(fx.mod_file("foo-1.0.jar.part")).unwrap();
        let outcome = reconciler.sync_project(&project("foo", "Foo")).await.unwrap();
        assert_eq!(outcome, Outcome::Updated);
        assert_eq!(fx.record("foo").await.unwrap().filename, "foo-1.0.jar");

        let archived = fx.dir.path().join("mods/versions/v09-foo-0.9.jar");
        let history = store::history_for(&fx.db, "foo").await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(
            history[0].archive_path.as_deref(),
            Some(&*archived.to_string_lossy())
        );
        assert_eq!(std::fs::read_to_string(&archived).unwrap(), "old");
    }

    #[tokio::test]
    async fn failed_download_keeps_old_file() {
        let fx = Fixture::new().await;
        fx.put_mod_file("foo-0.9.jar", "old");
        fx.seed_record("foo-0.9.jar", "v09").await;
        let mut catalog = FakeCatalog::default().with_version("foo", "v10", "foo-1.0.jar");
        catalog.files.clear();

        let result = Reconciler::new(&catalog, &fx.db, &fx.config)
            .sync_project(&project("foo", "Foo"))
            .await;
        assert!(matches!(result, Err(SyncError::Catalog(_))));
        assert!(fx.mod_file("foo-0.9.jar").exists());
        assert_eq!(fx.record("foo").await.unwrap().filename, "foo-0.9.jar");
    }

    #[tokio::test]
    async fn force_rewrites_present_file() {
        let fx = Fixture::new().await;
        fx.put_mod_file("foo-1.0.jar", "stale bytes");
        fx.seed_record("foo-1.0.jar", "v10").await;
        let catalog = FakeCatalog::default().with_version("foo", "v10", "foo-1.0.jar");

        let outcome = Reconciler::new(&catalog, &fx.db, &fx.config)
            .force(true)
            .sync_project(&project("foo", "Foo"))
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Reinstalled);
        assert_eq!(
            std::fs::read_to_string(fx.mod_file("foo-1.0.jar")).unwrap(),
            "contents of foo-1.0.jar"
        );
    }

    #[tokio::test]
    async fn unavailable_follows_mean_no_work() {
        let fx = Fixture::new().await;
        let catalog = FakeCatalog::default();
        let report = Reconciler::new(&catalog, &fx.db, &fx.config).run().await;
        assert_eq!(report.installed + report.updated + report.skipped, 0);
        assert!(report.failed.is_empty());
        assert_eq!(catalog.calls(), vec!["follows".to_string()]);
    }

    #[tokio::test]
    async fn run_processes_follows() {
        let fx = Fixture::new().await;
        let mut catalog = FakeCatalog::default().with_version("foo", "v10", "foo-1.0.jar");
        catalog.follows = Some(vec![project("foo", "Foo")]);

        let report = Reconciler::new(&catalog, &fx.db, &fx.config).run().await;
        assert_eq!(report.installed, 1);
        assert!(fx.mod_file("foo-1.0.jar").exists());
    }
}
