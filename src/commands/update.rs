use colored::Colorize;
use tracing::info;

use crate::catalog::ModrinthClient;
use crate::config::Config;
use crate::sync::Reconciler;

pub async fn update(config: &Config, force: bool) -> crate::Result<()> {
    config.validate_for_sync()?;

    let database_path = config.database_path();
    let db = crate::util::open_database(&database_path).await?;
    info!("Database initialized: {}", database_path.display());

    let client = ModrinthClient::new(config)?;
    let report = Reconciler::new(&client, &db, config)
        .force(force)
        .run()
        .await;

    println!(
        "Finished. Installed {}, updated {}, unchanged {}, skipped {}, failed {}.",
        report.installed.to_string().green().bold(),
        report.updated.to_string().blue().bold(),
        report.unchanged.to_string().bold(),
        report.skipped.to_string().yellow(),
        report.failed.len().to_string().red().bold()
    );
    for (slug, error) in report.failed.iter() {
        eprintln!("  {} {}", slug.red().bold(), error);
    }
    Ok(())
}
