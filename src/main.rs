mod catalog;
mod commands;
mod config;
mod entities;
mod migrator;
mod store;
mod sync;
mod util;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Keeps followed Modrinth mods up to date
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Args {
    #[command(flatten)]
    config: config::Config,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Checks followed mods and downloads new versions (the default)
    Update {
        /// Download the newest file even if it is already present
        #[arg(short, long)]
        force: bool,
    },
    /// Lists tracked mods
    List {
        /// Show detailed information
        #[arg(short, long)]
        details: bool,
    },
    /// Restores the most recently archived version of a mod
    Rollback {
        /// Project slug of the mod to roll back
        slug: String,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Adds records for mod files already in the mods directory
    Import,
    /// Initializes the database
    Initialize {
        /// Replace an existing database, if found
        #[arg(short, long)]
        force: bool,
    },
}

/// Loads `.env` first so a `RUST_LOG` set there reaches the log filter.
fn load_environment<T>(
    load: impl FnOnce() -> dotenvy::Result<T>,
) -> (EnvFilter, dotenvy::Result<T>) {
    let loaded = load();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));
    (filter, loaded)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let (filter, dotenv) = load_environment(dotenvy::dotenv);
    tracing_subscriber::fmt().with_env_filter(filter).init();
    if let Err(e) = dotenv {
        if !e.not_found() {
            warn!("Failed to read .env file: {}", e);
        }
    }
    info!("Starting modsync version {}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();
    let config = args.config;
    match args.command.unwrap_or(Command::Update { force: false }) {
        Command::Update { force } => commands::update(&config, force).await,
        Command::List { details } => commands::list(&config, details).await,
        Command::Rollback { slug, yes } => commands::rollback(&config, &slug, yes).await,
        Command::Import => commands::import(&config).await,
        Command::Initialize { force } => {
            util::init_database(&config.database_path(), force).await
        }
    }
}
