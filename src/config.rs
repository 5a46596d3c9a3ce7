use std::path::PathBuf;

use clap::ValueEnum;
use thiserror::Error;

pub const DEFAULT_LOADER: &str = "fabric";
pub const DEFAULT_API_URL: &str = "https://api.modrinth.com/v2/";
pub const DEFAULT_USER_AGENT: &str = concat!("modsync/", env!("CARGO_PKG_VERSION"));

/// Deployment context a mod build has to support.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum InstallationType {
    Client,
    Server,
    Both,
}

impl std::fmt::Display for InstallationType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            InstallationType::Client => write!(f, "client"),
            InstallationType::Server => write!(f, "server"),
            InstallationType::Both => write!(f, "both"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("MINECRAFT_VERSION must be set")]
    MissingGameVersion,
    #[error("MODRINTH_API_KEY must be set")]
    MissingApiKey,
    #[error("loader must not be empty")]
    EmptyLoader,
    #[error("loader {0:?} has leading or trailing whitespace")]
    LoaderWhitespace(String),
}

/// Settings shared by every command, read once at startup from flags,
/// the environment and an optional `.env` file.
#[derive(clap::Args, Debug, Clone)]
pub struct Config {
    /// Minecraft version to install mods for
    #[arg(long, env = "MINECRAFT_VERSION", global = true)]
    pub game_version: Option<String>,

    /// Installation the mods are meant for
    #[arg(
        long,
        env = "MINECRAFT_INSTALLATION_TYPE",
        value_enum,
        default_value_t = InstallationType::Server,
        global = true
    )]
    pub installation_type: InstallationType,

    /// Mod loader to filter versions by
    #[arg(long, env = "MINECRAFT_LOADER", default_value = DEFAULT_LOADER, global = true)]
    pub loader: String,

    /// Modrinth personal access token
    #[arg(long, env = "MODRINTH_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// User agent sent with every request
    #[arg(long, env = "USERAGENT", default_value = DEFAULT_USER_AGENT, global = true)]
    pub user_agent: String,

    /// Modrinth user whose follows are checked (defaults to the token owner)
    #[arg(long, env = "MODRINTH_USER", global = true)]
    pub modrinth_user: Option<String>,

    /// Minecraft directory containing the mods folder and the database
    #[arg(long, env = "MINECRAFT_DIR", default_value = ".", global = true)]
    pub minecraft_dir: PathBuf,

    /// Archive replaced mod files instead of deleting them
    #[arg(
        long,
        env = "KEEP_OLD_VERSIONS",
        default_value_t = false,
        action = clap::ArgAction::Set,
        value_parser = clap::builder::BoolishValueParser::new(),
        global = true
    )]
    pub keep_old_versions: bool,

    #[arg(long, env = "MODRINTH_API_URL", default_value = DEFAULT_API_URL, hide = true, global = true)]
    pub api_url: String,
}

impl Config {
    pub fn mods_dir(&self) -> PathBuf {
        self.minecraft_dir.join("mods")
    }

    pub fn archive_dir(&self) -> PathBuf {
        self.mods_dir().join("versions")
    }

    pub fn database_path(&self) -> PathBuf {
        self.minecraft_dir.join("mods.db")
    }

    /// Checks the settings the catalog needs for authenticated requests.
    pub fn validate_for_catalog(&self) -> Result<(), ConfigError> {
        match self.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => Ok(()),
            _ => Err(ConfigError::MissingApiKey),
        }
    }

    /// Checks everything an update run depends on. The loader is compared
    /// verbatim against the catalog, so stray whitespace is rejected here
    /// rather than trimmed.
    pub fn validate_for_sync(&self) -> Result<(), ConfigError> {
        match self.game_version.as_deref() {
            Some(version) if !version.trim().is_empty() => {}
            _ => return Err(ConfigError::MissingGameVersion),
        }
        if self.loader.is_empty() {
            return Err(ConfigError::EmptyLoader);
        }
        if self.loader.trim() != self.loader {
            return Err(ConfigError::LoaderWhitespace(self.loader.clone()));
        }
        self.validate_for_catalog()
    }

    pub fn game_version(&self) -> &str {
        self.game_version.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
pub(crate) fn test_config(minecraft_dir: &std::path::Path) -> Config {
    Config {
        game_version: Some("1.20.1".to_string()),
        installation_type: InstallationType::Client,
        loader: DEFAULT_LOADER.to_string(),
        api_key: Some("mrp_test".to_string()),
        user_agent: "modsync-tests".to_string(),
        modrinth_user: None,
        minecraft_dir: minecraft_dir.to_path_buf(),
        keep_old_versions: false,
        api_url: DEFAULT_API_URL.to_string(),
    }
}
