use serde::Deserialize;

use crate::config::InstallationType;

/// How a project supports one side of an installation.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SideSupport {
    Required,
    Optional,
    Unsupported,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Debug, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub username: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Project {
    #[serde(default)]
    pub id: String,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub project_type: String,
    #[serde(default)]
    pub game_versions: Vec<String>,
    #[serde(default)]
    pub client_side: SideSupport,
    #[serde(default)]
    pub server_side: SideSupport,
}

impl Project {
    pub fn supports_game_version(&self, game_version: &str) -> bool {
        self.game_versions.iter().any(|v| v == game_version)
    }

    pub fn supports_installation(&self, installation: InstallationType) -> bool {
        match installation {
            InstallationType::Client => self.client_side != SideSupport::Unsupported,
            InstallationType::Server => self.server_side != SideSupport::Unsupported,
            InstallationType::Both => {
                self.client_side != SideSupport::Unsupported
                    || self.server_side != SideSupport::Unsupported
            }
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Version {
    pub id: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub version_number: String,
    #[serde(default)]
    pub files: Vec<VersionFile>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct VersionFile {
    pub filename: String,
    pub url: String,
    #[serde(default)]
    pub primary: bool,
}
