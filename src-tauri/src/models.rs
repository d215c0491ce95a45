use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One installed application as discovered by a catalog scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationRecord {
    /// Bundle identifier, or an `unknown.<uuid>` token for bundles that declare none.
    pub identifier: String,
    pub display_name: String,
    /// PNG data URL; `None` means the UI draws a placeholder glyph.
    pub icon: Option<String>,
    pub source_path: PathBuf,
}

/// Why a snapshot was (re)built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshReason {
    Startup,
    HiddenAppsChanged,
    SettingsClosed,
    Manual,
}

impl RefreshReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Startup => "startup",
            Self::HiddenAppsChanged => "hidden_apps_changed",
            Self::SettingsClosed => "settings_closed",
            Self::Manual => "manual",
        }
    }
}

/// Immutable view of everything the presentation layer renders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSnapshot {
    pub generation: u64,
    pub catalog: Vec<ApplicationRecord>,
    pub hidden_paths: Vec<String>,
    pub visible: Vec<ApplicationRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AboutInfo {
    pub name: String,
    pub version: String,
    pub author: String,
    pub description: String,
    pub homepage: String,
}

impl Default for AboutInfo {
    fn default() -> Self {
        Self {
            name: "Launchpad".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            author: "Ray".to_string(),
            description: "macOS 26 removed the built-in Launchpad. This app brings back a \
                          simple full-screen grid for starting applications."
                .to_string(),
            homepage: "https://github.com/ray1084784475/macOS26-Launchpad".to_string(),
        }
    }
}
