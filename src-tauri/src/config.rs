use std::{
    env,
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
    process,
};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::{LaunchpadError, Result};

const CONFIG_FILE: &str = "settings.json";
const APP_DIR_NAME: &str = "launchpad";
/// Overrides the directory holding `settings.json`.
pub const CONFIG_DIR_ENV: &str = "LAUNCHPAD_CONFIG_DIR";

/// Persisted user preferences.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    /// Paths of application bundles the user chose to hide, in insertion order.
    #[serde(default)]
    pub hidden_apps: Vec<String>,
}

impl AppConfig {
    /// Loads the preferences at `path`. A missing or unreadable file yields the defaults.
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|err| {
                warn!("ignoring malformed preferences {}: {err}", path.display());
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Writes the preferences to `path` through a temp file and rename.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| {
                LaunchpadError::io("failed to create config directory", parent, err)
            })?;
        }

        let data = serde_json::to_string_pretty(self).map_err(|err| LaunchpadError::Json {
            message: format!("failed to serialize preferences: {err}"),
            source: Some(err),
        })?;

        let temp_path = path.with_extension(format!("json.{}.tmp", process::id()));
        {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)
                .map_err(|err| LaunchpadError::io("failed to create temp file", &temp_path, err))?;
            file.write_all(data.as_bytes())
                .and_then(|_| file.sync_all())
                .map_err(|err| LaunchpadError::io("failed to write temp file", &temp_path, err))?;
        }

        fs::rename(&temp_path, path).map_err(|err| {
            let _ = fs::remove_file(&temp_path);
            LaunchpadError::io("failed to replace preferences", path, err)
        })?;

        debug!("saved preferences to {}", path.display());
        Ok(())
    }
}

/// Directory holding the preferences file.
///
/// Resolution order: `override_dir`, `$LAUNCHPAD_CONFIG_DIR`, the platform config dir.
pub fn config_dir(override_dir: Option<&Path>) -> PathBuf {
    if let Some(dir) = override_dir {
        return dir.to_path_buf();
    }
    if let Some(dir) = env::var_os(CONFIG_DIR_ENV).filter(|value| !value.is_empty()) {
        return PathBuf::from(dir);
    }
    dirs::config_dir()
        .unwrap_or_else(env::temp_dir)
        .join(APP_DIR_NAME)
}

pub fn config_path(override_dir: Option<&Path>) -> PathBuf {
    config_dir(override_dir).join(CONFIG_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(AppConfig::load(&dir.path().join(CONFIG_FILE)), AppConfig::default());
    }

    #[test]
    fn save_then_load_keeps_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);
        let config = AppConfig {
            hidden_apps: vec!["/Applications/Chess.app".into(), "/Applications/Books.app".into()],
        };

        config.save(&path).unwrap();

        assert_eq!(AppConfig::load(&path), config);
        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"hiddenApps\""));
    }

    #[test]
    fn malformed_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "{ not json").unwrap();
        assert!(AppConfig::load(&path).hidden_apps.is_empty());
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let config: AppConfig =
            serde_json::from_str(r#"{"hiddenApps":["/Applications/Tips.app"],"theme":"dark"}"#)
                .unwrap();
        assert_eq!(config.hidden_apps, ["/Applications/Tips.app"]);
    }

    #[test]
    fn explicit_override_wins() {
        let dir = Path::new("/tmp/launchpad-test-config");
        assert_eq!(config_path(Some(dir)), dir.join(CONFIG_FILE));
    }
}
