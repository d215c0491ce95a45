use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::{
    config::AppConfig,
    error::{LaunchpadError, Result},
};

const BUNDLE_SUFFIX: &str = ".app";

/// The persisted list of hidden application paths.
///
/// Every mutation is written to disk before it returns. When the write fails
/// the in-memory list is restored, so the two never disagree.
#[derive(Debug, Clone)]
pub struct HiddenAppRegistry {
    path: PathBuf,
    config: AppConfig,
}

impl HiddenAppRegistry {
    /// Loads the registry stored at `path`, empty when nothing was saved yet.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let config = AppConfig::load(&path);
        info!(
            "loaded {} hidden application paths from {}",
            config.hidden_apps.len(),
            path.display()
        );
        Self { path, config }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> &[String] {
        &self.config.hidden_apps
    }

    pub fn len(&self) -> usize {
        self.config.hidden_apps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.config.hidden_apps.is_empty()
    }

    /// Appends `path` unless an identical entry exists. Returns whether the list changed.
    pub fn add(&mut self, path: &str) -> Result<bool> {
        if self.config.hidden_apps.iter().any(|entry| entry == path) {
            return Ok(false);
        }
        self.mutate(|entries| entries.push(path.to_string()))?;
        info!("hid application path {path}");
        Ok(true)
    }

    /// Removes every entry equal to `path`. Returns how many were removed.
    pub fn remove(&mut self, path: &str) -> Result<usize> {
        let before = self.len();
        if !self.config.hidden_apps.iter().any(|entry| entry == path) {
            return Ok(0);
        }
        self.mutate(|entries| entries.retain(|entry| entry != path))?;
        let removed = before - self.len();
        info!("unhid application path {path}, {} remaining", self.len());
        Ok(removed)
    }

    /// Removes the entry at `index`, failing with `IndexOutOfRange` outside `[0, len)`.
    pub fn remove_at(&mut self, index: i64) -> Result<String> {
        let len = self.len();
        let position = usize::try_from(index)
            .ok()
            .filter(|position| *position < len)
            .ok_or(LaunchpadError::IndexOutOfRange { index, len })?;

        let mut removed = String::new();
        self.mutate(|entries| removed = entries.remove(position))?;
        info!("unhid application path {removed}, {} remaining", self.len());
        Ok(removed)
    }

    fn mutate(&mut self, change: impl FnOnce(&mut Vec<String>)) -> Result<()> {
        let previous = self.config.hidden_apps.clone();
        change(&mut self.config.hidden_apps);
        if let Err(err) = self.config.save(&self.path) {
            warn!("failed to persist hidden applications: {err}");
            self.config.hidden_apps = previous;
            return Err(err);
        }
        Ok(())
    }
}

/// Checks a user-entered path before it is added to the registry.
pub fn validate_candidate(path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(LaunchpadError::EmptyPath);
    }
    if !path.ends_with(BUNDLE_SUFFIX) {
        return Err(LaunchpadError::InvalidBundleSuffix(path.to_string()));
    }
    if !Path::new(path).exists() {
        return Err(LaunchpadError::BundleNotFound(path.to_string()));
    }
    Ok(())
}
