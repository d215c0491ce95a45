use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use log::{debug, warn};
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};
use uuid::Uuid;

use crate::{
    bundle_utils::{icns_to_data_url, locate_icns, BundleInfo},
    models::ApplicationRecord,
};

/// Application domains, in dedup priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppDomain {
    Local,
    System,
    User,
}

impl AppDomain {
    pub const ALL: [AppDomain; 3] = [AppDomain::Local, AppDomain::System, AppDomain::User];

    /// The `Applications` directory of this domain.
    pub fn applications_dir(self) -> Option<PathBuf> {
        match self {
            AppDomain::Local => Some(PathBuf::from("/Applications")),
            AppDomain::System => Some(PathBuf::from("/System/Applications")),
            AppDomain::User => dirs::home_dir().map(|home| home.join("Applications")),
        }
    }
}

pub fn default_scan_roots() -> Vec<PathBuf> {
    AppDomain::ALL
        .iter()
        .filter_map(|domain| domain.applications_dir())
        .collect()
}

/// Scans application directories into a deduplicated, name-sorted catalog.
///
/// Every call rescans the filesystem; nothing is cached between builds.
#[derive(Debug, Clone)]
pub struct CatalogBuilder {
    roots: Vec<PathBuf>,
    load_icons: bool,
}

impl Default for CatalogBuilder {
    fn default() -> Self {
        Self::new(default_scan_roots())
    }
}

impl CatalogBuilder {
    /// `roots` are scanned in the given order; earlier roots win identifier collisions.
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self {
            roots,
            load_icons: true,
        }
    }

    pub fn with_icons(mut self, load_icons: bool) -> Self {
        self.load_icons = load_icons;
        self
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn build(&self) -> Vec<ApplicationRecord> {
        let mut results = Vec::new();
        for root in &self.roots {
            let found = scan_directory(root, self.load_icons);
            debug!("indexed {} bundles in {}", found.len(), root.display());
            results.extend(found);
        }

        // De-duplicate by identifier, keeping the record from the earliest root.
        let mut seen = HashSet::new();
        results.retain(|app| seen.insert(app.identifier.clone()));
        sort_by_name(&mut results);
        results
    }
}

/// Builds the catalog from the standard application directories.
pub fn build_catalog() -> Vec<ApplicationRecord> {
    CatalogBuilder::default().build()
}

/// Orders records the way Finder lists names: letters compare by their base
/// form first, so accents and case only break ties.
pub(crate) fn sort_by_name(records: &mut [ApplicationRecord]) {
    records.sort_by_cached_key(|record| {
        let name = &record.display_name;
        (fold_name(name), name.to_lowercase(), name.clone())
    });
}

fn fold_name(name: &str) -> String {
    name.nfkd()
        .filter(|ch| !is_combining_mark(*ch))
        .flat_map(char::to_lowercase)
        .collect()
}

fn scan_directory(root: &Path, load_icons: bool) -> Vec<ApplicationRecord> {
    if !root.exists() {
        debug!("skipping missing application directory {}", root.display());
        return Vec::new();
    }

    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(err) => {
            warn!("failed to scan {}: {err}", root.display());
            return Vec::new();
        }
    };

    let mut bundles: Vec<PathBuf> = entries
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry.path()),
            Err(err) => {
                warn!("failed to read entry in {}: {err}", root.display());
                None
            }
        })
        .filter(|path| is_app_bundle(path))
        .collect();
    bundles.sort();

    bundles
        .iter()
        .map(|bundle| read_bundle(bundle, load_icons))
        .collect()
}

fn is_app_bundle(path: &Path) -> bool {
    let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
        return false;
    };
    if file_name.starts_with('.') {
        return false;
    }

    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("app"))
        && path.is_dir()
}

fn read_bundle(bundle: &Path, load_icons: bool) -> ApplicationRecord {
    let info = BundleInfo::read(bundle);

    let stem = bundle
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let display_name = info
        .as_ref()
        .and_then(|info| {
            info.string("CFBundleDisplayName")
                .or_else(|| info.string("CFBundleName"))
        })
        .unwrap_or(stem);

    let identifier = info
        .as_ref()
        .and_then(|info| info.string("CFBundleIdentifier"))
        .unwrap_or_else(fallback_identifier);

    let icon = if load_icons {
        locate_icns(bundle, info.as_ref()).and_then(|path| icns_to_data_url(&path))
    } else {
        None
    };

    ApplicationRecord {
        identifier,
        display_name,
        icon,
        source_path: bundle.to_path_buf(),
    }
}

fn fallback_identifier() -> String {
    format!("unknown.{}", Uuid::new_v4())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle_utils::tests::{icns_with, sample_png};

    #[test]
    fn sort_ignores_case() {
        let mut records: Vec<ApplicationRecord> = ["notes", "Mail", "safari", "Calendar"]
            .into_iter()
            .map(|name| ApplicationRecord {
                identifier: name.to_lowercase(),
                display_name: name.to_string(),
                icon: None,
                source_path: PathBuf::from(format!("/Applications/{name}.app")),
            })
            .collect();
        sort_by_name(&mut records);

        let names: Vec<_> = records.iter().map(|r| r.display_name.as_str()).collect();
        assert_eq!(names, ["Calendar", "Mail", "notes", "safari"]);
    }

    #[test]
    fn accented_names_sort_with_their_base_letter() {
        let mut records: Vec<ApplicationRecord> =
            ["Zoom", "Éclair", "FaceTime", "apple", "Ångström", "eclair"]
                .into_iter()
                .map(|name| ApplicationRecord {
                    identifier: name.to_string(),
                    display_name: name.to_string(),
                    icon: None,
                    source_path: PathBuf::from(format!("/Applications/{name}.app")),
                })
                .collect();
        sort_by_name(&mut records);

        let names: Vec<_> = records.iter().map(|r| r.display_name.as_str()).collect();
        assert_eq!(names, ["Ångström", "apple", "eclair", "Éclair", "FaceTime", "Zoom"]);
    }

    #[test]
    fn fallback_identifiers_are_unique() {
        let first = fallback_identifier();
        assert!(first.starts_with("unknown."));
        assert_ne!(first, fallback_identifier());
    }

    #[test]
    fn loads_icon_only_when_requested() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = dir.path().join("Paint.app");
        let resources = bundle.join("Contents/Resources");
        fs::create_dir_all(&resources).unwrap();
        fs::write(
            bundle.join("Contents/Info.plist"),
            "<plist><dict><key>CFBundleIdentifier</key><string>com.example.paint</string>\
             <key>CFBundleIconFile</key><string>Paint</string></dict></plist>",
        )
        .unwrap();
        fs::write(resources.join("Paint.icns"), icns_with(b"ic07", &sample_png(32))).unwrap();

        let with_icon = read_bundle(&bundle, true);
        assert!(with_icon
            .icon
            .as_deref()
            .is_some_and(|icon| icon.starts_with("data:image/png;base64,")));
        assert_eq!(with_icon.display_name, "Paint");

        assert_eq!(read_bundle(&bundle, false).icon, None);
    }
}
