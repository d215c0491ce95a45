//! Hidden-app filtering and grid search.
//!
//! Hidden entries are matched loosely so that `/Applications/Safari.app`,
//! `Safari.app` and a moved copy of the bundle all hide the same record.
//! The substring rules can hide an app whose name merely occurs inside an
//! unrelated hidden path; that behavior is kept for compatibility with
//! existing preference files.

use std::path::Path;

use log::debug;

use crate::models::ApplicationRecord;

/// Returns the records not hidden by any entry of `hidden_paths`, in catalog order.
pub fn filter_visible(
    catalog: &[ApplicationRecord],
    hidden_paths: &[String],
) -> Vec<ApplicationRecord> {
    let hidden: Vec<HiddenEntry<'_>> = hidden_paths
        .iter()
        .map(|path| HiddenEntry::parse(path))
        .collect();

    catalog
        .iter()
        .filter(|record| match hidden.iter().find(|entry| entry.hides(record)) {
            Some(entry) => {
                debug!(
                    "hiding {} (matched hidden path {})",
                    record.display_name, entry.raw
                );
                false
            }
            None => true,
        })
        .cloned()
        .collect()
}

/// Case-insensitive substring search over display names. An empty query matches everything;
/// whitespace in the query is significant.
pub fn search_visible(visible: &[ApplicationRecord], query: &str) -> Vec<ApplicationRecord> {
    if query.is_empty() {
        return visible.to_vec();
    }
    let needle = query.to_lowercase();

    visible
        .iter()
        .filter(|record| record.display_name.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

struct HiddenEntry<'a> {
    raw: &'a str,
    lowered: String,
    stem: String,
}

impl<'a> HiddenEntry<'a> {
    fn parse(raw: &'a str) -> Self {
        let file_name = Path::new(raw)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            raw,
            lowered: raw.to_lowercase(),
            stem: file_name.replace(".app", "").trim().to_lowercase(),
        }
    }

    fn hides(&self, record: &ApplicationRecord) -> bool {
        let name = record.display_name.trim().to_lowercase();
        if name.is_empty() {
            return false;
        }

        if self.lowered.contains(&name) {
            return true;
        }
        // An empty stem is a substring of every identifier.
        !self.stem.is_empty()
            && (name == self.stem || record.identifier.to_lowercase().contains(&self.stem))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn record(name: &str, identifier: &str) -> ApplicationRecord {
        ApplicationRecord {
            identifier: identifier.to_string(),
            display_name: name.to_string(),
            icon: None,
            source_path: PathBuf::from(format!("/Applications/{name}.app")),
        }
    }

    fn names(records: &[ApplicationRecord]) -> Vec<&str> {
        records.iter().map(|r| r.display_name.as_str()).collect()
    }

    fn catalog() -> Vec<ApplicationRecord> {
        vec![
            record("Mail", "com.apple.mail"),
            record("Notes", "com.apple.Notes"),
            record("Safari", "com.apple.Safari"),
        ]
    }

    #[test]
    fn empty_hidden_list_keeps_catalog() {
        assert_eq!(filter_visible(&catalog(), &[]), catalog());
    }

    #[test]
    fn hides_by_full_path() {
        let visible = filter_visible(&catalog(), &["/Applications/Safari.app".to_string()]);
        assert_eq!(names(&visible), ["Mail", "Notes"]);
    }

    #[test]
    fn unmatched_entry_has_no_effect() {
        let visible = filter_visible(&catalog(), &["/Applications/Ghost.app".to_string()]);
        assert_eq!(visible, catalog());
    }

    #[test]
    fn name_match_ignores_case_and_whitespace() {
        let catalog = vec![record(" Notes ", "org.example.jot"), record("Mail", "a.b")];
        let visible = filter_visible(&catalog, &["/Users/me/Apps/NOTES.app".to_string()]);
        assert_eq!(names(&visible), ["Mail"]);
    }

    #[test]
    fn identifier_containing_stem_is_hidden() {
        let catalog = vec![
            record("Visual Studio Code", "com.microsoft.VSCode"),
            record("Mail", "a.b"),
        ];
        let visible = filter_visible(&catalog, &["/Applications/vscode.app".to_string()]);
        assert_eq!(names(&visible), ["Mail"]);
    }

    #[test]
    fn name_inside_unrelated_path_is_hidden() {
        // Known false positive: "Mail" occurs inside "Mailbox".
        let visible = filter_visible(&catalog(), &["/Applications/Mailbox Pro.app".to_string()]);
        assert_eq!(names(&visible), ["Notes", "Safari"]);
    }

    #[test]
    fn blank_stem_skips_name_and_identifier_rules() {
        let hidden = vec!["/Applications/.app".to_string(), String::new(), "/".to_string()];
        assert_eq!(filter_visible(&catalog(), &hidden), catalog());
    }

    #[test]
    fn blank_stem_still_matches_by_path() {
        let hidden = vec!["/Applications/Safari/.app".to_string()];
        let visible = filter_visible(&catalog(), &hidden);
        assert_eq!(names(&visible), ["Mail", "Notes"]);
    }

    #[test]
    fn result_is_ordered_subset() {
        let hidden = vec!["Notes.app".to_string(), "/x/Nope.app".to_string()];
        let visible = filter_visible(&catalog(), &hidden);
        let all = catalog();
        let mut cursor = all.iter();
        for kept in &visible {
            assert!(cursor.any(|candidate| candidate == kept));
        }
    }

    #[test]
    fn search_keeps_surrounding_whitespace() {
        let catalog = vec![record("Xcode", "com.apple.dt.Xcode"), record("VS Code", "x.y")];
        assert_eq!(names(&search_visible(&catalog, " code")), ["VS Code"]);
    }

    #[test]
    fn search_matches_substring_case_insensitively() {
        assert_eq!(names(&search_visible(&catalog(), "AF")), ["Safari"]);
        assert_eq!(names(&search_visible(&catalog(), "")), ["Mail", "Notes", "Safari"]);
        assert!(search_visible(&catalog(), "  ").is_empty());
        assert!(search_visible(&catalog(), "xyz").is_empty());
    }
}
