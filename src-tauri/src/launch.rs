use std::{
    path::{Path, PathBuf},
    process::{Child, Command},
    thread::{self, JoinHandle},
    time::Duration,
};

use log::{debug, info, warn};

use crate::{
    error::{LaunchpadError, Result},
    models::ApplicationRecord,
};

/// Delay between issuing an open request and quitting the launcher.
pub const QUIT_DELAY_AFTER_LAUNCH: Duration = Duration::from_millis(100);
/// Delay before the process restarts itself after settings changed.
pub const RESTART_DELAY: Duration = Duration::from_millis(500);

/// Directories probed, in order, when the identifier cannot be resolved.
const FALLBACK_DIRS: &[&str] = &[
    "/System/Applications",
    "/Applications",
    "/Applications/Utilities",
];

/// Platform hooks used to start applications.
pub trait AppOpener {
    /// Locates the bundle registered for `identifier`.
    fn locate(&self, identifier: &str) -> Option<PathBuf>;

    /// Starts opening `path` without waiting for the application to come up.
    fn open(&self, path: &Path) -> Result<()>;

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchOutcome {
    Opened(PathBuf),
    NotFound,
}

/// Opens `record`, resolving by identifier first and by well-known paths second.
pub fn open_application(opener: &dyn AppOpener, record: &ApplicationRecord) -> LaunchOutcome {
    if let Some(path) = opener.locate(&record.identifier) {
        match opener.open(&path) {
            Ok(()) => {
                info!("opening {} from {}", record.identifier, path.display());
                return LaunchOutcome::Opened(path);
            }
            Err(err) => warn!("failed to open {}: {err}", record.display_name),
        }
    }

    for candidate in fallback_candidates(&record.display_name) {
        if !opener.exists(&candidate) {
            continue;
        }
        match opener.open(&candidate) {
            Ok(()) => {
                info!("opening {} from {}", record.display_name, candidate.display());
                return LaunchOutcome::Opened(candidate);
            }
            Err(err) => warn!("failed to open {}: {err}", candidate.display()),
        }
    }

    warn!("application not found: {}", record.display_name);
    LaunchOutcome::NotFound
}

/// Issues the open request, then runs `quit` after [`QUIT_DELAY_AFTER_LAUNCH`]
/// whatever the outcome.
pub fn open_then_quit<F>(
    opener: &dyn AppOpener,
    record: &ApplicationRecord,
    quit: F,
) -> (LaunchOutcome, JoinHandle<()>)
where
    F: FnOnce() + Send + 'static,
{
    let outcome = open_application(opener, record);
    (outcome, schedule(QUIT_DELAY_AFTER_LAUNCH, quit))
}

/// Runs `action` on a background thread after `delay`.
pub fn schedule<F>(delay: Duration, action: F) -> JoinHandle<()>
where
    F: FnOnce() + Send + 'static,
{
    thread::spawn(move || {
        thread::sleep(delay);
        action();
    })
}

fn fallback_candidates(display_name: &str) -> Vec<PathBuf> {
    FALLBACK_DIRS
        .iter()
        .map(|dir| Path::new(dir).join(format!("{display_name}.app")))
        .collect()
}

/// Opens applications through LaunchServices' command-line tools.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemOpener;

impl AppOpener for SystemOpener {
    fn locate(&self, identifier: &str) -> Option<PathBuf> {
        spotlight_locate(identifier)
    }

    fn open(&self, path: &Path) -> Result<()> {
        let child = Command::new("open")
            .arg(path)
            .spawn()
            .map_err(|err| LaunchpadError::Launch {
                target: path.display().to_string(),
                message: err.to_string(),
            })?;
        reap_in_background(child, path.display().to_string());
        Ok(())
    }
}

/// Asks Spotlight for the bundle registered under `identifier`.
pub(crate) fn spotlight_locate(identifier: &str) -> Option<PathBuf> {
    // Generated fallback tokens are never registered with the system.
    if identifier.is_empty() || identifier.starts_with("unknown.") {
        return None;
    }

    let query = format!(
        "kMDItemCFBundleIdentifier == \"{}\"",
        identifier.replace(['"', '\\'], "")
    );
    let output = Command::new("mdfind")
        .arg(query)
        .output()
        .map_err(|err| debug!("mdfind unavailable: {err}"))
        .ok()?;
    if !output.status.success() {
        return None;
    }

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::trim)
        .find(|line| line.ends_with(".app"))
        .map(PathBuf::from)
}

fn reap_in_background(mut child: Child, target: String) {
    thread::spawn(move || match child.wait() {
        Ok(status) if status.success() => debug!("open request for {target} completed"),
        Ok(status) => warn!("open request for {target} failed: {status}"),
        Err(err) => warn!("open request for {target} failed: {err}"),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{cell::RefCell, sync::mpsc};

    #[derive(Default)]
    struct FakeOpener {
        located: Option<PathBuf>,
        existing: Vec<PathBuf>,
        broken: Vec<PathBuf>,
        opened: RefCell<Vec<PathBuf>>,
    }

    impl AppOpener for FakeOpener {
        fn locate(&self, _identifier: &str) -> Option<PathBuf> {
            self.located.clone()
        }

        fn open(&self, path: &Path) -> Result<()> {
            if self.broken.iter().any(|broken| broken == path) {
                return Err(LaunchpadError::Launch {
                    target: path.display().to_string(),
                    message: "refused".into(),
                });
            }
            self.opened.borrow_mut().push(path.to_path_buf());
            Ok(())
        }

        fn exists(&self, path: &Path) -> bool {
            self.existing.iter().any(|existing| existing == path)
        }
    }

    fn chess() -> ApplicationRecord {
        ApplicationRecord {
            identifier: "com.apple.Chess".into(),
            display_name: "Chess".into(),
            icon: None,
            source_path: PathBuf::from("/System/Applications/Chess.app"),
        }
    }

    #[test]
    fn identifier_resolution_wins() {
        let opener = FakeOpener {
            located: Some(PathBuf::from("/Volumes/Apps/Chess.app")),
            existing: vec![PathBuf::from("/Applications/Chess.app")],
            ..FakeOpener::default()
        };

        let outcome = open_application(&opener, &chess());

        assert_eq!(outcome, LaunchOutcome::Opened(PathBuf::from("/Volumes/Apps/Chess.app")));
        assert_eq!(opener.opened.borrow().len(), 1);
    }

    #[test]
    fn falls_back_to_known_directories_in_order() {
        let opener = FakeOpener {
            existing: vec![
                PathBuf::from("/Applications/Utilities/Chess.app"),
                PathBuf::from("/Applications/Chess.app"),
            ],
            ..FakeOpener::default()
        };

        let outcome = open_application(&opener, &chess());

        assert_eq!(outcome, LaunchOutcome::Opened(PathBuf::from("/Applications/Chess.app")));
    }

    #[test]
    fn failed_open_tries_fallbacks() {
        let located = PathBuf::from("/Volumes/Gone/Chess.app");
        let opener = FakeOpener {
            located: Some(located.clone()),
            broken: vec![located],
            existing: vec![PathBuf::from("/System/Applications/Chess.app")],
            ..FakeOpener::default()
        };

        let outcome = open_application(&opener, &chess());

        assert_eq!(
            outcome,
            LaunchOutcome::Opened(PathBuf::from("/System/Applications/Chess.app"))
        );
    }

    #[test]
    fn gives_up_quietly() {
        let opener = FakeOpener::default();
        assert_eq!(open_application(&opener, &chess()), LaunchOutcome::NotFound);
        assert!(opener.opened.borrow().is_empty());
    }

    #[test]
    fn quits_after_open_even_when_not_found() {
        let (sender, receiver) = mpsc::channel();
        let (outcome, handle) = open_then_quit(&FakeOpener::default(), &chess(), move || {
            sender.send(()).unwrap();
        });

        handle.join().unwrap();
        assert_eq!(outcome, LaunchOutcome::NotFound);
        assert!(receiver.try_recv().is_ok());
    }

    #[test]
    fn fallback_tokens_are_never_looked_up() {
        assert_eq!(spotlight_locate("unknown.0000"), None);
        assert_eq!(spotlight_locate(""), None);
    }
}
