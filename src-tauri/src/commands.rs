use std::path::{Path, PathBuf};

use log::{info, warn};
use tauri::{AppHandle, Manager, State};
use tauri_plugin_dialog::{DialogExt, MessageDialogKind};
use tauri_plugin_opener::OpenerExt;

use crate::{
    error::{LaunchpadError, Result},
    launch::{self, AppOpener, LaunchOutcome, RESTART_DELAY},
    models::{AboutInfo, ApplicationRecord, CatalogSnapshot, RefreshReason},
    panels::{self, Panel},
    state::AppState,
};

pub const CATALOG_REFRESHED_EVENT: &str = "catalog_refreshed";

/// Opens bundles through the opener plugin, resolving identifiers with Spotlight.
struct TauriOpener<'a> {
    app_handle: &'a AppHandle,
}

impl AppOpener for TauriOpener<'_> {
    fn locate(&self, identifier: &str) -> Option<PathBuf> {
        launch::spotlight_locate(identifier)
    }

    fn open(&self, path: &Path) -> Result<()> {
        self.app_handle
            .opener()
            .open_path(path.to_string_lossy().to_string(), Option::<&str>::None)
            .map_err(|err| LaunchpadError::Launch {
                target: path.display().to_string(),
                message: err.to_string(),
            })
    }
}

#[tauri::command]
pub fn get_snapshot(state: State<'_, AppState>) -> CatalogSnapshot {
    state.snapshot().as_ref().clone()
}

#[tauri::command]
pub fn search_apps(query: String, state: State<'_, AppState>) -> Vec<ApplicationRecord> {
    state.search(&query)
}

#[tauri::command]
pub fn open_app(
    identifier: String,
    app_handle: AppHandle,
    state: State<'_, AppState>,
) -> std::result::Result<(), String> {
    let record = state
        .find(&identifier)
        .ok_or_else(|| LaunchpadError::UnknownApplication(identifier.clone()).to_string())?;

    let opener = TauriOpener {
        app_handle: &app_handle,
    };
    let quit_handle = app_handle.clone();
    let (outcome, _) = launch::open_then_quit(&opener, &record, move || quit_handle.exit(0));
    if outcome == LaunchOutcome::NotFound {
        warn!("nothing opened for {identifier}");
    }
    Ok(())
}

#[tauri::command]
pub fn get_hidden_apps(state: State<'_, AppState>) -> Vec<String> {
    state.hidden_paths()
}

#[tauri::command]
pub fn add_hidden_app(
    path: String,
    app_handle: AppHandle,
    state: State<'_, AppState>,
) -> std::result::Result<Vec<String>, String> {
    if let Err(err) = state.add_hidden(&path) {
        report_error(&app_handle, &err);
        return Err(err.to_string());
    }
    Ok(state.hidden_paths())
}

/// Lets the user pick a bundle to hide. The result arrives as a snapshot event.
#[tauri::command]
pub async fn pick_hidden_app(app_handle: AppHandle) -> std::result::Result<(), String> {
    let callback_handle = app_handle.clone();
    app_handle
        .dialog()
        .file()
        .set_directory("/Applications")
        .add_filter("Applications", &["app"])
        .pick_file(move |picked| {
            let Some(picked) = picked else {
                return;
            };
            let path = match picked.into_path() {
                Ok(path) => path,
                Err(err) => {
                    warn!("file picker returned an unusable path: {err}");
                    return;
                }
            };
            let state = callback_handle.state::<AppState>();
            if let Err(err) = state.add_hidden(&path.to_string_lossy()) {
                report_error(&callback_handle, &err);
            }
        });
    Ok(())
}

#[tauri::command]
pub fn remove_hidden_app(
    path: String,
    state: State<'_, AppState>,
) -> std::result::Result<Vec<String>, String> {
    state.remove_hidden(&path).map_err(|err| err.to_string())?;
    Ok(state.hidden_paths())
}

#[tauri::command]
pub fn remove_hidden_app_at(
    index: i64,
    state: State<'_, AppState>,
) -> std::result::Result<Vec<String>, String> {
    state.remove_hidden_at(index).map_err(|err| err.to_string())?;
    Ok(state.hidden_paths())
}

/// Closes the settings panel and rebuilds the grid.
#[tauri::command]
pub fn finish_settings(app_handle: AppHandle, state: State<'_, AppState>) {
    state.refresh(RefreshReason::SettingsClosed);
    panels::close_panel(&app_handle, Panel::Settings);
}

#[tauri::command]
pub fn get_about_info() -> AboutInfo {
    AboutInfo::default()
}

#[tauri::command]
pub async fn open_settings(app_handle: AppHandle) -> std::result::Result<(), String> {
    panels::show_panel(&app_handle, Panel::Settings).map_err(|err| err.to_string())
}

#[tauri::command]
pub async fn open_about(app_handle: AppHandle) -> std::result::Result<(), String> {
    panels::show_panel(&app_handle, Panel::About).map_err(|err| err.to_string())
}

#[tauri::command]
pub fn close_about(app_handle: AppHandle) {
    panels::close_panel(&app_handle, Panel::About);
}

/// Opens the project page in the browser and leaves.
#[tauri::command]
pub fn open_homepage(app_handle: AppHandle) -> std::result::Result<(), String> {
    app_handle
        .opener()
        .open_url(AboutInfo::default().homepage, Option::<&str>::None)
        .map_err(|err| err.to_string())?;
    app_handle.exit(0);
    Ok(())
}

#[tauri::command]
pub fn restart_app(app_handle: AppHandle) {
    info!("restarting in {RESTART_DELAY:?}");
    launch::schedule(RESTART_DELAY, move || {
        app_handle.restart();
    });
}

#[tauri::command]
pub fn quit_app(app_handle: AppHandle) {
    app_handle.exit(0);
}

fn report_error(app_handle: &AppHandle, err: &LaunchpadError) {
    let title = match err {
        LaunchpadError::InvalidBundleSuffix(_) => "Invalid path format",
        LaunchpadError::BundleNotFound(_) => "Invalid path",
        _ => "Launchpad",
    };
    let message = match err {
        LaunchpadError::InvalidBundleSuffix(_) => {
            "Application paths must end with .app".to_string()
        }
        LaunchpadError::BundleNotFound(path) => {
            format!("The application path does not exist: {path}")
        }
        other => other.to_string(),
    };
    app_handle
        .dialog()
        .message(message)
        .title(title)
        .kind(MessageDialogKind::Warning)
        .show(|_| {});
}
