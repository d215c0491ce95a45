mod bundle_utils;
#[cfg(feature = "desktop")]
mod commands;
pub mod config;
pub mod error;
pub mod filter;
pub mod indexer;
pub mod launch;
pub mod models;
#[cfg(feature = "desktop")]
mod panels;
pub mod registry;
pub mod state;

pub use error::{LaunchpadError, Result};
pub use filter::{filter_visible, search_visible};
pub use indexer::{build_catalog, default_scan_roots, AppDomain, CatalogBuilder};
pub use models::{AboutInfo, ApplicationRecord, CatalogSnapshot, RefreshReason};
pub use registry::{validate_candidate, HiddenAppRegistry};
pub use state::{AppState, StateEvent};

#[cfg(feature = "desktop")]
use std::{sync::mpsc::Receiver, thread};

#[cfg(feature = "desktop")]
use commands::{
    add_hidden_app, close_about, finish_settings, get_about_info, get_hidden_apps, get_snapshot,
    open_about, open_app, open_homepage, open_settings, pick_hidden_app, quit_app,
    remove_hidden_app, remove_hidden_app_at, restart_app, search_apps, CATALOG_REFRESHED_EVENT,
};
#[cfg(feature = "desktop")]
use tauri::{AppHandle, Emitter, Manager};

/// Runs the full-screen launcher until the user quits.
#[cfg(feature = "desktop")]
pub fn run(state: AppState) -> tauri::Result<()> {
    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .plugin(tauri_plugin_dialog::init())
        .manage(state)
        .invoke_handler(tauri::generate_handler![
            get_snapshot,
            search_apps,
            open_app,
            get_hidden_apps,
            add_hidden_app,
            pick_hidden_app,
            remove_hidden_app,
            remove_hidden_app_at,
            finish_settings,
            get_about_info,
            open_settings,
            open_about,
            close_about,
            open_homepage,
            restart_app,
            quit_app
        ])
        .setup(|app| {
            let handle = app.handle().clone();
            let state = app.state::<AppState>();

            forward_state_events(handle.clone(), state.subscribe());
            state.refresh(RefreshReason::Startup);

            panels::install_menu(app)?;
            panels::prepare_main_window(&handle);
            Ok(())
        })
        .run(tauri::generate_context!())
}

/// Pushes every new snapshot to all webviews.
#[cfg(feature = "desktop")]
fn forward_state_events(app_handle: AppHandle, events: Receiver<StateEvent>) {
    thread::spawn(move || {
        for event in events {
            log::debug!(
                "broadcasting snapshot {} ({})",
                event.snapshot.generation,
                event.reason.as_str()
            );
            if let Err(err) = app_handle.emit(CATALOG_REFRESHED_EVENT, event.snapshot.as_ref()) {
                log::warn!("failed to broadcast catalog refresh: {err}");
            }
        }
    });
}
