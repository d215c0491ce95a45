use log::warn;
use tauri::{
    menu::{MenuBuilder, MenuItemBuilder, SubmenuBuilder},
    App, AppHandle, Manager, WebviewUrl, WebviewWindowBuilder,
};

pub const MAIN_WINDOW_LABEL: &str = "main";
const MENU_ABOUT: &str = "menu-about";
const MENU_SETTINGS: &str = "menu-settings";
const MENU_QUIT: &str = "menu-quit";

/// Secondary windows opened next to the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Settings,
    About,
}

impl Panel {
    fn label(self) -> &'static str {
        match self {
            Panel::Settings => "settings",
            Panel::About => "about",
        }
    }

    fn page(self) -> &'static str {
        match self {
            Panel::Settings => "settings.html",
            Panel::About => "about.html",
        }
    }

    fn title(self) -> &'static str {
        match self {
            Panel::Settings => "Hidden Applications",
            Panel::About => "About Launchpad",
        }
    }

    fn size(self) -> (f64, f64) {
        match self {
            Panel::Settings => (500.0, 400.0),
            Panel::About => (450.0, 520.0),
        }
    }
}

/// Shows `panel`, creating its window on first use.
pub fn show_panel(app_handle: &AppHandle, panel: Panel) -> tauri::Result<()> {
    if let Some(window) = app_handle.get_webview_window(panel.label()) {
        window.show()?;
        window.set_focus()?;
        return Ok(());
    }

    let (width, height) = panel.size();
    WebviewWindowBuilder::new(app_handle, panel.label(), WebviewUrl::App(panel.page().into()))
        .title(panel.title())
        .inner_size(width, height)
        .resizable(panel == Panel::Settings)
        .always_on_top(true)
        .center()
        .build()?
        .set_focus()
}

pub fn close_panel(app_handle: &AppHandle, panel: Panel) {
    if let Some(window) = app_handle.get_webview_window(panel.label()) {
        if let Err(err) = window.close() {
            warn!("failed to close {} panel: {err}", panel.label());
        }
    }
}

/// Strips window chrome and stretches the grid over the whole screen.
pub fn prepare_main_window(app_handle: &AppHandle) {
    let Some(window) = app_handle.get_webview_window(MAIN_WINDOW_LABEL) else {
        warn!("main window is missing");
        return;
    };

    let results = [
        window.set_decorations(false),
        window.set_always_on_top(true),
        window.set_visible_on_all_workspaces(true),
        window.set_fullscreen(true),
        window.set_focus(),
    ];
    for err in results.into_iter().filter_map(|result| result.err()) {
        warn!("failed to configure main window: {err}");
    }
}

/// Installs the application menu: about, settings and quit.
pub fn install_menu(app: &App) -> tauri::Result<()> {
    let about = MenuItemBuilder::with_id(MENU_ABOUT, "About Launchpad…")
        .accelerator("CmdOrCtrl+I")
        .build(app)?;
    let settings = MenuItemBuilder::with_id(MENU_SETTINGS, "Settings…")
        .accelerator("CmdOrCtrl+,")
        .build(app)?;
    let quit = MenuItemBuilder::with_id(MENU_QUIT, "Quit Launchpad")
        .accelerator("CmdOrCtrl+Q")
        .build(app)?;

    let app_menu = SubmenuBuilder::new(app, "Launchpad")
        .item(&about)
        .separator()
        .item(&settings)
        .separator()
        .item(&quit)
        .build()?;
    // Text fields in the settings panel need the standard editing shortcuts.
    let edit_menu = SubmenuBuilder::new(app, "Edit")
        .cut()
        .copy()
        .paste()
        .select_all()
        .build()?;

    let menu = MenuBuilder::new(app).item(&app_menu).item(&edit_menu).build()?;
    app.set_menu(menu)?;

    app.on_menu_event(|app_handle, event| {
        let shown = match event.id().as_ref() {
            MENU_ABOUT => show_panel(app_handle, Panel::About),
            MENU_SETTINGS => show_panel(app_handle, Panel::Settings),
            MENU_QUIT => {
                app_handle.exit(0);
                Ok(())
            }
            _ => Ok(()),
        };
        if let Err(err) = shown {
            warn!("menu action {} failed: {err}", event.id().as_ref());
        }
    });
    Ok(())
}
