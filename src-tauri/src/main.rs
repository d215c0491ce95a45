use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use launchpad_lib::{
    config,
    launch::{self, LaunchOutcome, SystemOpener},
    AboutInfo, AppState, ApplicationRecord, CatalogBuilder, HiddenAppRegistry, LaunchpadError,
    RefreshReason,
};

#[derive(Parser)]
#[command(name = "launchpad", version, about = "Full-screen application launcher for macOS")]
struct Cli {
    /// Scan these directories instead of the standard Applications folders
    #[arg(long = "apps-dir", value_name = "DIR", global = true)]
    apps_dirs: Vec<PathBuf>,

    /// Directory holding settings.json
    #[arg(long, value_name = "DIR", global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// List the applications shown in the grid
    List {
        /// Include hidden applications
        #[arg(long)]
        all: bool,
        /// Only names containing this text
        #[arg(long, short)]
        search: Option<String>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
        /// Embed icons as PNG data URLs (JSON only)
        #[arg(long, requires = "json")]
        icons: bool,
    },
    /// Manage hidden applications
    Hidden {
        #[command(subcommand)]
        action: HiddenAction,
    },
    /// Open an application by bundle identifier
    Open { identifier: String },
    /// Show product information
    About,
    /// Start the full-screen launcher (default when built with the desktop feature)
    Ui,
}

#[derive(Subcommand)]
enum HiddenAction {
    /// Print hidden paths with their index
    List,
    /// Hide the bundle at PATH
    Add { path: String },
    /// Unhide every entry equal to PATH
    Remove { path: String },
    /// Unhide the entry at INDEX
    RemoveAt {
        #[arg(allow_negative_numbers = true)]
        index: i64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_filter = if matches!(cli.command, None | Some(Command::Ui)) {
        "info"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match cli.command {
        None | Some(Command::Ui) => run_ui(&cli),
        Some(Command::List {
            all,
            ref search,
            json,
            icons,
        }) => list(&cli, all, search.as_deref(), json, icons),
        Some(Command::Hidden { ref action }) => hidden(&cli, action),
        Some(Command::Open { ref identifier }) => open(&cli, identifier),
        Some(Command::About) => {
            about();
            Ok(())
        }
    }
}

fn build_state(cli: &Cli, load_icons: bool) -> AppState {
    let builder = if cli.apps_dirs.is_empty() {
        CatalogBuilder::default()
    } else {
        CatalogBuilder::new(cli.apps_dirs.clone())
    };
    let registry = HiddenAppRegistry::load(config::config_path(cli.config_dir.as_deref()));
    AppState::new(builder.with_icons(load_icons), registry)
}

#[cfg(feature = "desktop")]
fn run_ui(cli: &Cli) -> Result<()> {
    launchpad_lib::run(build_state(cli, true)).context("error while running tauri application")
}

#[cfg(not(feature = "desktop"))]
fn run_ui(_cli: &Cli) -> Result<()> {
    bail!(
        "this build has no desktop front end; rebuild with `--features desktop` \
         or run `launchpad list`"
    )
}

fn list(cli: &Cli, all: bool, search: Option<&str>, json: bool, icons: bool) -> Result<()> {
    let state = build_state(cli, icons);
    let snapshot = state.refresh(RefreshReason::Manual);
    let source = if all { &snapshot.catalog } else { &snapshot.visible };
    let records = launchpad_lib::search_visible(source, search.unwrap_or_default());

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }
    for record in &records {
        println!("{}", format_row(record));
    }
    Ok(())
}

fn format_row(record: &ApplicationRecord) -> String {
    format!(
        "{}\t{}\t{}",
        record.display_name,
        record.identifier,
        record.source_path.display()
    )
}

fn hidden(cli: &Cli, action: &HiddenAction) -> Result<()> {
    let state = build_state(cli, false);
    match action {
        HiddenAction::List => {}
        HiddenAction::Add { path } => match state.add_hidden(path) {
            Ok(true) => println!("hidden: {path}"),
            Ok(false) => println!("already hidden: {path}"),
            Err(err) if err.is_user_error() => bail!("{err}"),
            Err(err) => return Err(err).context("failed to hide application"),
        },
        HiddenAction::Remove { path } => {
            let removed = state.remove_hidden(path).context("failed to unhide application")?;
            println!("removed {removed} entr{}", if removed == 1 { "y" } else { "ies" });
        }
        HiddenAction::RemoveAt { index } => {
            match state.remove_hidden_at(*index).context("failed to unhide application")? {
                Some(removed) => println!("removed: {removed}"),
                None => println!("no entry at index {index}"),
            }
        }
    }

    for (index, path) in state.hidden_paths().iter().enumerate() {
        println!("{index}\t{path}");
    }
    Ok(())
}

fn open(cli: &Cli, identifier: &str) -> Result<()> {
    let state = build_state(cli, false);
    state.refresh(RefreshReason::Manual);
    let record = state
        .find(identifier)
        .ok_or_else(|| LaunchpadError::UnknownApplication(identifier.to_string()))?;

    match launch::open_application(&SystemOpener, &record) {
        LaunchOutcome::Opened(path) => {
            println!("opened {}", path.display());
            Ok(())
        }
        LaunchOutcome::NotFound => bail!("could not find {} on disk", record.display_name),
    }
}

fn about() {
    let info = AboutInfo::default();
    println!("{} {}", info.name, info.version);
    println!("by {}", info.author);
    println!("{}", info.description);
    println!("{}", info.homepage);
}
