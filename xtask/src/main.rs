use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use xshell::{cmd, Shell};

#[derive(Parser)]
#[command(name = "cargo-xtask", version, about = "Launchpad automation tasks")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Format the workspace
    Fmt,
    /// Check formatting and run clippy on the CLI and desktop builds
    Check,
    /// Run the test suite
    Test,
    /// Bundle Launchpad.app
    Package,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let project_root = project_root()?;
    let shell = Shell::new()?;
    let _dir = shell.push_dir(&project_root);

    match cli.command {
        Command::Fmt => run_fmt(&shell),
        Command::Check => run_check(&shell),
        Command::Test => run_test(&shell),
        Command::Package => run_package(&shell, &project_root),
    }
}

fn run_fmt(shell: &Shell) -> Result<()> {
    cmd!(shell, "cargo fmt --all")
        .run()
        .context("failed to run cargo fmt")
}

fn run_check(shell: &Shell) -> Result<()> {
    cmd!(shell, "cargo fmt --all -- --check")
        .run()
        .context("cargo fmt --check failed")?;
    cmd!(shell, "cargo clippy --workspace --all-targets -- -D warnings")
        .run()
        .context("cargo clippy failed")?;
    cmd!(
        shell,
        "cargo clippy -p launchpad --all-targets --features desktop -- -D warnings"
    )
    .run()
    .context("cargo clippy (desktop) failed")?;
    Ok(())
}

fn run_test(shell: &Shell) -> Result<()> {
    cmd!(shell, "cargo test --workspace")
        .run()
        .context("tests failed")
}

fn run_package(shell: &Shell, project_root: &Path) -> Result<()> {
    let _dir = shell.push_dir(project_root.join("src-tauri"));
    cmd!(shell, "cargo tauri build --features desktop")
        .run()
        .context("tauri build failed")
}

fn project_root() -> Result<PathBuf> {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .map(Path::to_path_buf)
        .context("xtask must live inside the workspace")
}
