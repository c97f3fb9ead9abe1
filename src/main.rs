use anyhow::{Context, Result};
use kestrel_autosave::asset_watch::AssetSaveWatcher;
use kestrel_autosave::cli::{usage, CliCommand};
use kestrel_autosave::config::{JsonSettingsFile, SettingsPort};
use kestrel_autosave::controller::AutoSaveController;
use kestrel_autosave::host::DetachedHost;
use kestrel_autosave::path_validator::validate_backup_path;
use kestrel_autosave::retention::{prune_oldest, PruneOutcome};
use kestrel_autosave::time::SystemClock;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let command = match CliCommand::parse_from_env() {
        Ok(command) => command,
        Err(err) => {
            eprintln!("[cli] {err}");
            eprintln!("{}", usage());
            std::process::exit(2);
        }
    };
    if let Err(err) = run(command) {
        eprintln!("error: {err:?}");
        std::process::exit(1);
    }
}

fn run(command: CliCommand) -> Result<()> {
    match command {
        CliCommand::Validate { root, relative } => {
            match validate_backup_path(&relative, &root) {
                Ok(resolved) => println!("{}", resolved.display()),
                Err(reason) => {
                    println!("rejected: {reason}");
                    std::process::exit(2);
                }
            }
            Ok(())
        }
        CliCommand::Prune { directory, pattern, limit } => {
            match prune_oldest(&directory, &pattern, limit).context("prune")? {
                PruneOutcome::WithinLimit { count } => println!("{count} backup(s), nothing to prune"),
                PruneOutcome::Removed { path, .. } => println!("removed {}", path.display()),
            }
            Ok(())
        }
        CliCommand::Backup { root, files, settings } => {
            let port = settings_port(settings.as_deref())?;
            let mut controller = AutoSaveController::new(DetachedHost, port, SystemClock::new(), &root);
            let report = controller.backup_modified_assets(&files);
            controller.flush_deferred();
            if let Some(reason) = &report.rejected {
                anyhow::bail!("backup path rejected: {reason}");
            }
            for path in &report.written {
                println!("wrote {}", path.display());
            }
            for path in &report.skipped {
                println!("skipped {}", path.display());
            }
            for (path, reason) in &report.failed {
                println!("failed {}: {reason}", path.display());
            }
            Ok(())
        }
        CliCommand::Watch { root, settings } => watch(&root, settings.as_deref()),
        CliCommand::Help => {
            println!("{}", usage());
            Ok(())
        }
    }
}

fn watch(root: &Path, settings: Option<&Path>) -> Result<()> {
    let port = settings_port(settings)?;
    let mut controller = AutoSaveController::new(DetachedHost, port, SystemClock::new(), root);
    let mut watcher = AssetSaveWatcher::new(root, &controller.settings().backup_extensions)?;
    match validate_backup_path(&controller.settings().backup_path, root) {
        Ok(backups) => watcher.exclude(backups),
        Err(reason) => anyhow::bail!("backup path rejected: {reason}"),
    }
    log::info!(target: "autosave", "watching {} for saved assets", watcher.root().display());
    loop {
        let saved = watcher.drain_saved();
        if !saved.is_empty() {
            let report = controller.backup_modified_assets(&saved);
            for path in &report.written {
                log::info!(target: "autosave", "wrote {}", path.display());
            }
        }
        controller.flush_deferred();
        thread::sleep(Duration::from_millis(250));
    }
}

const DEFAULT_SETTINGS_PATH: &str = "config/autosave.json";

fn settings_port(path: Option<&Path>) -> Result<JsonSettingsFile> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_PATH));
    let port = JsonSettingsFile::new(&path);
    port.load().with_context(|| format!("loading settings {}", path.display()))?;
    Ok(port)
}
