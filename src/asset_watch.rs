use anyhow::{Context, Result};
use notify::event::ModifyKind;
use notify::{Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver};
use std::time::Duration;

/// Watches a content root for saved assets with backup-eligible extensions. Stands in for an
/// asset-save hook when the editor does not provide one.
pub struct AssetSaveWatcher {
    _watcher: RecommendedWatcher,
    rx: Receiver<notify::Result<Event>>,
    root: PathBuf,
    excluded: Vec<PathBuf>,
    extensions: Vec<String>,
}

impl AssetSaveWatcher {
    pub fn new(root: impl AsRef<Path>, extensions: &[String]) -> Result<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            anyhow::bail!("path '{}' is not a directory", root.display());
        }
        let (tx, rx) = channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        })?;
        watcher
            .configure(
                NotifyConfig::default()
                    .with_compare_contents(false)
                    .with_poll_interval(Duration::from_millis(300)),
            )
            .context("configure asset watcher")?;
        let root = normalize_watch_path(root);
        watcher.watch(&root, RecursiveMode::Recursive).with_context(|| format!("watch {}", root.display()))?;
        Ok(Self {
            _watcher: watcher,
            rx,
            root,
            excluded: Vec::new(),
            extensions: extensions.iter().map(|ext| ext.to_ascii_lowercase()).collect(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Ignore changes under `path`, typically the backup folder so copies do not re-trigger.
    pub fn exclude(&mut self, path: impl AsRef<Path>) {
        let normalized = normalize_watch_path(path.as_ref());
        if !self.excluded.contains(&normalized) {
            self.excluded.push(normalized);
        }
    }

    /// Paths saved since the last drain, deduplicated and sorted.
    pub fn drain_saved(&mut self) -> Vec<PathBuf> {
        let mut saved = BTreeSet::new();
        while let Ok(event) = self.rx.try_recv() {
            match event {
                Ok(event) => {
                    if !is_save_event(&event.kind) {
                        continue;
                    }
                    for path in event.paths {
                        if self.is_relevant(&path) {
                            saved.insert(path);
                        }
                    }
                }
                Err(err) => log::warn!(target: "autosave", "asset watcher error: {err}"),
            }
        }
        saved.into_iter().collect()
    }

    fn is_relevant(&self, path: &Path) -> bool {
        let normalized = normalize_watch_path(path);
        if self.excluded.iter().any(|excluded| normalized.starts_with(excluded)) {
            return false;
        }
        normalized
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(ext)))
    }
}

fn is_save_event(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Modify(ModifyKind::Data(_))
            | EventKind::Modify(ModifyKind::Name(_))
            | EventKind::Modify(ModifyKind::Any)
            | EventKind::Create(_)
    )
}

fn normalize_watch_path(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else if let Ok(cwd) = env::current_dir() {
        cwd.join(path)
    } else {
        path.to_path_buf()
    };
    match fs::canonicalize(&absolute) {
        Ok(canonical) => canonical,
        Err(_) => {
            if let Some(parent) = absolute.parent() {
                if let Ok(parent_canon) = fs::canonicalize(parent) {
                    if let Some(name) = absolute.file_name() {
                        return parent_canon.join(name);
                    }
                    return parent_canon;
                }
            }
            absolute
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, RemoveKind};
    use tempfile::tempdir;

    #[test]
    fn only_writes_count_as_saves() {
        assert!(is_save_event(&EventKind::Create(CreateKind::File)));
        assert!(is_save_event(&EventKind::Modify(ModifyKind::Any)));
        assert!(!is_save_event(&EventKind::Remove(RemoveKind::File)));
    }

    #[test]
    fn relevance_filters_extension_and_exclusions() {
        let dir = tempdir().expect("temp dir");
        let backups = dir.path().join("_project").join("AutoSave");
        fs::create_dir_all(backups.join("owner").join("Enemy")).expect("backup dir");
        let mut watcher = AssetSaveWatcher::new(dir.path(), &["prefab".to_string()]).expect("watcher");
        watcher.exclude(&backups);
        assert!(watcher.is_relevant(&dir.path().join("Enemy.prefab")));
        assert!(watcher.is_relevant(&dir.path().join("Enemy.PREFAB")));
        assert!(!watcher.is_relevant(&dir.path().join("Enemy.prefab.meta")));
        assert!(!watcher.is_relevant(&backups.join("owner").join("Enemy").join("Enemy v.1.prefab")));
    }

    #[test]
    fn rejects_missing_root() {
        let dir = tempdir().expect("temp dir");
        assert!(AssetSaveWatcher::new(dir.path().join("missing"), &[]).is_err());
    }
}
