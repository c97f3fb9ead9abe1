use crate::controller::LOG_TARGET;
use crate::error::BackupError;
use globset::Glob;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Suffix of the metadata file some hosts keep next to every asset.
pub const SIDECAR_SUFFIX: &str = ".meta";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PruneOutcome {
    /// The directory held `count` matches, which is within the limit.
    WithinLimit { count: usize },
    Removed { path: PathBuf, sidecar_removed: bool },
}

/// Deletes the single oldest file in `directory` whose name matches `pattern` once the match
/// count exceeds `limit`.
///
/// Pruning runs after every write, so the backlog never exceeds `limit + 1` and removing one
/// file per call keeps the directory bounded without sorting it.
pub fn prune_oldest(directory: &Path, pattern: &str, limit: usize) -> Result<PruneOutcome, BackupError> {
    let limit = limit.max(1);
    let matcher = Glob::new(pattern)
        .map_err(|source| BackupError::Pattern { pattern: pattern.to_string(), source })?
        .compile_matcher();
    let entries = fs::read_dir(directory)
        .map_err(|source| BackupError::ListDir { path: directory.to_path_buf(), source })?;

    let mut count = 0usize;
    let mut oldest: Option<(SystemTime, PathBuf)> = None;
    for entry in entries {
        let entry = entry.map_err(|source| BackupError::ListDir { path: directory.to_path_buf(), source })?;
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if !file_type.is_file() || !matcher.is_match(entry.file_name()) {
            continue;
        }
        count += 1;
        let modified = entry.metadata().and_then(|meta| meta.modified()).unwrap_or(SystemTime::UNIX_EPOCH);
        match &oldest {
            Some((time, _)) if modified >= *time => {}
            _ => oldest = Some((modified, entry.path())),
        }
    }

    if count <= limit {
        return Ok(PruneOutcome::WithinLimit { count });
    }
    let Some((_, path)) = oldest else {
        return Ok(PruneOutcome::WithinLimit { count });
    };
    fs::remove_file(&path).map_err(|source| BackupError::Delete { path: path.clone(), source })?;
    let sidecar = sidecar_path(&path);
    let sidecar_removed = match fs::remove_file(&sidecar) {
        Ok(()) => true,
        Err(err) if err.kind() == io::ErrorKind::NotFound => false,
        Err(err) => {
            log::warn!(target: LOG_TARGET, "Could not remove sidecar {}: {err}", sidecar.display());
            false
        }
    };
    Ok(PruneOutcome::Removed { path, sidecar_removed })
}

pub fn sidecar_path(path: &Path) -> PathBuf {
    let mut raw = path.as_os_str().to_os_string();
    raw.push(SIDECAR_SUFFIX);
    PathBuf::from(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::Duration;
    use tempfile::tempdir;

    fn write_aged(dir: &Path, name: &str, age_secs: u64) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, name.as_bytes()).expect("write file");
        let stamp = SystemTime::now() - Duration::from_secs(age_secs);
        File::options().write(true).open(&path).expect("open").set_modified(stamp).expect("set mtime");
        path
    }

    #[test]
    fn removes_only_the_oldest_match() {
        let dir = tempdir().expect("temp dir");
        for idx in 0..12u64 {
            write_aged(dir.path(), &format!("Level v.{idx:02}.scene"), 1_000 - idx * 10);
        }
        let oldest = dir.path().join("Level v.00.scene");
        let outcome = prune_oldest(dir.path(), "*.scene", 10).expect("prune");
        assert_eq!(outcome, PruneOutcome::Removed { path: oldest.clone(), sidecar_removed: false });
        assert!(!oldest.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 11);
    }

    #[test]
    fn within_limit_is_a_no_op() {
        let dir = tempdir().expect("temp dir");
        for idx in 0..3u64 {
            write_aged(dir.path(), &format!("a{idx}.scene"), idx);
        }
        let outcome = prune_oldest(dir.path(), "*.scene", 3).expect("prune");
        assert_eq!(outcome, PruneOutcome::WithinLimit { count: 3 });
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 3);
    }

    #[test]
    fn ignores_files_outside_the_pattern_and_removes_sidecar() {
        let dir = tempdir().expect("temp dir");
        let oldest = write_aged(dir.path(), "old.prefab", 500);
        fs::write(sidecar_path(&oldest), b"guid").expect("sidecar");
        write_aged(dir.path(), "new.prefab", 10);
        write_aged(dir.path(), "ancient.scene", 9_000);
        let outcome = prune_oldest(dir.path(), "*.prefab", 1).expect("prune");
        assert_eq!(outcome, PruneOutcome::Removed { path: oldest.clone(), sidecar_removed: true });
        assert!(!sidecar_path(&oldest).exists());
        assert!(dir.path().join("ancient.scene").exists());
    }

    #[test]
    fn undeletable_sidecar_is_reported_not_fatal() {
        let dir = tempdir().expect("temp dir");
        let oldest = write_aged(dir.path(), "old.prefab", 500);
        let sidecar = sidecar_path(&oldest);
        fs::create_dir(&sidecar).expect("sidecar dir");
        fs::write(sidecar.join("keep"), b"x").expect("sidecar content");
        write_aged(dir.path(), "new.prefab", 10);
        let outcome = prune_oldest(dir.path(), "*.prefab", 1).expect("prune");
        assert_eq!(outcome, PruneOutcome::Removed { path: oldest.clone(), sidecar_removed: false });
        assert!(!oldest.exists());
        assert!(sidecar.exists());
    }

    #[test]
    fn missing_directory_is_reported() {
        let dir = tempdir().expect("temp dir");
        let err = prune_oldest(&dir.path().join("missing"), "*.scene", 1).unwrap_err();
        assert!(matches!(err, BackupError::ListDir { .. }));
    }
}
