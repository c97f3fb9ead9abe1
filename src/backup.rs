use crate::error::BackupError;
use crate::path_validator::validate_backup_path;
use crate::tasks::{DeferredTask, TaskQueue};
use anyhow::Result;
use chrono::NaiveDateTime;
use std::fs;
use std::path::{Path, PathBuf};

/// `yyyy_MM_dd_HH_mm_ss_fff`; millisecond precision keeps names unique within one process.
pub const TIMESTAMP_FORMAT: &str = "%Y_%m_%d_%H_%M_%S_%3f";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupArtifact {
    pub path: PathBuf,
    pub directory: PathBuf,
    pub pattern: String,
}

pub fn backup_file_name(document_name: &str, stamp: NaiveDateTime, extension: &str) -> String {
    format!("{document_name} v.{}.{extension}", stamp.format(TIMESTAMP_FORMAT))
}

pub fn backup_pattern(extension: &str) -> String {
    format!("*.{extension}")
}

/// Turns a document name into a single safe path component. Separators, drive colons and
/// characters hosts reject become `_`; names that would climb the tree fall back to `untitled`.
pub fn sanitize_component(name: &str) -> String {
    let trimmed = name.trim();
    let sanitized = trimmed
        .chars()
        .map(|ch| match ch {
            '/' | '\\' | ':' | '<' | '>' | '"' | '|' | '?' | '*' => '_',
            ch if ch.is_control() => '_',
            ch => ch,
        })
        .collect::<String>();
    if sanitized.is_empty() || sanitized.chars().all(|ch| ch == '.') {
        "untitled".to_string()
    } else {
        sanitized
    }
}

/// Writes timestamped copies under `<root>/<relative>/<owner>/<document>/`.
pub struct BackupWriter<'a> {
    trusted_root: &'a Path,
    owner_id: &'a str,
}

impl<'a> BackupWriter<'a> {
    pub fn new(trusted_root: &'a Path, owner_id: &'a str) -> Self {
        Self { trusted_root, owner_id }
    }

    /// Resolves the per-document backup directory. The relative path is validated on every
    /// call because the setting can change between writes.
    pub fn directory_for(&self, relative_path: &str, document_name: &str) -> Result<PathBuf, BackupError> {
        let base = validate_backup_path(relative_path, self.trusted_root)?;
        Ok(base.join(self.owner_id).join(document_name))
    }

    pub fn write<F>(
        &self,
        relative_path: &str,
        document_name: &str,
        extension: &str,
        stamp: NaiveDateTime,
        payload: F,
        tasks: &mut TaskQueue,
    ) -> Result<BackupArtifact, BackupError>
    where
        F: FnOnce(&Path) -> Result<()>,
    {
        let directory = self.directory_for(relative_path, document_name)?;
        fs::create_dir_all(&directory)
            .map_err(|source| BackupError::CreateDir { path: directory.clone(), source })?;
        let path = directory.join(backup_file_name(document_name, stamp, extension));
        payload(&path).map_err(|err| BackupError::Payload { path: path.clone(), reason: format!("{err:#}") })?;
        let pattern = backup_pattern(extension);
        tasks.push(DeferredTask::Prune {
            directory: directory.clone(),
            pattern: pattern.clone(),
            written: path.clone(),
        });
        Ok(BackupArtifact { path, directory, pattern })
    }
}
