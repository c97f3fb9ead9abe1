#![allow(dead_code)]

use anyhow::{bail, Result};
use chrono::{NaiveDate, NaiveDateTime};
use kestrel_autosave::config::{AutoSaveSettings, MemorySettings};
use kestrel_autosave::time::ManualClock;
use kestrel_autosave::{AutoSaveController, DocumentHost, DocumentInfo};
use std::collections::HashSet;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

pub type TestController = AutoSaveController<FakeHost, MemorySettings, ManualClock>;

#[derive(Default)]
pub struct FakeHost {
    pub documents: Vec<DocumentInfo>,
    pub active: Option<String>,
    pub failing: HashSet<String>,
    pub saves: Vec<String>,
    pub copies: Vec<PathBuf>,
    pub asset_saves: usize,
    pub refreshed: Vec<PathBuf>,
}

impl FakeHost {
    pub fn with_documents(documents: Vec<DocumentInfo>, active: &str) -> Self {
        Self { documents, active: Some(active.to_string()), ..Self::default() }
    }

    pub fn set_dirty(&mut self, name: &str, dirty: bool) {
        if let Some(doc) = self.documents.iter_mut().find(|doc| doc.name == name) {
            doc.dirty = dirty;
        }
    }
}

impl DocumentHost for FakeHost {
    fn documents(&self) -> Vec<DocumentInfo> {
        self.documents.clone()
    }

    fn active_document(&self) -> Option<DocumentInfo> {
        let active = self.active.as_deref()?;
        self.documents.iter().find(|doc| doc.name == active).cloned()
    }

    fn save_document(&mut self, document: &DocumentInfo) -> Result<()> {
        if self.failing.contains(&document.name) {
            bail!("disk refused '{}'", document.name);
        }
        self.saves.push(document.name.clone());
        self.set_dirty(&document.name, false);
        Ok(())
    }

    fn save_document_copy(&mut self, document: &DocumentInfo, destination: &Path) -> Result<()> {
        fs::write(destination, format!("scene {}", document.name))?;
        self.copies.push(destination.to_path_buf());
        Ok(())
    }

    fn save_assets(&mut self) -> Result<()> {
        self.asset_saves += 1;
        Ok(())
    }

    fn refresh_asset(&mut self, path: &Path) {
        self.refreshed.push(path.to_path_buf());
    }
}

pub fn epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 17).unwrap().and_hms_milli_opt(9, 30, 0, 0).unwrap()
}

pub fn document(name: &str, dirty: bool) -> DocumentInfo {
    DocumentInfo::new(name, Some(PathBuf::from(format!("scenes/{name}.scene"))), dirty)
}

pub fn settings() -> AutoSaveSettings {
    AutoSaveSettings {
        interval_minutes: 1,
        owner_id: Some("owner-1".to_string()),
        debug_log: true,
        ..AutoSaveSettings::default()
    }
}

pub fn controller(root: &Path, host: FakeHost, settings: AutoSaveSettings) -> (TestController, ManualClock) {
    let clock = ManualClock::new(epoch());
    let controller = AutoSaveController::new(host, MemorySettings::new(settings), clock.clone(), root);
    (controller, clock)
}

/// Backup folder for `document` under the default settings used by these tests.
pub fn backup_dir(root: &Path, document: &str) -> PathBuf {
    fs::canonicalize(root).expect("canonical root").join("_project").join("AutoSave").join("owner-1").join(document)
}

pub fn write_aged(path: &Path, age_secs: u64) {
    fs::write(path, b"old backup").expect("write backup");
    let stamp = SystemTime::now() - Duration::from_secs(age_secs);
    File::options().write(true).open(path).expect("open").set_modified(stamp).expect("set mtime");
}

pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .expect("read dir")
        .map(|entry| entry.expect("entry").file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
