use crate::scheduler::clamp_interval;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const MIN_BACKUP_COUNT: u32 = 1;
pub const MAX_BACKUP_COUNT: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AutoSaveSettings {
    #[serde(default = "AutoSaveSettings::default_true")]
    pub auto_save: bool,
    #[serde(default = "AutoSaveSettings::default_true")]
    pub save_on_play: bool,
    #[serde(default = "AutoSaveSettings::default_true")]
    pub save_assets: bool,
    #[serde(default)]
    pub debug_log: bool,
    #[serde(default = "AutoSaveSettings::default_interval_minutes")]
    pub interval_minutes: u32,
    #[serde(default = "AutoSaveSettings::default_true")]
    pub backup_scenes: bool,
    #[serde(default = "AutoSaveSettings::default_true")]
    pub backup_prefabs: bool,
    /// Relative to the trusted root. Untrusted: validated before every use.
    #[serde(default = "AutoSaveSettings::default_backup_path")]
    pub backup_path: String,
    #[serde(default = "AutoSaveSettings::default_backup_count")]
    pub backup_count: u32,
    #[serde(default = "AutoSaveSettings::default_backup_extensions")]
    pub backup_extensions: Vec<String>,
    /// Used for documents whose storage path carries no extension.
    #[serde(default = "AutoSaveSettings::default_scene_extension")]
    pub scene_extension: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
}

impl AutoSaveSettings {
    const fn default_true() -> bool {
        true
    }

    const fn default_interval_minutes() -> u32 {
        2
    }

    fn default_backup_path() -> String {
        "_project/AutoSave".to_string()
    }

    const fn default_backup_count() -> u32 {
        10
    }

    fn default_backup_extensions() -> Vec<String> {
        vec!["prefab".to_string()]
    }

    fn default_scene_extension() -> String {
        "scene".to_string()
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read autosave settings {}", path.display()))?;
        let settings: Self = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse autosave settings {}", path.display()))?;
        Ok(settings.sanitized())
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(settings) => settings,
            Err(err) => {
                log::warn!(target: "autosave", "Settings load error: {err:?}. Falling back to defaults.");
                Self::default()
            }
        }
    }

    pub fn save_to_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Creating settings directory {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json.as_bytes())
            .with_context(|| format!("Writing autosave settings {}", path.display()))?;
        Ok(())
    }

    /// Pulls numeric fields back into range after hand edits.
    pub fn sanitized(mut self) -> Self {
        self.interval_minutes = clamp_interval(self.interval_minutes);
        self.backup_count = clamp_backup_count(self.backup_count);
        self.backup_extensions = self
            .backup_extensions
            .iter()
            .map(|ext| ext.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();
        if self.scene_extension.trim().is_empty() {
            self.scene_extension = Self::default_scene_extension();
        }
        self
    }

    /// Whether `path` has one of the backup-eligible asset extensions.
    pub fn is_backup_eligible(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.backup_extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(ext)))
    }
}

impl Default for AutoSaveSettings {
    fn default() -> Self {
        Self {
            auto_save: Self::default_true(),
            save_on_play: Self::default_true(),
            save_assets: Self::default_true(),
            debug_log: false,
            interval_minutes: Self::default_interval_minutes(),
            backup_scenes: Self::default_true(),
            backup_prefabs: Self::default_true(),
            backup_path: Self::default_backup_path(),
            backup_count: Self::default_backup_count(),
            backup_extensions: Self::default_backup_extensions(),
            scene_extension: Self::default_scene_extension(),
            owner_id: None,
        }
    }
}

pub fn clamp_backup_count(count: u32) -> u32 {
    count.clamp(MIN_BACKUP_COUNT, MAX_BACKUP_COUNT)
}

/// Where settings persist between sessions.
pub trait SettingsPort {
    fn load(&self) -> Result<AutoSaveSettings>;
    fn store(&mut self, settings: &AutoSaveSettings) -> Result<()>;
}

/// Pretty-printed JSON file. A missing file loads as defaults.
#[derive(Debug, Clone)]
pub struct JsonSettingsFile {
    path: PathBuf,
}

impl JsonSettingsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsPort for JsonSettingsFile {
    fn load(&self) -> Result<AutoSaveSettings> {
        if !self.path.exists() {
            return Ok(AutoSaveSettings::default());
        }
        AutoSaveSettings::load(&self.path)
    }

    fn store(&mut self, settings: &AutoSaveSettings) -> Result<()> {
        settings.save_to_path(&self.path)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemorySettings {
    pub settings: AutoSaveSettings,
    pub store_count: usize,
}

impl MemorySettings {
    pub fn new(settings: AutoSaveSettings) -> Self {
        Self { settings, store_count: 0 }
    }
}

impl SettingsPort for MemorySettings {
    fn load(&self) -> Result<AutoSaveSettings> {
        Ok(self.settings.clone().sanitized())
    }

    fn store(&mut self, settings: &AutoSaveSettings) -> Result<()> {
        self.settings = settings.clone();
        self.store_count += 1;
        Ok(())
    }
}
