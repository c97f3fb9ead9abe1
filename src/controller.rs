use crate::backup::{sanitize_component, BackupWriter};
use crate::config::{clamp_backup_count, AutoSaveSettings, SettingsPort};
use crate::dirty::DirtyTracker;
use crate::error::{BackupError, ValidationError};
use crate::events::HostEvent;
use crate::guard::SaveGuard;
use crate::host::{DocumentHost, DocumentInfo};
use crate::owner::ensure_owner_id;
use crate::path_validator::validate_backup_path;
use crate::retention::{prune_oldest, PruneOutcome};
use crate::scheduler::{format_countdown, Hook, Poll, Scheduler};
use crate::status::{StatusKind, StatusMessage};
use crate::tasks::{DeferredTask, TaskQueue};
use crate::time::Clock;
use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const LOG_TARGET: &str = "autosave";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFailure {
    pub name: String,
    pub reason: String,
}

/// What one save-and-backup cycle did. Failures are collected, never propagated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveReport {
    pub saved: Vec<String>,
    /// Dirty documents with no storage path; they need a user-chosen destination.
    pub skipped_unsaved: Vec<String>,
    pub failed: Vec<DocumentFailure>,
    pub assets_error: Option<String>,
    pub backup: Option<PathBuf>,
    pub backup_error: Option<String>,
}

impl SaveReport {
    pub fn is_partial(&self) -> bool {
        !self.failed.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Another cycle held the guard; nothing ran.
    Busy,
    Completed(SaveReport),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    Disabled,
    Waiting,
    /// The window elapsed with nothing dirty. The window still restarts.
    Clean,
    Busy,
    Saved(SaveReport),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetBackupReport {
    pub written: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
    pub rejected: Option<ValidationError>,
}

/// Owns every piece of autosave state and drives it from host events and ticks.
pub struct AutoSaveController<H, P, C> {
    host: H,
    port: P,
    clock: C,
    trusted_root: PathBuf,
    settings: AutoSaveSettings,
    scheduler: Scheduler,
    dirty: DirtyTracker,
    guard: SaveGuard,
    tasks: TaskQueue,
    status: Option<StatusMessage>,
    backup_path_error: Option<ValidationError>,
}

impl<H: DocumentHost, P: SettingsPort, C: Clock> AutoSaveController<H, P, C> {
    pub fn new(host: H, port: P, clock: C, trusted_root: impl Into<PathBuf>) -> Self {
        let settings = match port.load() {
            Ok(settings) => settings.sanitized(),
            Err(err) => {
                log::warn!(target: LOG_TARGET, "Settings load error: {err:?}. Falling back to defaults.");
                AutoSaveSettings::default()
            }
        };
        let scheduler = Scheduler::new(settings.interval_minutes);
        let mut controller = Self {
            host,
            port,
            clock,
            trusted_root: trusted_root.into(),
            settings,
            scheduler,
            dirty: DirtyTracker::new(),
            guard: SaveGuard::new(),
            tasks: TaskQueue::default(),
            status: None,
            backup_path_error: None,
        };
        if controller.settings.auto_save {
            controller.apply_enabled();
        } else {
            controller.apply_disabled();
        }
        controller
    }

    pub fn enable(&mut self) {
        self.apply_enabled();
        self.post_status(StatusKind::Info, "Autosave ON".to_string());
        self.persist();
    }

    pub fn disable(&mut self) {
        self.apply_disabled();
        self.post_status(StatusKind::Info, "Autosave OFF".to_string());
        self.persist();
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        if enabled {
            self.enable();
        } else {
            self.disable();
        }
    }

    fn apply_enabled(&mut self) {
        self.scheduler.enable(self.clock.monotonic_seconds());
        self.settings.auto_save = true;
        self.info("ON !");
    }

    fn apply_disabled(&mut self) {
        self.scheduler.disable();
        self.settings.auto_save = false;
        self.info("OFF !");
    }

    /// Entry point for every host notification. Gated events are delivered once per live
    /// registration and dropped while autosave is off.
    pub fn handle_event(&mut self, event: HostEvent) {
        let deliveries = match event.hook() {
            Some(hook) => self.scheduler.subscriptions().deliveries(hook),
            None => 1,
        };
        for _ in 0..deliveries {
            self.dispatch(&event);
        }
    }

    fn dispatch(&mut self, event: &HostEvent) {
        match event {
            HostEvent::DocumentDirtied { .. } => self.dirty.mark_dirty(),
            HostEvent::DocumentSaved { .. } => {
                let documents = self.host.documents();
                self.dirty.recompute_after_save(&documents);
            }
            HostEvent::EnteringPlayMode => {
                if self.settings.save_on_play {
                    self.run_cycle();
                }
            }
            HostEvent::AssetsWillSave { paths } => {
                self.tasks.push(DeferredTask::BackupAssets { paths: paths.clone() });
            }
        }
    }

    /// Runs deferred work posted by earlier callbacks, then evaluates the save window.
    pub fn tick(&mut self) -> TickOutcome {
        self.flush_deferred();
        let deliveries = self.scheduler.subscriptions().deliveries(Hook::Tick);
        let mut outcome = TickOutcome::Disabled;
        for _ in 0..deliveries {
            outcome = self.on_tick();
        }
        outcome
    }

    fn on_tick(&mut self) -> TickOutcome {
        match self.scheduler.poll(self.clock.monotonic_seconds()) {
            Poll::Disabled => TickOutcome::Disabled,
            Poll::Waiting => TickOutcome::Waiting,
            Poll::Due if !self.dirty.is_dirty() => TickOutcome::Clean,
            Poll::Due => match self.run_cycle() {
                CycleOutcome::Busy => TickOutcome::Busy,
                CycleOutcome::Completed(report) => TickOutcome::Saved(report),
            },
        }
    }

    pub fn trigger_save_now(&mut self) -> CycleOutcome {
        self.run_cycle()
    }

    fn run_cycle(&mut self) -> CycleOutcome {
        let Some(_token) = self.guard.try_acquire() else {
            log::debug!(target: LOG_TARGET, "save cycle already running; skipping");
            return CycleOutcome::Busy;
        };
        CycleOutcome::Completed(self.save_and_backup())
    }

    fn save_and_backup(&mut self) -> SaveReport {
        let mut report = SaveReport::default();
        let active = self.host.active_document();

        for document in self.host.documents() {
            if !document.dirty {
                continue;
            }
            if document.path.is_none() {
                log::warn!(
                    target: LOG_TARGET,
                    "Document '{}' has no path. Please save it manually first.",
                    document.name
                );
                report.skipped_unsaved.push(document.name);
                continue;
            }
            match self.host.save_document(&document) {
                Ok(()) => report.saved.push(document.name),
                Err(err) => {
                    log::error!(
                        target: LOG_TARGET,
                        "Error occurred while saving document '{}': {err:#}",
                        document.name
                    );
                    report.failed.push(DocumentFailure { name: document.name, reason: format!("{err:#}") });
                }
            }
        }

        if self.settings.save_assets {
            if let Err(err) = self.host.save_assets() {
                log::warn!(target: LOG_TARGET, "Saving modified assets failed: {err:#}");
                report.assets_error = Some(format!("{err:#}"));
            }
        }

        let active_name = active.as_ref().map(|doc| doc.name.as_str()).unwrap_or("<none>");
        if report.is_partial() {
            let message = format!("Saved with {} failure(s)", report.failed.len());
            self.post_status(StatusKind::Warning, message);
        } else {
            self.info(&format!("Document '{active_name}' has been saved."));
            let message = format!("Saved: {active_name}");
            self.post_status(StatusKind::Success, message);
        }

        if self.settings.backup_scenes {
            if let Some(active) = active.as_ref() {
                match self.backup_document(active) {
                    Ok(path) => report.backup = Some(path),
                    Err(err) => {
                        self.post_status(StatusKind::Error, format!("Backup failed: {err}"));
                        report.backup_error = Some(err.to_string());
                    }
                }
            }
        }

        let documents = self.host.documents();
        self.dirty.recompute_after_save(&documents);
        report
    }

    fn backup_document(&mut self, document: &DocumentInfo) -> Result<PathBuf, BackupError> {
        let owner = self.owner_id();
        let name = sanitize_component(&document.name);
        let extension = document.extension().unwrap_or(&self.settings.scene_extension).to_string();
        let stamp = self.clock.wall_time();
        let writer = BackupWriter::new(&self.trusted_root, &owner);
        let host = &mut self.host;
        let result = writer.write(
            &self.settings.backup_path,
            &name,
            &extension,
            stamp,
            |destination| host.save_document_copy(document, destination),
            &mut self.tasks,
        );
        match result {
            Ok(artifact) => {
                self.backup_path_error = None;
                self.info(&format!("Backup created for document '{}'.", document.name));
                Ok(artifact.path)
            }
            Err(err) => {
                if let BackupError::Validation(reason) = &err {
                    self.backup_path_error = Some(reason.clone());
                    log::error!(target: LOG_TARGET, "Backup skipped due to invalid backup path: {reason}");
                } else {
                    log::error!(
                        target: LOG_TARGET,
                        "Error occurred while creating a backup for '{}': {err}",
                        document.name
                    );
                }
                Err(err)
            }
        }
    }

    /// Copies each backup-eligible file in `paths` into its backup folder. One failing
    /// asset never stops the rest of the batch.
    pub fn backup_modified_assets(&mut self, paths: &[PathBuf]) -> AssetBackupReport {
        let mut report = AssetBackupReport::default();
        if !self.settings.backup_prefabs {
            return report;
        }
        let eligible: Vec<&PathBuf> = paths.iter().filter(|path| self.settings.is_backup_eligible(path)).collect();
        if eligible.is_empty() {
            return report;
        }
        if let Err(reason) = validate_backup_path(&self.settings.backup_path, &self.trusted_root) {
            log::error!(target: LOG_TARGET, "Asset backup skipped due to invalid backup path: {reason}");
            self.backup_path_error = Some(reason.clone());
            self.post_status(StatusKind::Error, format!("Asset backup skipped: {reason}"));
            report.rejected = Some(reason);
            return report;
        }

        let owner = self.owner_id();
        for path in eligible {
            let source = self.resolve_asset_path(path);
            let Some(stem) = source.file_stem().and_then(|stem| stem.to_str()) else {
                report.skipped.push(path.clone());
                continue;
            };
            let name = sanitize_component(stem);
            if !source.is_file() {
                log::warn!(target: LOG_TARGET, "Asset '{name}' not found on disk, skipping backup.");
                report.skipped.push(path.clone());
                continue;
            }
            let extension = source.extension().and_then(|ext| ext.to_str()).unwrap_or_default().to_string();
            let stamp = self.clock.wall_time();
            let writer = BackupWriter::new(&self.trusted_root, &owner);
            let result = writer.write(
                &self.settings.backup_path,
                &name,
                &extension,
                stamp,
                |destination| {
                    fs::copy(&source, destination)
                        .with_context(|| format!("Copying {} to {}", source.display(), destination.display()))?;
                    Ok(())
                },
                &mut self.tasks,
            );
            match result {
                Ok(artifact) => {
                    self.info(&format!("Backup created for asset '{name}'."));
                    report.written.push(artifact.path);
                }
                Err(err) => {
                    log::error!(target: LOG_TARGET, "Error occurred while creating a backup for asset '{name}': {err}");
                    report.failed.push((path.clone(), err.to_string()));
                }
            }
        }
        report
    }

    fn resolve_asset_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.trusted_root.join(path)
        }
    }

    /// Drains the deferred queue once. Work queued while draining waits for the next call.
    pub fn flush_deferred(&mut self) {
        for task in self.tasks.drain() {
            match task {
                DeferredTask::Prune { directory, pattern, written } => {
                    let limit = self.settings.backup_count as usize;
                    match prune_oldest(&directory, &pattern, limit) {
                        Ok(outcome) => {
                            if let PruneOutcome::Removed { path, .. } = outcome {
                                self.info(&format!("Removed old backup {}", path.display()));
                            }
                            self.host.refresh_asset(&written);
                        }
                        Err(err) => {
                            log::warn!(target: LOG_TARGET, "Could not clean up old backups: {err}");
                            self.post_status(StatusKind::Warning, format!("Could not clean up old backups: {err}"));
                        }
                    }
                }
                DeferredTask::BackupAssets { paths } => {
                    self.backup_modified_assets(&paths);
                }
            }
        }
    }

    pub fn owner_id(&mut self) -> String {
        match ensure_owner_id(&mut self.settings, &mut self.port) {
            Ok(id) => id,
            Err(err) => {
                log::warn!(target: LOG_TARGET, "Persisting owner id failed: {err:#}");
                self.settings.owner_id.clone().unwrap_or_default()
            }
        }
    }

    pub fn set_interval_minutes(&mut self, minutes: u32) -> u32 {
        let applied = self.scheduler.set_interval_minutes(minutes);
        self.settings.interval_minutes = applied;
        self.info(&format!("Save interval = {applied} min!"));
        self.persist();
        applied
    }

    pub fn set_backup_count(&mut self, count: u32) -> u32 {
        self.settings.backup_count = clamp_backup_count(count);
        self.persist();
        self.settings.backup_count
    }

    /// Accepts a new backup root only if it validates; otherwise keeps the current one and
    /// records the reason for display.
    pub fn set_backup_path(&mut self, candidate: &str) -> Result<PathBuf, ValidationError> {
        match validate_backup_path(candidate, &self.trusted_root) {
            Ok(resolved) => {
                self.settings.backup_path = candidate.to_string();
                self.backup_path_error = None;
                self.persist();
                Ok(resolved)
            }
            Err(reason) => {
                log::warn!(target: LOG_TARGET, "Invalid backup path '{candidate}': {reason}");
                self.backup_path_error = Some(reason.clone());
                Err(reason)
            }
        }
    }

    /// Applies a bulk edit (toggles and such), then re-syncs the scheduler with the result.
    pub fn update_settings(&mut self, edit: impl FnOnce(&mut AutoSaveSettings)) {
        let was_enabled = self.settings.auto_save;
        edit(&mut self.settings);
        self.settings = std::mem::take(&mut self.settings).sanitized();
        self.scheduler.set_interval_minutes(self.settings.interval_minutes);
        match (was_enabled, self.settings.auto_save) {
            (false, true) => self.apply_enabled(),
            (true, false) => self.apply_disabled(),
            _ => {}
        }
        self.persist();
    }

    fn persist(&mut self) {
        if let Err(err) = self.port.store(&self.settings) {
            log::warn!(target: LOG_TARGET, "Persisting autosave settings failed: {err:#}");
        }
    }

    fn post_status(&mut self, kind: StatusKind, message: String) {
        self.status = Some(StatusMessage { kind, message, posted_at: self.clock.monotonic_seconds() });
    }

    fn info(&self, message: &str) {
        if self.settings.debug_log {
            log::info!(target: LOG_TARGET, "{message}");
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.is_dirty()
    }

    pub fn is_enabled(&self) -> bool {
        self.scheduler.is_enabled()
    }

    pub fn time_until_next_save(&self) -> Duration {
        self.scheduler.remaining(self.clock.monotonic_seconds())
    }

    pub fn countdown_label(&self) -> Option<String> {
        self.is_enabled().then(|| format_countdown(self.time_until_next_save()))
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    pub fn visible_status(&self) -> Option<&StatusMessage> {
        let now = self.clock.monotonic_seconds();
        self.status.as_ref().filter(|status| status.is_visible(now))
    }

    pub fn backup_path_error(&self) -> Option<&ValidationError> {
        self.backup_path_error.as_ref()
    }

    pub fn settings(&self) -> &AutoSaveSettings {
        &self.settings
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn guard(&self) -> &SaveGuard {
        &self.guard
    }

    pub fn pending_tasks(&self) -> &TaskQueue {
        &self.tasks
    }

    pub fn trusted_root(&self) -> &Path {
        &self.trusted_root
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn port(&self) -> &P {
        &self.port
    }
}
