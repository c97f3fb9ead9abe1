use crate::scheduler::Hook;
use std::fmt;
use std::path::PathBuf;

/// Notifications pushed by the editor into the autosave controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    DocumentDirtied { name: String },
    DocumentSaved { name: String },
    EnteringPlayMode,
    /// Paths the host is about to write. Backups run after the save lands.
    AssetsWillSave { paths: Vec<PathBuf> },
}

impl HostEvent {
    /// Scheduler hook gating this event, or `None` for events delivered regardless of
    /// whether autosave is on.
    pub fn hook(&self) -> Option<Hook> {
        match self {
            HostEvent::DocumentDirtied { .. } => Some(Hook::Dirtied),
            HostEvent::DocumentSaved { .. } => Some(Hook::Saved),
            HostEvent::EnteringPlayMode => Some(Hook::PlayMode),
            HostEvent::AssetsWillSave { .. } => None,
        }
    }
}

impl fmt::Display for HostEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostEvent::DocumentDirtied { name } => write!(f, "DocumentDirtied name={name}"),
            HostEvent::DocumentSaved { name } => write!(f, "DocumentSaved name={name}"),
            HostEvent::EnteringPlayMode => write!(f, "EnteringPlayMode"),
            HostEvent::AssetsWillSave { paths } => write!(f, "AssetsWillSave count={}", paths.len()),
        }
    }
}
