use anyhow::Result;
use std::path::{Path, PathBuf};

/// Snapshot of one open document as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentInfo {
    pub name: String,
    /// `None` for a document that has never been saved.
    pub path: Option<PathBuf>,
    pub dirty: bool,
}

impl DocumentInfo {
    pub fn new(name: impl Into<String>, path: Option<PathBuf>, dirty: bool) -> Self {
        Self { name: name.into(), path, dirty }
    }

    /// Extension of the backing file, if any, without the leading dot.
    pub fn extension(&self) -> Option<&str> {
        self.path.as_deref().and_then(|path| path.extension()).and_then(|ext| ext.to_str())
    }
}

/// Narrow interface the autosave controller uses to drive the editor's document model.
pub trait DocumentHost {
    /// Every document currently open.
    fn documents(&self) -> Vec<DocumentInfo>;

    /// The document the user is focused on, which is the one that receives scene backups.
    fn active_document(&self) -> Option<DocumentInfo>;

    /// Persist a document to its own storage path.
    fn save_document(&mut self, document: &DocumentInfo) -> Result<()>;

    /// Serialize a copy of the document to `destination` without changing its storage path.
    fn save_document_copy(&mut self, document: &DocumentInfo, destination: &Path) -> Result<()>;

    /// Flush modified auxiliary assets.
    fn save_assets(&mut self) -> Result<()>;

    /// Let the host pick up a file written behind its back.
    fn refresh_asset(&mut self, _path: &Path) {}
}

/// Host with no open documents, used by standalone tooling that only backs up assets.
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedHost;

impl DocumentHost for DetachedHost {
    fn documents(&self) -> Vec<DocumentInfo> {
        Vec::new()
    }

    fn active_document(&self) -> Option<DocumentInfo> {
        None
    }

    fn save_document(&mut self, document: &DocumentInfo) -> Result<()> {
        anyhow::bail!("no editor attached; cannot save '{}'", document.name)
    }

    fn save_document_copy(&mut self, document: &DocumentInfo, _destination: &Path) -> Result<()> {
        anyhow::bail!("no editor attached; cannot back up '{}'", document.name)
    }

    fn save_assets(&mut self) -> Result<()> {
        Ok(())
    }
}
