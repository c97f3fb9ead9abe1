use crate::host::DocumentInfo;

/// Cached "any document unsaved" flag. Set cheaply on every dirty notification and only
/// rescanned at save boundaries, so the scheduler never walks the document list per tick.
#[derive(Debug, Default, Clone)]
pub struct DirtyTracker {
    dirty: bool,
}

impl DirtyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn recompute_after_save<'a>(&mut self, documents: impl IntoIterator<Item = &'a DocumentInfo>) {
        self.dirty = documents.into_iter().any(|doc| doc.dirty);
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}
