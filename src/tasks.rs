use std::collections::VecDeque;
use std::fmt;
use std::path::PathBuf;

/// Work posted during one callback and run on the next tick, so directory scans and asset
/// copies never run inside the host's save path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeferredTask {
    Prune { directory: PathBuf, pattern: String, written: PathBuf },
    BackupAssets { paths: Vec<PathBuf> },
}

impl fmt::Display for DeferredTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeferredTask::Prune { directory, pattern, .. } => {
                write!(f, "Prune dir={} pattern={}", directory.display(), pattern)
            }
            DeferredTask::BackupAssets { paths } => write!(f, "BackupAssets count={}", paths.len()),
        }
    }
}

#[derive(Debug, Default)]
pub struct TaskQueue {
    tasks: VecDeque<DeferredTask>,
}

impl TaskQueue {
    pub fn push(&mut self, task: DeferredTask) {
        self.tasks.push_back(task);
    }

    /// Takes everything queued so far. Tasks pushed while the batch runs wait for the next drain.
    pub fn drain(&mut self) -> Vec<DeferredTask> {
        self.tasks.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_preserves_order_and_empties_queue() {
        let mut queue = TaskQueue::default();
        queue.push(DeferredTask::BackupAssets { paths: vec![PathBuf::from("a.prefab")] });
        queue.push(DeferredTask::Prune {
            directory: PathBuf::from("backups"),
            pattern: "*.scene".into(),
            written: PathBuf::from("backups/x.scene"),
        });
        let drained = queue.drain();
        assert_eq!(drained.len(), 2);
        assert!(matches!(drained[0], DeferredTask::BackupAssets { .. }));
        assert_eq!(drained[1].to_string(), "Prune dir=backups pattern=*.scene");
        assert!(queue.is_empty());
    }
}
