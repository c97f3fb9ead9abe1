use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Single-flight gate for the save-and-backup cycle. A second caller is turned away rather
/// than queued, since a tick that lands mid-save has nothing left to do.
#[derive(Clone, Debug, Default)]
pub struct SaveGuard {
    in_progress: Arc<AtomicBool>,
}

/// Held for the duration of one cycle. Dropping it releases the guard, including on unwind.
#[derive(Debug)]
pub struct SaveGuardToken {
    in_progress: Arc<AtomicBool>,
}

impl SaveGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_acquire(&self) -> Option<SaveGuardToken> {
        self.in_progress
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SaveGuardToken { in_progress: Arc::clone(&self.in_progress) })
    }

    /// Runs `action` unless a cycle is already in flight, in which case returns `None`
    /// without calling it.
    pub fn run_exclusive<R>(&self, action: impl FnOnce() -> R) -> Option<R> {
        let _token = self.try_acquire()?;
        Some(action())
    }

    pub fn is_busy(&self) -> bool {
        self.in_progress.load(Ordering::Acquire)
    }
}

impl Drop for SaveGuardToken {
    fn drop(&mut self) {
        self.in_progress.store(false, Ordering::Release);
    }
}
