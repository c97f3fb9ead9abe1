/// How long a status line stays visible after it is posted.
pub const STATUS_DISPLAY_SECONDS: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Success,
    Warning,
    Error,
}

impl StatusKind {
    pub fn label(self) -> &'static str {
        match self {
            StatusKind::Info => "info",
            StatusKind::Success => "success",
            StatusKind::Warning => "warning",
            StatusKind::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub message: String,
    /// Monotonic seconds when the message was posted.
    pub posted_at: f64,
}

impl StatusMessage {
    pub fn is_visible(&self, now: f64) -> bool {
        now - self.posted_at < STATUS_DISPLAY_SECONDS
    }
}
