use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// How long a notification stays on screen.
pub const NOTIFICATION_LIFETIME: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone)]
struct Toast {
    text: String,
    expires: Instant,
}

/// Short-lived text messages, oldest first.
#[derive(Debug, Clone, Default)]
pub struct Notifications {
    queue: VecDeque<Toast>,
}

impl Notifications {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show `text` from `now` for [`NOTIFICATION_LIFETIME`].
    pub fn push(&mut self, text: impl Into<String>, now: Instant) {
        let text = text.into();
        tracing::debug!(%text, "notification");
        self.queue.push_back(Toast {
            text,
            expires: now + NOTIFICATION_LIFETIME,
        });
    }

    /// Drop expired messages and return the ones still visible at `now`.
    pub fn active(&mut self, now: Instant) -> impl Iterator<Item = &str> {
        self.queue.retain(|toast| toast.expires > now);
        self.queue.iter().map(|toast| toast.text.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
