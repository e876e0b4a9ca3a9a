use std::time::{Duration, Instant};

use tracing::debug;

pub const DEFAULT_NOTICE_MS: u64 = 1800;

/// Transient status message: hidden until shown, auto-hidden once the
/// fixed delay elapses. A later `show` replaces the text and restarts
/// the clock; messages are never queued.
#[derive(Debug)]
pub struct Notice {
    delay: Duration,
    current: Option<(String, Instant)>,
}

impl Notice {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            current: None,
        }
    }

    pub fn show(&mut self, text: impl Into<String>) {
        self.show_at(text, Instant::now());
    }

    pub fn show_at(&mut self, text: impl Into<String>, now: Instant) {
        let text = text.into();
        debug!(text = %text, "notice shown");
        self.current = Some((text, now));
    }

    pub fn visible_at(&self, now: Instant) -> Option<&str> {
        match &self.current {
            Some((text, shown)) if now.duration_since(*shown) < self.delay => Some(text),
            _ => None,
        }
    }
}
