use crate::models::AlertEvent;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    pub kind: String,
    pub device_id: String,
    pub message: String,
}

impl DedupKey {
    pub fn from_event(event: &AlertEvent) -> Self {
        Self {
            kind: event.kind.clone(),
            device_id: event.device_id.clone(),
            message: event.message.clone(),
        }
    }
}

/// Last-dispatch timestamps, forgotten once older than the window.
#[derive(Debug)]
pub struct DedupCache {
    window: Duration,
    seen: HashMap<DedupKey, Instant>,
}

impl DedupCache {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            seen: HashMap::new(),
        }
    }

    /// True if `key` was recorded less than `window` before `now`.
    pub fn is_fresh(&self, key: &DedupKey, now: Instant) -> bool {
        self.seen
            .get(key)
            .is_some_and(|at| now.saturating_duration_since(*at) < self.window)
    }

    pub fn record(&mut self, key: DedupKey, now: Instant) {
        let window = self.window;
        self.seen
            .retain(|_, at| now.saturating_duration_since(*at) < window);
        self.seen.insert(key, now);
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
