use crate::notify::{DispatchError, DispatchOutcome};
use parking_lot::Mutex;
use rumqttc::{AsyncClient, QoS};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task;
use tracing::{debug, warn};

pub const HEALTH_TOPIC: &str = "dispenser/kernel/health@v1";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KernelHealth {
    pub uptime_seconds: u64,
    pub memory_usage_mb: f32,
    pub mqtt_status: String,
    pub mqtt_reconnects: u64,
    pub dispatch: DispatchCounters,
    pub scans_classified: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DispatchCounters {
    pub delivered: u64,
    pub suppressed: u64,
    pub busy: u64,
    pub failed: u64,
    pub unknown_type: u64,
}

#[derive(Default)]
struct Counters {
    delivered: AtomicU64,
    suppressed: AtomicU64,
    busy: AtomicU64,
    failed: AtomicU64,
    unknown_type: AtomicU64,
    scans: AtomicU64,
    reconnects: AtomicU64,
}

#[derive(Clone)]
pub struct HealthTracker {
    start_time: Instant,
    counters: Arc<Counters>,
    mqtt_status: Arc<Mutex<String>>,
}

impl Default for HealthTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthTracker {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            counters: Arc::new(Counters::default()),
            mqtt_status: Arc::new(Mutex::new("connecting".to_string())),
        }
    }

    pub fn mark_mqtt_connected(&self) {
        *self.mqtt_status.lock() = "connected".to_string();
    }

    pub fn increment_reconnects(&self) {
        self.counters.reconnects.fetch_add(1, Ordering::Relaxed);
        *self.mqtt_status.lock() = "reconnecting".to_string();
    }

    pub fn record_scan(&self) {
        self.counters.scans.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dispatch(&self, result: &Result<DispatchOutcome, DispatchError>) {
        let counter = match result {
            Ok(DispatchOutcome::Delivered { .. }) => &self.counters.delivered,
            Ok(DispatchOutcome::Suppressed) => &self.counters.suppressed,
            Ok(DispatchOutcome::Busy) => &self.counters.busy,
            Ok(DispatchOutcome::Failed { .. }) => &self.counters.failed,
            Err(DispatchError::UnknownAlertType(_)) => &self.counters.unknown_type,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_health(&self) -> KernelHealth {
        let c = &self.counters;
        KernelHealth {
            uptime_seconds: self.start_time.elapsed().as_secs(),
            memory_usage_mb: get_memory_usage_mb(),
            mqtt_status: self.mqtt_status.lock().clone(),
            mqtt_reconnects: c.reconnects.load(Ordering::Relaxed),
            dispatch: DispatchCounters {
                delivered: c.delivered.load(Ordering::Relaxed),
                suppressed: c.suppressed.load(Ordering::Relaxed),
                busy: c.busy.load(Ordering::Relaxed),
                failed: c.failed.load(Ordering::Relaxed),
                unknown_type: c.unknown_type.load(Ordering::Relaxed),
            },
            scans_classified: c.scans.load(Ordering::Relaxed),
        }
    }

    /// Publishes `KernelHealth` every `every` on the shared client.
    pub fn spawn_health_publisher(&self, client: AsyncClient, every: Duration) {
        let tracker = self.clone();
        task::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                let health = tracker.get_health();
                let Ok(payload) = serde_json::to_string(&health) else { continue };
                match client.publish(HEALTH_TOPIC, QoS::AtLeastOnce, false, payload).await {
                    Ok(()) => debug!(uptime = health.uptime_seconds, "published kernel health"),
                    Err(e) => warn!("failed to publish health: {e}"),
                }
            }
        });
    }
}

fn get_memory_usage_mb() -> f32 {
    #[cfg(target_os = "linux")]
    {
        if let Ok(status) = std::fs::read_to_string("/proc/self/status") {
            let rss_kb = status
                .lines()
                .find(|l| l.starts_with("VmRSS:"))
                .and_then(|l| l.split_whitespace().nth(1))
                .and_then(|kb| kb.parse::<u64>().ok());
            if let Some(kb) = rss_kb {
                return kb as f32 / 1024.0;
            }
        }
    }
    0.0
}
