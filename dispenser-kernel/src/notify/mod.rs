/**
 * NOTIFICATION DISPATCHER - backend alerts -> platform notification requests
 *
 * ROLE: map an AlertEvent (tamper, empty, low, maintenance) to a
 * NotificationRequest and hand it to the platform sink.
 *
 * RULES:
 * - unknown alert type: DispatchError::UnknownAlertType, nothing emitted
 * - same (type, device_id, message) inside the debounce window: Suppressed
 * - another dispatch still submitting: Busy (rejected, not queued); the
 *   lock is held until the sink call returns, success or failure
 * - sink failure: Failed with the reason, request still returned
 */

pub mod dedup;
pub mod sink;
pub mod table;

pub use dedup::{DedupCache, DedupKey};
pub use sink::{LogSink, MqttSink, NotificationSink, SinkError};

use crate::models::{AlertEvent, AlertType, NotificationIcon, NotificationRequest};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(2000);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Unknown alert type: {0}")]
    UnknownAlertType(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DispatchOutcome {
    Delivered { request: NotificationRequest },
    Suppressed,
    Busy,
    Failed { request: NotificationRequest, reason: String },
}

pub struct Dispatcher {
    sink: Arc<dyn NotificationSink>,
    dedup: Mutex<DedupCache>,
    in_flight: tokio::sync::Mutex<()>,
}

impl Dispatcher {
    pub fn new(sink: Arc<dyn NotificationSink>, debounce: Duration) -> Self {
        Self::with_cache(sink, DedupCache::new(debounce))
    }

    pub fn with_cache(sink: Arc<dyn NotificationSink>, cache: DedupCache) -> Self {
        Self {
            sink,
            dedup: Mutex::new(cache),
            in_flight: tokio::sync::Mutex::new(()),
        }
    }

    pub async fn dispatch(&self, event: &AlertEvent) -> Result<DispatchOutcome, DispatchError> {
        let kind = parse_kind(event)?;
        let key = DedupKey::from_event(event);

        if self.dedup.lock().is_fresh(&key, Instant::now()) {
            debug!(kind = %kind, device_id = %event.device_id, "duplicate alert suppressed");
            return Ok(DispatchOutcome::Suppressed);
        }

        let Ok(_in_flight) = self.in_flight.try_lock() else {
            info!(kind = %kind, device_id = %event.device_id, "dispatch in progress, alert rejected");
            return Ok(DispatchOutcome::Busy);
        };

        {
            let mut dedup = self.dedup.lock();
            let now = Instant::now();
            // recorded by a dispatch that finished between the check and the lock
            if dedup.is_fresh(&key, now) {
                return Ok(DispatchOutcome::Suppressed);
            }
            dedup.record(key, now);
        }

        let request = build_request(kind, event);
        match self.sink.submit(&request).await {
            Ok(()) => {
                info!(id = %request.id, channel = %request.channel, device_id = %event.device_id, "alert notification sent");
                Ok(DispatchOutcome::Delivered { request })
            }
            Err(e) => {
                error!(id = %request.id, device_id = %event.device_id, "platform notification failed: {e}");
                Ok(DispatchOutcome::Failed {
                    request,
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Builds the request an event would produce, without dedup or sending.
    pub fn preview(&self, event: &AlertEvent) -> Result<NotificationRequest, DispatchError> {
        let kind = parse_kind(event)?;
        Ok(build_request(kind, event))
    }
}

fn parse_kind(event: &AlertEvent) -> Result<AlertType, DispatchError> {
    event.kind.parse::<AlertType>().map_err(|kind| {
        warn!(kind = %kind, device_id = %event.device_id, "unknown alert type, dropped");
        DispatchError::UnknownAlertType(kind)
    })
}

pub fn build_request(kind: AlertType, event: &AlertEvent) -> NotificationRequest {
    let profile = table::profile(kind);
    let type_name = kind.display_name();
    let device = event.device_label();
    let location = event.location_label();
    let device_info = if location.is_empty() {
        device.clone()
    } else {
        format!("{device} - {location}")
    };
    let location_text = if location.is_empty() { "Not specified" } else { location.as_str() };

    let mut metadata = BTreeMap::new();
    metadata.insert("type".to_string(), kind.to_string());
    metadata.insert("device_id".to_string(), event.device_id.clone());
    if let Some(name) = &event.device_name {
        metadata.insert("device_name".to_string(), name.clone());
    }
    if let Some(room) = &event.room {
        metadata.insert("room".to_string(), room.clone());
    }
    if let Some(floor) = &event.floor {
        metadata.insert("floor".to_string(), floor.clone());
    }
    metadata.insert("priority".to_string(), event.priority.to_string());
    metadata.insert("alert_type".to_string(), type_name.to_string());
    metadata.insert("location".to_string(), location.clone());
    metadata.insert("tag".to_string(), format!("{kind}-{}", event.device_id));
    metadata.insert(
        "timestamp".to_string(),
        OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default(),
    );

    NotificationRequest {
        id: Uuid::new_v4().to_string(),
        title: format!("{type_name} Alert"),
        body: format!("{device_info}\n{}", event.message),
        subtitle: device_info,
        big_text: format!(
            "{type_name} Alert\n\nDevice: {device}\nLocation: {location_text}\nAlert Type: {type_name}\n\n{}",
            event.message
        ),
        channel: profile.channel.to_string(),
        priority: profile.priority,
        color: profile.color.to_string(),
        category: table::ALERT_CATEGORY.to_string(),
        sticky: profile.sticky,
        interruption_level: profile.interruption_level,
        relevance_score: profile.relevance_score,
        icon: NotificationIcon {
            name: profile.icon.name.to_string(),
            family: profile.icon.family.to_string(),
            color: profile.icon.color.to_string(),
        },
        metadata,
    }
}
