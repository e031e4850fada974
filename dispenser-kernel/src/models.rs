use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Backend priority applied when the feed omits one.
pub const DEFAULT_ALERT_PRIORITY: i64 = 80;

fn default_priority() -> i64 {
    DEFAULT_ALERT_PRIORITY
}

/// Alert pushed by the backend (socket channel or push service).
/// `kind` stays a raw string so unknown types survive decoding and are
/// rejected by the dispatcher instead of the JSON layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    #[serde(alias = "deviceId")]
    pub device_id: String,
    #[serde(default, alias = "deviceName", skip_serializing_if = "Option::is_none")]
    pub device_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor: Option<String>,
    #[serde(default = "default_priority")]
    pub priority: i64,
}

impl AlertEvent {
    pub fn new(kind: impl Into<String>, device_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            device_id: device_id.into(),
            device_name: None,
            room: None,
            floor: None,
            priority: DEFAULT_ALERT_PRIORITY,
        }
    }

    pub fn with_device_name(mut self, name: impl Into<String>) -> Self {
        self.device_name = Some(name.into());
        self
    }

    pub fn with_location(mut self, room: Option<&str>, floor: Option<&str>) -> Self {
        self.room = room.map(str::to_string);
        self.floor = floor.map(str::to_string);
        self
    }

    /// `Device Name` if known, else `Device {id}`.
    pub fn device_label(&self) -> String {
        match self.device_name.as_deref().filter(|n| !n.is_empty()) {
            Some(name) => name.to_string(),
            None => format!("Device {}", self.device_id),
        }
    }

    /// `Room R, Floor F`, `Room R`, `Floor F` or empty.
    pub fn location_label(&self) -> String {
        let room = self.room.as_deref().filter(|r| !r.is_empty());
        let floor = self.floor.as_deref().filter(|f| !f.is_empty());
        match (room, floor) {
            (Some(r), Some(f)) => format!("Room {r}, Floor {f}"),
            (Some(r), None) => format!("Room {r}"),
            (None, Some(f)) => format!("Floor {f}"),
            (None, None) => String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertType {
    Tamper,
    Empty,
    Low,
    Maintenance,
}

impl AlertType {
    pub const ALL: [AlertType; 4] = [
        AlertType::Tamper,
        AlertType::Empty,
        AlertType::Low,
        AlertType::Maintenance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::Tamper => "tamper",
            AlertType::Empty => "empty",
            AlertType::Low => "low",
            AlertType::Maintenance => "maintenance",
        }
    }

    /// Capitalized form used in titles (`Tamper`).
    pub fn display_name(&self) -> &'static str {
        match self {
            AlertType::Tamper => "Tamper",
            AlertType::Empty => "Empty",
            AlertType::Low => "Low",
            AlertType::Maintenance => "Maintenance",
        }
    }
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tamper" => Ok(AlertType::Tamper),
            "empty" => Ok(AlertType::Empty),
            "low" => Ok(AlertType::Low),
            "maintenance" => Ok(AlertType::Maintenance),
            other => Err(other.to_string()),
        }
    }
}

/// Android notification priority levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformPriority {
    Min,
    Low,
    Default,
    High,
    Max,
}

/// iOS interruption levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterruptionLevel {
    Passive,
    Active,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationIcon {
    pub name: String,
    pub family: String,
    pub color: String,
}

/// Request handed to the platform notification API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub id: String,
    pub title: String,
    pub body: String,
    pub subtitle: String,
    pub big_text: String,
    pub channel: String,
    pub priority: PlatformPriority,
    pub color: String,
    pub category: String,
    pub sticky: bool,
    pub interruption_level: InterruptionLevel,
    pub relevance_score: f32,
    pub icon: NotificationIcon,
    pub metadata: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_event_decoding() {
        let json = r#"{"type":"low","message":"Tissue at 10%","deviceId":"42","room":"101"}"#;
        let event: AlertEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.kind, "low");
        assert_eq!(event.device_id, "42");
        assert_eq!(event.priority, DEFAULT_ALERT_PRIORITY);
        assert_eq!(event.location_label(), "Room 101");
        assert_eq!(event.device_label(), "Device 42");
    }

    #[test]
    fn test_location_label_variants() {
        let base = AlertEvent::new("empty", "7", "Empty");
        assert_eq!(base.location_label(), "");
        assert_eq!(base.clone().with_location(Some("3"), Some("1")).location_label(), "Room 3, Floor 1");
        assert_eq!(base.with_location(None, Some("2")).location_label(), "Floor 2");
    }

    #[test]
    fn test_alert_type_parsing() {
        for kind in AlertType::ALL {
            assert_eq!(kind.as_str().parse::<AlertType>(), Ok(kind));
        }
        assert!("bogus".parse::<AlertType>().is_err());
        assert!("Tamper".parse::<AlertType>().is_err());
    }
}
