use crate::models::{AlertType, InterruptionLevel, PlatformPriority};
use serde::Serialize;

/// Every alert opens the app; no other action set is offered.
pub const ALERT_CATEGORY: &str = "critical-alert";

#[derive(Debug, Clone, Copy)]
pub struct IconSpec {
    pub name: &'static str,
    pub family: &'static str,
    pub color: &'static str,
}

/// Static presentation settings per alert type.
#[derive(Debug, Clone, Copy)]
pub struct AlertProfile {
    pub kind: AlertType,
    pub channel: &'static str,
    pub priority: PlatformPriority,
    pub color: &'static str,
    pub sticky: bool,
    pub interruption_level: InterruptionLevel,
    pub relevance_score: f32,
    pub icon: IconSpec,
}

static PROFILES: [AlertProfile; 4] = [
    AlertProfile {
        kind: AlertType::Tamper,
        channel: "tamper",
        priority: PlatformPriority::Max,
        color: "#8B5CF6",
        sticky: true,
        interruption_level: InterruptionLevel::Critical,
        relevance_score: 1.0,
        icon: IconSpec { name: "shield-alert-outline", family: "MaterialCommunityIcons", color: "#8B5CF6" },
    },
    AlertProfile {
        kind: AlertType::Empty,
        channel: "empty",
        priority: PlatformPriority::Max,
        color: "#DC2626",
        sticky: true,
        interruption_level: InterruptionLevel::Critical,
        relevance_score: 0.9,
        icon: IconSpec { name: "archive-cancel-outline", family: "MaterialCommunityIcons", color: "#DC2626" },
    },
    AlertProfile {
        kind: AlertType::Low,
        channel: "low",
        priority: PlatformPriority::High,
        color: "#FF9800",
        sticky: false,
        interruption_level: InterruptionLevel::Active,
        relevance_score: 0.8,
        icon: IconSpec { name: "archive-outline", family: "MaterialCommunityIcons", color: "#FF9800" },
    },
    AlertProfile {
        kind: AlertType::Maintenance,
        channel: "default",
        priority: PlatformPriority::Default,
        color: "#2196F3",
        sticky: false,
        interruption_level: InterruptionLevel::Passive,
        relevance_score: 0.4,
        icon: IconSpec { name: "wrench", family: "Feather", color: "#2196F3" },
    },
];

pub fn profile(kind: AlertType) -> &'static AlertProfile {
    match kind {
        AlertType::Tamper => &PROFILES[0],
        AlertType::Empty => &PROFILES[1],
        AlertType::Low => &PROFILES[2],
        AlertType::Maintenance => &PROFILES[3],
    }
}

/// Android channel definition, registered once by the mobile client.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ChannelSpec {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub importance: PlatformPriority,
    pub vibration_pattern: &'static [u32],
    pub light_color: &'static str,
    pub sound: &'static str,
    pub bypass_dnd: bool,
}

static CHANNELS: [ChannelSpec; 4] = [
    ChannelSpec {
        id: "default",
        name: "Smart Dispenser",
        description: "General notifications",
        importance: PlatformPriority::High,
        vibration_pattern: &[0, 250, 250, 250],
        light_color: "#3AB0FF",
        sound: "notif.mp3",
        bypass_dnd: false,
    },
    ChannelSpec {
        id: "tamper",
        name: "Tamper Alerts",
        description: "Device tampering detection",
        importance: PlatformPriority::Max,
        vibration_pattern: &[0, 200, 100, 200, 100, 200, 100, 200],
        light_color: "#FF5722",
        sound: "notif.mp3",
        bypass_dnd: true,
    },
    ChannelSpec {
        id: "low",
        name: "Low Level Alerts",
        description: "Low tissue level alerts",
        importance: PlatformPriority::High,
        vibration_pattern: &[0, 300, 150, 300],
        light_color: "#FF9800",
        sound: "notif.mp3",
        bypass_dnd: false,
    },
    ChannelSpec {
        id: "empty",
        name: "Empty Alerts",
        description: "Empty tissue dispenser alerts",
        importance: PlatformPriority::Max,
        vibration_pattern: &[0, 400, 200, 400, 200, 400],
        light_color: "#DC2626",
        sound: "notif.mp3",
        bypass_dnd: true,
    },
];

pub fn channels() -> &'static [ChannelSpec] {
    &CHANNELS
}
