//! Scan troubleshooting: what looks wrong with a payload, and which
//! formats it resembles. Used by the admin provisioning screen.

use super::{is_ipv4, wifi};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QrIssue {
    Empty,
    SurroundingWhitespace,
    LineBreaks,
    MissingWifiTerminator,
    MissingSsid,
}

impl fmt::Display for QrIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            QrIssue::Empty => "QR data is empty",
            QrIssue::SurroundingWhitespace => "QR data has leading/trailing whitespace",
            QrIssue::LineBreaks => "QR data contains line breaks",
            QrIssue::MissingWifiTerminator => "WiFi QR code should end with double semicolon",
            QrIssue::MissingSsid => "WiFi QR code missing SSID (S:) parameter",
        })
    }
}

pub fn diagnose(raw: &str) -> Vec<QrIssue> {
    let mut issues = Vec::new();
    if raw.trim().is_empty() {
        issues.push(QrIssue::Empty);
        return issues;
    }
    if raw.trim() != raw {
        issues.push(QrIssue::SurroundingWhitespace);
    }
    if raw.contains('\n') || raw.contains('\r') {
        issues.push(QrIssue::LineBreaks);
    }

    let trimmed = raw.trim();
    if wifi::has_wifi_prefix(trimmed) {
        if !trimmed.ends_with(";;") {
            issues.push(QrIssue::MissingWifiTerminator);
        }
        let has_ssid = wifi::split_unescaped(&trimmed[wifi::WIFI_PREFIX.len()..], ';')
            .into_iter()
            .filter_map(|segment| segment.split_once(':'))
            .any(|(key, value)| key.trim().eq_ignore_ascii_case("S") && !value.is_empty());
        if !has_ssid {
            issues.push(QrIssue::MissingSsid);
        }
    }
    issues
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FormatHints {
    pub wifi: bool,
    pub json: bool,
    pub ip: bool,
    pub url: bool,
    pub device_code: bool,
}

impl FormatHints {
    pub fn recommendation(&self) -> &'static str {
        if self.wifi {
            "This is a WiFi QR code - use for WiFi connection"
        } else if self.json {
            "This is a JSON QR code - should work for device connection"
        } else if self.ip {
            "This is an IP address - should work for device connection"
        } else if self.url {
            "This is a URL - open it to reach the device"
        } else if self.device_code {
            "This is a device code - enter the address manually"
        } else {
            "Unknown format - may not be supported"
        }
    }
}

/// Loose format detection; several hints can be set at once.
pub fn detect_formats(raw: &str) -> FormatHints {
    let trimmed = raw.trim();
    let url = trimmed.starts_with("http");
    FormatHints {
        wifi: wifi::has_wifi_prefix(trimmed),
        json: trimmed.starts_with('{') && trimmed.ends_with('}'),
        ip: is_ipv4(trimmed),
        url,
        device_code: trimmed.contains(':') && !url,
    }
}
