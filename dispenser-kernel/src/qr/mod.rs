/**
 * QR PAYLOAD CLASSIFIER - scanned strings for dispenser provisioning
 *
 * ROLE: turn whatever the camera handed us into one of four shapes:
 * WiFi credentials, a JSON device descriptor, a bare IPv4 address, or
 * unrecognized (with a reason). Pure and synchronous, never fails.
 *
 * FLOW: classify() -> action() -> either the WiFi-join flow or a
 * DeviceRegistration draft for IP-based registration.
 */

mod diagnostics;
pub mod wifi;

pub use diagnostics::{detect_formats, diagnose, FormatHints, QrIssue};
pub use wifi::{WifiCredentials, WifiSecurity};

use serde::{Deserialize, Serialize};
use tracing::debug;

pub const REASON_EMPTY: &str = "empty payload";
pub const REASON_UNRECOGNIZED: &str = "format not recognized";
pub const DEFAULT_DEVICE_TYPE: &str = "Smart Device";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    pub ip: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(
        default,
        rename = "deviceType",
        alias = "device_type",
        alias = "type",
        skip_serializing_if = "Option::is_none"
    )]
    pub device_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParsedQr {
    WifiCredentials(WifiCredentials),
    DeviceDescriptor(DeviceDescriptor),
    BareAddress { ip: String },
    Unrecognized { raw: String, reason: String },
}

/// What the caller should do next with a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvisioningAction {
    ConnectWifi,
    AddDevice,
}

impl ParsedQr {
    fn unrecognized(raw: &str, reason: impl Into<String>) -> Self {
        ParsedQr::Unrecognized {
            raw: raw.to_string(),
            reason: reason.into(),
        }
    }

    pub fn action(&self) -> Option<ProvisioningAction> {
        match self {
            ParsedQr::WifiCredentials(_) => Some(ProvisioningAction::ConnectWifi),
            ParsedQr::DeviceDescriptor(_) | ParsedQr::BareAddress { .. } => {
                Some(ProvisioningAction::AddDevice)
            }
            ParsedQr::Unrecognized { .. } => None,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, ParsedQr::Unrecognized { .. })
    }

    pub fn ip(&self) -> Option<&str> {
        match self {
            ParsedQr::DeviceDescriptor(d) => Some(&d.ip),
            ParsedQr::BareAddress { ip } => Some(ip),
            _ => None,
        }
    }

    pub fn summary(&self) -> String {
        match self {
            ParsedQr::WifiCredentials(c) => format!("WiFi network detected: {}", c.ssid),
            ParsedQr::DeviceDescriptor(d) => {
                format!("Device detected: {}", d.hostname.as_deref().unwrap_or(&d.ip))
            }
            ParsedQr::BareAddress { ip } => format!("IP address detected: {ip}"),
            ParsedQr::Unrecognized { reason, .. } => format!("QR code not supported: {reason}"),
        }
    }
}

/// Classifies a scanned payload. First match wins:
/// `WIFI:` prefix, `{...}` descriptor, dotted quad, otherwise unrecognized.
pub fn classify(raw: &str) -> ParsedQr {
    let trimmed = raw.trim();
    debug!(len = raw.len(), "classifying qr payload");

    let parsed = if trimmed.is_empty() {
        ParsedQr::unrecognized(raw, REASON_EMPTY)
    } else if wifi::has_wifi_prefix(trimmed) {
        match wifi::parse_wifi(trimmed) {
            Ok(creds) => ParsedQr::WifiCredentials(creds),
            Err(reason) => ParsedQr::unrecognized(raw, reason),
        }
    } else if trimmed.starts_with('{') && trimmed.ends_with('}') {
        classify_descriptor(raw, trimmed)
    } else if is_ipv4(trimmed) {
        ParsedQr::BareAddress {
            ip: trimmed.to_string(),
        }
    } else {
        ParsedQr::unrecognized(raw, REASON_UNRECOGNIZED)
    };

    debug!(recognized = parsed.is_recognized(), "qr payload classified");
    parsed
}

fn classify_descriptor(raw: &str, trimmed: &str) -> ParsedQr {
    match serde_json::from_str::<DeviceDescriptor>(trimmed) {
        Ok(mut descriptor) => {
            if !is_ipv4(&descriptor.ip) {
                return ParsedQr::unrecognized(raw, format!("invalid ip address: {}", descriptor.ip));
            }
            descriptor.hostname = descriptor.hostname.filter(|h| !h.trim().is_empty());
            descriptor.device_type = descriptor.device_type.filter(|t| !t.trim().is_empty());
            ParsedQr::DeviceDescriptor(descriptor)
        }
        Err(e) => ParsedQr::unrecognized(raw, e.to_string()),
    }
}

/// IPv4 dotted quad, 1-3 digits per octet, each in `[0,255]`.
/// Leading zeros are accepted (`192.168.001.010`).
pub fn is_ipv4(s: &str) -> bool {
    let mut count = 0;
    for octet in s.split('.') {
        count += 1;
        if count > 4
            || octet.is_empty()
            || octet.len() > 3
            || !octet.bytes().all(|b| b.is_ascii_digit())
        {
            return false;
        }
        match octet.parse::<u16>() {
            Ok(v) if v <= 255 => {}
            _ => return false,
        }
    }
    count == 4
}

/// Draft sent to the backend when a scan leads to direct registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRegistration {
    pub name: String,
    pub ip: String,
    pub hostname: String,
    pub device_type: String,
}

impl DeviceRegistration {
    pub fn from_parsed(parsed: &ParsedQr) -> Option<Self> {
        let (ip, hostname, device_type) = match parsed {
            ParsedQr::DeviceDescriptor(d) => (d.ip.as_str(), d.hostname.clone(), d.device_type.clone()),
            ParsedQr::BareAddress { ip } => (ip.as_str(), None, None),
            _ => return None,
        };
        let last_octet = ip.rsplit('.').next().unwrap_or(ip);
        Some(Self {
            name: hostname.clone().unwrap_or_else(|| format!("Device {ip}")),
            ip: ip.to_string(),
            hostname: hostname.unwrap_or_else(|| format!("Device-{last_octet}")),
            device_type: device_type.unwrap_or_else(|| DEFAULT_DEVICE_TYPE.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wifi_payload() {
        let parsed = classify("WIFI:T:WPA;S:TestNet;P:pass123;;");
        assert_eq!(
            parsed,
            ParsedQr::WifiCredentials(WifiCredentials {
                ssid: "TestNet".into(),
                password: "pass123".into(),
                security: WifiSecurity::Wpa,
                hidden: false,
            })
        );
        assert_eq!(parsed.action(), Some(ProvisioningAction::ConnectWifi));
    }

    #[test]
    fn test_wifi_prefix_is_case_insensitive_and_trimmed() {
        let parsed = classify("  wifi:S:Home;T:WEP;P:oldkey;;\r\n");
        match parsed {
            ParsedQr::WifiCredentials(c) => {
                assert_eq!(c.ssid, "Home");
                assert_eq!(c.security, WifiSecurity::Wep);
            }
            other => panic!("expected wifi, got {other:?}"),
        }
    }

    #[test]
    fn test_wifi_without_ssid_is_unrecognized() {
        let parsed = classify("WIFI:T:WPA;P:secret;;");
        assert!(matches!(parsed, ParsedQr::Unrecognized { ref reason, .. } if reason.contains("SSID")));
    }

    #[test]
    fn test_bare_address() {
        assert_eq!(
            classify("192.168.1.100"),
            ParsedQr::BareAddress { ip: "192.168.1.100".into() }
        );
        assert_eq!(
            classify("\n10.0.0.7 \n"),
            ParsedQr::BareAddress { ip: "10.0.0.7".into() }
        );
    }

    #[test]
    fn test_device_descriptor() {
        let parsed = classify(r#"{"ip":"192.168.1.100","hostname":"SmartDevice","type":"dispenser"}"#);
        assert_eq!(
            parsed,
            ParsedQr::DeviceDescriptor(DeviceDescriptor {
                ip: "192.168.1.100".into(),
                hostname: Some("SmartDevice".into()),
                device_type: Some("dispenser".into()),
            })
        );
        assert_eq!(parsed.ip(), Some("192.168.1.100"));
    }

    #[test]
    fn test_device_type_spellings() {
        let snake = classify(r#"{"ip":"10.0.0.2","device_type":"Dispenser"}"#);
        let camel = classify(r#"{"ip":"10.0.0.2","deviceType":"Dispenser"}"#);
        assert_eq!(snake, camel);
        match snake {
            ParsedQr::DeviceDescriptor(d) => assert_eq!(d.device_type.as_deref(), Some("Dispenser")),
            other => panic!("unexpected {other:?}"),
        }

        match classify(r#"{"ip":"10.0.0.2","type":"a","deviceType":"b"}"#) {
            ParsedQr::Unrecognized { reason, .. } => assert!(reason.contains("duplicate field")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_descriptor_errors_carry_reason() {
        match classify(r#"{"hostname":"NoIp"}"#) {
            ParsedQr::Unrecognized { reason, .. } => assert!(reason.contains("ip")),
            other => panic!("unexpected {other:?}"),
        }
        match classify(r#"{"ip":"300.1.1.1"}"#) {
            ParsedQr::Unrecognized { reason, .. } => assert!(reason.starts_with("invalid ip address")),
            other => panic!("unexpected {other:?}"),
        }
        assert!(!classify("{not json}").is_recognized());
    }

    #[test]
    fn test_unrecognized_inputs() {
        for raw in ["not a qr code", "http://example.com", "DEV-001:192.168.4.1", "1.2.3", "1.2.3.4.5"] {
            match classify(raw) {
                ParsedQr::Unrecognized { raw: r, reason } => {
                    assert_eq!(r, raw);
                    assert_eq!(reason, REASON_UNRECOGNIZED);
                }
                other => panic!("{raw} classified as {other:?}"),
            }
        }
    }

    #[test]
    fn test_empty_and_whitespace() {
        for raw in ["", "   ", "\n\t"] {
            assert_eq!(
                classify(raw),
                ParsedQr::Unrecognized { raw: raw.into(), reason: REASON_EMPTY.into() }
            );
        }
    }

    #[test]
    fn test_classify_is_pure() {
        for raw in ["WIFI:S:a;;", "{\"ip\":\"1.1.1.1\"}", "8.8.8.8", "junk", ""] {
            assert_eq!(classify(raw), classify(raw));
        }
    }

    #[test]
    fn test_is_ipv4() {
        assert!(is_ipv4("0.0.0.0"));
        assert!(is_ipv4("255.255.255.255"));
        assert!(is_ipv4("192.168.001.010"));
        assert!(!is_ipv4("256.1.1.1"));
        assert!(!is_ipv4("1.1.1."));
        assert!(!is_ipv4("1..1.1"));
        assert!(!is_ipv4("+1.1.1.1"));
        assert!(!is_ipv4("1234.1.1.1"));
    }

    #[test]
    fn test_registration_draft() {
        let bare = classify("192.168.4.21");
        let reg = DeviceRegistration::from_parsed(&bare).unwrap();
        assert_eq!(reg.name, "Device 192.168.4.21");
        assert_eq!(reg.hostname, "Device-21");
        assert_eq!(reg.device_type, DEFAULT_DEVICE_TYPE);

        let descriptor = classify(r#"{"ip":"10.0.0.2","hostname":"Lobby","deviceType":"tissue"}"#);
        let reg = DeviceRegistration::from_parsed(&descriptor).unwrap();
        assert_eq!(reg.name, "Lobby");
        assert_eq!(reg.device_type, "tissue");

        assert!(DeviceRegistration::from_parsed(&classify("WIFI:S:x;;")).is_none());
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(classify("10.1.2.3")).unwrap();
        assert_eq!(json["kind"], "bare_address");
        assert_eq!(json["ip"], "10.1.2.3");

        let json = serde_json::to_value(classify("WIFI:T:WPA2;S:N;P:p;;")).unwrap();
        assert_eq!(json["kind"], "wifi_credentials");
        assert_eq!(json["security"], "WPA2");
    }
}
