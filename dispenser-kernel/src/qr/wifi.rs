//! `WIFI:` QR payloads (`WIFI:T:<security>;S:<ssid>;P:<password>;H:<hidden>;;`)
//!
//! Segments are split on unescaped `;` and values are unescaped, so `\;`,
//! `\,`, `\:` and `\\` stay literal inside SSIDs and passwords. A missing
//! `;;` terminator is accepted; `qr::diagnose` reports it.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

pub const WIFI_PREFIX: &str = "WIFI:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WifiSecurity {
    #[serde(rename = "WPA")]
    Wpa,
    #[serde(rename = "WPA2")]
    Wpa2,
    #[serde(rename = "WEP")]
    Wep,
    #[serde(rename = "nopass")]
    Nopass,
}

impl WifiSecurity {
    /// Empty means open network. WPA3/SAE networks are joined as WPA2.
    fn parse(value: &str) -> Result<Self, String> {
        match value.to_ascii_lowercase().as_str() {
            "" | "nopass" => Ok(WifiSecurity::Nopass),
            "wpa" => Ok(WifiSecurity::Wpa),
            "wpa2" | "wpa3" | "sae" => Ok(WifiSecurity::Wpa2),
            "wep" => Ok(WifiSecurity::Wep),
            _ => Err(format!("unsupported security type: {value}")),
        }
    }
}

impl fmt::Display for WifiSecurity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WifiSecurity::Wpa => "WPA",
            WifiSecurity::Wpa2 => "WPA2",
            WifiSecurity::Wep => "WEP",
            WifiSecurity::Nopass => "nopass",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WifiCredentials {
    pub ssid: String,
    pub password: String,
    pub security: WifiSecurity,
    pub hidden: bool,
}

impl WifiCredentials {
    pub fn is_open(&self) -> bool {
        self.security == WifiSecurity::Nopass || self.password.is_empty()
    }
}

/// Case-insensitive `WIFI:` prefix check.
pub fn has_wifi_prefix(text: &str) -> bool {
    text.get(..WIFI_PREFIX.len())
        .is_some_and(|p| p.eq_ignore_ascii_case(WIFI_PREFIX))
}

/// Parses an already-trimmed payload starting with `WIFI:`.
/// The error is the human-readable reason used for `Unrecognized`.
pub fn parse_wifi(payload: &str) -> Result<WifiCredentials, String> {
    if !has_wifi_prefix(payload) {
        return Err("missing WIFI: prefix".to_string());
    }
    let body = &payload[WIFI_PREFIX.len()..];

    let mut ssid: Option<String> = None;
    let mut password: Option<String> = None;
    let mut security: Option<String> = None;
    let mut hidden = false;

    for segment in split_unescaped(body, ';') {
        if segment.trim().is_empty() {
            continue;
        }
        let Some((key, raw_value)) = segment.split_once(':') else {
            debug!(segment, "wifi qr segment without key");
            continue;
        };
        let value = unescape(raw_value);
        match key.trim().to_ascii_uppercase().as_str() {
            "T" => security = Some(value),
            "S" => ssid = Some(value),
            "P" => password = Some(value),
            "H" => hidden = value.eq_ignore_ascii_case("true"),
            other => debug!(key = other, "unknown wifi qr field"),
        }
    }

    let ssid = ssid
        .filter(|s| !s.is_empty())
        .ok_or_else(|| "no SSID found in WiFi QR code".to_string())?;
    let security = WifiSecurity::parse(security.as_deref().unwrap_or(""))?;

    Ok(WifiCredentials {
        ssid,
        password: password.unwrap_or_default(),
        security,
        hidden,
    })
}

/// Splits on `sep` except where it is preceded by an unescaped backslash.
pub(crate) fn split_unescaped(input: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut escaped = false;
    for (idx, ch) in input.char_indices() {
        if escaped {
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else if ch == sep {
            parts.push(&input[start..idx]);
            start = idx + ch.len_utf8();
        }
    }
    parts.push(&input[start..]);
    parts
}

fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            // a trailing lone backslash is kept as-is
            out.push(chars.next().unwrap_or('\\'));
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_in_any_order() {
        let creds = parse_wifi("WIFI:S:TestWiFi;T:WPA2;P:test123;;").unwrap();
        assert_eq!(creds.ssid, "TestWiFi");
        assert_eq!(creds.password, "test123");
        assert_eq!(creds.security, WifiSecurity::Wpa2);
        assert!(!creds.hidden);
    }

    #[test]
    fn test_escaped_separators_stay_literal() {
        let creds = parse_wifi(r"WIFI:T:WPA;S:Cafe\;Bar;P:pa\:ss\\w\,rd;;").unwrap();
        assert_eq!(creds.ssid, "Cafe;Bar");
        assert_eq!(creds.password, r"pa:ss\w,rd");
    }

    #[test]
    fn test_open_network_and_hidden_flag() {
        let creds = parse_wifi("WIFI:T:nopass;S:OpenNetwork;P:;H:TRUE;;").unwrap();
        assert_eq!(creds.security, WifiSecurity::Nopass);
        assert!(creds.hidden);
        assert!(creds.is_open());

        let creds = parse_wifi("WIFI:S:Guest Network;P:guestpass").unwrap();
        assert_eq!(creds.ssid, "Guest Network");
        assert_eq!(creds.security, WifiSecurity::Nopass);
    }

    #[test]
    fn test_missing_ssid_is_an_error() {
        assert!(parse_wifi("WIFI:T:WPA;P:secret;;").is_err());
        assert!(parse_wifi("WIFI:T:WPA;S:;P:secret;;").is_err());
    }

    #[test]
    fn test_unsupported_security() {
        let err = parse_wifi("WIFI:T:RADIUS;S:Corp;;").unwrap_err();
        assert!(err.contains("RADIUS"));
        assert_eq!(parse_wifi("WIFI:T:sae;S:Home;P:x;;").unwrap().security, WifiSecurity::Wpa2);
    }

    #[test]
    fn test_every_escape_is_unescaped() {
        let creds = parse_wifi(r#"WIFI:T:WPA;S:a\;b\,c\:d\\e\"f;P:x;;"#).unwrap();
        assert_eq!(creds.ssid, r#"a;b,c:d\e"f"#);
    }
}
