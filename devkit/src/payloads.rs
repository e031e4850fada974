/*!
Builders for test payloads

- `AlertPayload`: backend alert JSON, as pushed on the alert feed
- `WifiQr`: `WIFI:` provisioning strings with proper escaping
- `DeviceQr`: JSON device descriptor QR strings
*/

use anyhow::Result;
use serde_json::{Map, Value};

#[derive(Debug, Clone)]
pub struct AlertPayload {
    payload: Value,
}

impl AlertPayload {
    pub fn new<K: Into<String>, D: Into<String>, M: Into<String>>(kind: K, device_id: D, message: M) -> Self {
        let mut obj = Map::new();
        obj.insert("type".into(), Value::String(kind.into()));
        obj.insert("device_id".into(), Value::String(device_id.into()));
        obj.insert("message".into(), Value::String(message.into()));
        Self { payload: Value::Object(obj) }
    }

    pub fn tamper<D: Into<String>>(device_id: D) -> Self {
        Self::new("tamper", device_id, "Tamper detected")
    }

    pub fn empty<D: Into<String>>(device_id: D) -> Self {
        Self::new("empty", device_id, "Dispenser is empty")
    }

    pub fn low<D: Into<String>>(device_id: D) -> Self {
        Self::new("low", device_id, "Tissue level low")
    }

    pub fn set_field<S: Into<String>>(mut self, field: S, value: Value) -> Self {
        if let Value::Object(ref mut obj) = self.payload {
            obj.insert(field.into(), value);
        }
        self
    }

    pub fn device_name<S: Into<String>>(self, name: S) -> Self {
        self.set_field("device_name", Value::String(name.into()))
    }

    pub fn room<S: Into<String>>(self, room: S) -> Self {
        self.set_field("room", Value::String(room.into()))
    }

    pub fn floor<S: Into<String>>(self, floor: S) -> Self {
        self.set_field("floor", Value::String(floor.into()))
    }

    pub fn priority(self, priority: i64) -> Self {
        self.set_field("priority", Value::from(priority))
    }

    /// Adds an RFC 3339 `timestamp`, as the backend does.
    pub fn with_timestamp(self) -> Self {
        self.set_field("timestamp", Value::String(chrono::Utc::now().to_rfc3339()))
    }

    pub fn value(&self) -> &Value {
        &self.payload
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&self.payload)?)
    }
}

/// Builds `WIFI:T:..;S:..;P:..;H:..;;` strings.
#[derive(Debug, Clone)]
pub struct WifiQr {
    ssid: String,
    password: Option<String>,
    security: Option<String>,
    hidden: Option<bool>,
    terminated: bool,
}

impl WifiQr {
    pub fn new<S: Into<String>>(ssid: S) -> Self {
        Self {
            ssid: ssid.into(),
            password: None,
            security: None,
            hidden: None,
            terminated: true,
        }
    }

    pub fn password<S: Into<String>>(mut self, password: S) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn security<S: Into<String>>(mut self, security: S) -> Self {
        self.security = Some(security.into());
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = Some(hidden);
        self
    }

    /// Drops the trailing `;;`, as some phone generators do.
    pub fn unterminated(mut self) -> Self {
        self.terminated = false;
        self
    }

    pub fn build(&self) -> String {
        let mut segments = Vec::new();
        if let Some(security) = &self.security {
            segments.push(format!("T:{}", security));
        }
        segments.push(format!("S:{}", escape(&self.ssid)));
        if let Some(password) = &self.password {
            segments.push(format!("P:{}", escape(password)));
        }
        if let Some(hidden) = self.hidden {
            segments.push(format!("H:{}", hidden));
        }
        let mut out = format!("WIFI:{}", segments.join(";"));
        if self.terminated {
            out.push_str(";;");
        }
        out
    }
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '\\' | ';' | ',' | ':' | '"') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Builds JSON device descriptor QR strings.
#[derive(Debug, Clone)]
pub struct DeviceQr {
    fields: Map<String, Value>,
}

impl DeviceQr {
    pub fn new<S: Into<String>>(ip: S) -> Self {
        let mut fields = Map::new();
        fields.insert("ip".into(), Value::String(ip.into()));
        Self { fields }
    }

    pub fn hostname<S: Into<String>>(mut self, hostname: S) -> Self {
        self.fields.insert("hostname".into(), Value::String(hostname.into()));
        self
    }

    pub fn device_type<S: Into<String>>(mut self, device_type: S) -> Self {
        self.fields.insert("deviceType".into(), Value::String(device_type.into()));
        self
    }

    pub fn build(&self) -> String {
        Value::Object(self.fields.clone()).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_payload_fields() {
        let alert = AlertPayload::low("42").device_name("Lobby").room("101").priority(70).with_timestamp();
        let v = alert.value();
        assert_eq!(v["type"], "low");
        assert_eq!(v["device_id"], "42");
        assert_eq!(v["device_name"], "Lobby");
        assert_eq!(v["priority"], 70);
        assert!(v["timestamp"].is_string());
    }

    #[test]
    fn test_wifi_qr_escaping() {
        let qr = WifiQr::new("Cafe;Bar").security("WPA").password("p:w").build();
        assert_eq!(qr, r"WIFI:T:WPA;S:Cafe\;Bar;P:p\:w;;");
        assert_eq!(WifiQr::new("Open").unterminated().build(), "WIFI:S:Open");
    }

    #[test]
    fn test_device_qr_is_json() {
        let qr = DeviceQr::new("192.168.1.100").hostname("SmartDevice").build();
        let v: Value = serde_json::from_str(&qr).unwrap();
        assert_eq!(v["ip"], "192.168.1.100");
        assert_eq!(v["hostname"], "SmartDevice");
    }
}
