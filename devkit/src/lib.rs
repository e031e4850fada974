/*!
# Dispenser DevKit - stubs and helpers for kernel tests

- MQTT stub to exercise the alert feed without a broker
- Builders for backend alert payloads and provisioning QR strings
- Test harness with assertions on published messages
*/

pub mod mqtt_stub;
pub mod payloads;
pub mod test_utils;

pub use mqtt_stub::{MockMessage, MockMqttClient};
pub use payloads::{AlertPayload, DeviceQr, WifiQr};
pub use test_utils::TestHarness;

/// Topic the backend publishes alerts on.
pub const ALERT_TOPIC: &str = "dispenser/alerts/event@v1";
/// Topic the kernel publishes notification requests on.
pub const NOTIFICATION_TOPIC: &str = "dispenser/notifications/request@v1";
