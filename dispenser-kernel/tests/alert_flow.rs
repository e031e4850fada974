use async_trait::async_trait;
use dispenser_devkit::{AlertPayload, DeviceQr, MockMqttClient, TestHarness, WifiQr, NOTIFICATION_TOPIC};
use dispenser_kernel::health::HealthTracker;
use dispenser_kernel::models::NotificationRequest;
use dispenser_kernel::mqtt::handle_alert_payload;
use dispenser_kernel::notify::{DispatchError, DispatchOutcome, Dispatcher, NotificationSink, SinkError};
use dispenser_kernel::qr::{self, ParsedQr, ProvisioningAction, WifiSecurity};
use rumqttc::QoS;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Publishes requests on the mock broker like `MqttSink` would.
struct MockSink {
    client: MockMqttClient,
}

#[async_trait]
impl NotificationSink for MockSink {
    async fn submit(&self, request: &NotificationRequest) -> Result<(), SinkError> {
        let payload = serde_json::to_vec(request)?;
        self.client
            .publish(NOTIFICATION_TOPIC, QoS::AtLeastOnce, false, payload)
            .await
            .map_err(|e| SinkError::Rejected(e.to_string()))
    }
}

fn dispatcher_for(harness: &TestHarness) -> Dispatcher {
    let sink = MockSink {
        client: harness.mqtt_client.clone(),
    };
    Dispatcher::new(Arc::new(sink), Duration::from_millis(2000))
}

#[tokio::test]
async fn test_alert_feed_publishes_notification_request() {
    let mut harness = TestHarness::new();
    let dispatcher = dispatcher_for(&harness);
    let health = HealthTracker::new();

    let alert = AlertPayload::tamper("12")
        .device_name("Lobby Dispenser")
        .room("101")
        .floor("1")
        .with_timestamp();
    let result = handle_alert_payload(&dispatcher, &health, &alert.to_bytes().unwrap()).await;
    assert!(matches!(result, Some(Ok(DispatchOutcome::Delivered { .. }))));

    harness.expect_notifications(1);
    harness.verify_expectations().await.unwrap();
    harness
        .assert_field_equals(NOTIFICATION_TOPIC, "title", &Value::from("Tamper Alert"))
        .unwrap();
    harness
        .assert_field_equals(NOTIFICATION_TOPIC, "subtitle", &Value::from("Lobby Dispenser - Room 101, Floor 1"))
        .unwrap();
    harness
        .assert_field_equals(NOTIFICATION_TOPIC, "channel", &Value::from("tamper"))
        .unwrap();
    harness
        .assert_field_equals(NOTIFICATION_TOPIC, "metadata.device_id", &Value::from("12"))
        .unwrap();
}

#[tokio::test]
async fn test_alert_dispatched_in_background_is_observed() {
    let harness = TestHarness::new();
    let dispatcher = Arc::new(dispatcher_for(&harness));
    let health = HealthTracker::new();
    let bytes = AlertPayload::new("maintenance", "21", "Service due").to_bytes().unwrap();

    let task = {
        let dispatcher = dispatcher.clone();
        tokio::spawn(async move { handle_alert_payload(&dispatcher, &health, &bytes).await })
    };

    let request = harness.wait_for_message(NOTIFICATION_TOPIC, 2000).await.unwrap();
    assert_eq!(request.unwrap()["channel"], "default");
    assert!(matches!(task.await.unwrap(), Some(Ok(DispatchOutcome::Delivered { .. }))));
    assert!(harness.wait_for_message("dispenser/other", 50).await.unwrap().is_none());
}

#[tokio::test]
async fn test_repeated_alert_is_published_once() {
    let mut harness = TestHarness::new();
    let dispatcher = dispatcher_for(&harness);
    let health = HealthTracker::new();
    let bytes = AlertPayload::empty("4").to_bytes().unwrap();

    for _ in 0..3 {
        handle_alert_payload(&dispatcher, &health, &bytes).await;
    }
    let other_device = AlertPayload::empty("5").to_bytes().unwrap();
    handle_alert_payload(&dispatcher, &health, &other_device).await;

    harness.expect_notifications(2);
    harness.verify_expectations().await.unwrap();
    let counters = health.get_health().dispatch;
    assert_eq!((counters.delivered, counters.suppressed), (2, 2));
}

#[tokio::test]
async fn test_unknown_alert_type_publishes_nothing() {
    let harness = TestHarness::new();
    let dispatcher = dispatcher_for(&harness);
    let health = HealthTracker::new();
    let bytes = AlertPayload::new("flood", "9", "Water").to_bytes().unwrap();

    let result = handle_alert_payload(&dispatcher, &health, &bytes).await;
    assert_eq!(result, Some(Err(DispatchError::UnknownAlertType("flood".into()))));
    assert_eq!(harness.get_stats().total_messages, 0);
}

#[test]
fn test_generated_wifi_codes_classify() {
    let code = WifiQr::new("Office;5G").security("WPA").password("s3cr:t").hidden(true).build();
    let ParsedQr::WifiCredentials(creds) = qr::classify(&code) else {
        panic!("expected wifi credentials for {code}");
    };
    assert_eq!(creds.ssid, "Office;5G");
    assert_eq!(creds.password, "s3cr:t");
    assert_eq!(creds.security, WifiSecurity::Wpa);
    assert!(creds.hidden);

    let open = qr::classify(&WifiQr::new("Guest").unterminated().build());
    assert_eq!(open.action(), Some(ProvisioningAction::ConnectWifi));
}

#[test]
fn test_generated_device_codes_classify() {
    let code = DeviceQr::new("192.168.1.100").hostname("disp-01").device_type("Dispenser").build();
    let parsed = qr::classify(&code);
    assert_eq!(parsed.action(), Some(ProvisioningAction::AddDevice));
    assert_eq!(parsed.ip(), Some("192.168.1.100"));

    let bad_ip = qr::classify(&DeviceQr::new("999.1.1.1").build());
    assert!(!bad_ip.is_recognized());
}
