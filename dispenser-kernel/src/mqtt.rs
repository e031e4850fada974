use crate::config::MqttConf;
use crate::health::HealthTracker;
use crate::models::AlertEvent;
use crate::notify::{DispatchError, DispatchOutcome, Dispatcher};
use rumqttc::{AsyncClient, Event, EventLoop, Incoming, MqttOptions, QoS};
use std::sync::Arc;
use std::time::Duration;
use tokio::task;
use tracing::{debug, error, info, warn};

pub fn create_mqtt_client(cfg: &MqttConf) -> (AsyncClient, EventLoop) {
    let mut opts = MqttOptions::new(cfg.client_id.as_str(), cfg.host.as_str(), cfg.port);
    opts.set_keep_alive(Duration::from_secs(15));
    AsyncClient::new(opts, 10)
}

/// Decodes one alert payload from the backend feed and dispatches it.
/// Returns `None` when the payload is not a valid `AlertEvent`.
pub async fn handle_alert_payload(
    dispatcher: &Dispatcher,
    health: &HealthTracker,
    payload: &[u8],
) -> Option<Result<DispatchOutcome, DispatchError>> {
    let event: AlertEvent = match serde_json::from_slice(payload) {
        Ok(event) => event,
        Err(e) => {
            warn!(bytes = payload.len(), "invalid alert JSON: {e}");
            return None;
        }
    };
    let result = dispatcher.dispatch(&event).await;
    health.record_dispatch(&result);
    Some(result)
}

/// Polls the event loop, (re)subscribes on every ConnAck and dispatches
/// alerts in their own tasks so sink publishes never wait on this loop.
pub fn spawn_alert_listener(
    client: AsyncClient,
    mut eventloop: EventLoop,
    dispatcher: Arc<Dispatcher>,
    health: HealthTracker,
    alert_topic: String,
) {
    task::spawn(async move {
        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Incoming::ConnAck(_))) => {
                    health.mark_mqtt_connected();
                    info!(topic = %alert_topic, "connected to broker, subscribing");
                    if let Err(e) = client.try_subscribe(alert_topic.as_str(), QoS::AtLeastOnce) {
                        error!("subscribe failed: {e}");
                    }
                }
                Ok(Event::Incoming(Incoming::Publish(p))) if p.topic == alert_topic => {
                    let dispatcher = dispatcher.clone();
                    let health = health.clone();
                    task::spawn(async move {
                        if let Some(result) = handle_alert_payload(&dispatcher, &health, &p.payload).await {
                            debug!(?result, "alert handled");
                        }
                    });
                }
                Ok(_) => {}
                Err(e) => {
                    error!("MQTT error: {e}");
                    health.increment_reconnects();
                    tokio::time::sleep(Duration::from_secs(2)).await;
                }
            }
        }
    });
}
