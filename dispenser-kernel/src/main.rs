/**
 * DISPENSER KERNEL - service entry point
 *
 * ROLE: bootstrap config, logging, the notification dispatcher, the MQTT
 * alert feed and the REST API.
 */

use anyhow::{Context, Result};
use dispenser_kernel::config::{load_config, SinkKind};
use dispenser_kernel::health::HealthTracker;
use dispenser_kernel::http::{self, AppState};
use dispenser_kernel::mqtt;
use dispenser_kernel::notify::{Dispatcher, LogSink, MqttSink, NotificationSink};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("dispenser_kernel=info")),
        )
        .init();

    let cfg = load_config().await;
    let health_tracker = HealthTracker::new();

    let (client, eventloop) = mqtt::create_mqtt_client(&cfg.mqtt);

    let sink: Arc<dyn NotificationSink> = match cfg.dispatch.sink {
        SinkKind::Mqtt => Arc::new(MqttSink::new(client.clone(), cfg.mqtt.notification_topic.clone())),
        SinkKind::Log => Arc::new(LogSink),
    };
    let dispatcher = Arc::new(Dispatcher::new(sink, cfg.dispatch.debounce()));
    info!(
        debounce_ms = cfg.dispatch.debounce_ms,
        sink = ?cfg.dispatch.sink,
        "notification dispatcher ready"
    );

    mqtt::spawn_alert_listener(
        client.clone(),
        eventloop,
        dispatcher.clone(),
        health_tracker.clone(),
        cfg.mqtt.alert_topic.clone(),
    );
    health_tracker.spawn_health_publisher(client, Duration::from_secs(30));

    let app = http::build_router(AppState::new(dispatcher, health_tracker));

    let listener = TcpListener::bind(&cfg.http.bind)
        .await
        .with_context(|| format!("failed to bind {}", cfg.http.bind))?;
    info!("listening on http://{}", cfg.http.bind);
    axum::serve(listener, app).await.context("HTTP server failed")?;
    Ok(())
}
