/*!
Mock MQTT client for tests without a broker

Records every publish and lets a test inject incoming messages
(e.g. backend alerts) through an unbounded channel.
*/

use anyhow::Result;
use rumqttc::QoS;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;

#[derive(Debug, Clone)]
pub struct MockMessage {
    pub topic: String,
    pub payload: Vec<u8>,
    pub qos: QoS,
    pub retain: bool,
}

/// Records traffic the way `rumqttc::AsyncClient` would send it.
#[derive(Clone, Default)]
pub struct MockMqttClient {
    published: Arc<Mutex<Vec<MockMessage>>>,
    subscriptions: Arc<Mutex<Vec<String>>>,
    incoming: Arc<Mutex<Option<mpsc::UnboundedSender<MockMessage>>>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockMqttClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Channel receiving everything passed to `simulate_incoming`.
    pub fn setup_receiver(&self) -> mpsc::UnboundedReceiver<MockMessage> {
        let (sender, receiver) = mpsc::unbounded_channel();
        *lock(&self.incoming) = Some(sender);
        receiver
    }

    pub async fn publish<S, V>(&self, topic: S, qos: QoS, retain: bool, payload: V) -> Result<()>
    where
        S: Into<String>,
        V: Into<Vec<u8>>,
    {
        let message = MockMessage {
            topic: topic.into(),
            payload: payload.into(),
            qos,
            retain,
        };
        log::info!("[mock] published to {}: {} bytes", message.topic, message.payload.len());
        lock(&self.published).push(message);
        Ok(())
    }

    pub async fn subscribe<S: Into<String>>(&self, topic: S, _qos: QoS) -> Result<()> {
        let topic = topic.into();
        log::info!("[mock] subscribed to {}", topic);
        lock(&self.subscriptions).push(topic);
        Ok(())
    }

    /// Injects a message as if the broker delivered it.
    pub async fn simulate_incoming<S, V>(&self, topic: S, payload: V) -> Result<()>
    where
        S: Into<String>,
        V: Into<Vec<u8>>,
    {
        let message = MockMessage {
            topic: topic.into(),
            payload: payload.into(),
            qos: QoS::AtLeastOnce,
            retain: false,
        };
        let guard = lock(&self.incoming);
        let Some(sender) = guard.as_ref() else {
            anyhow::bail!("no receiver set up for incoming messages");
        };
        log::info!("[mock] incoming on {}", message.topic);
        sender
            .send(message)
            .map_err(|e| anyhow::anyhow!("send error: {}", e))?;
        Ok(())
    }

    pub fn get_published_messages(&self) -> Vec<MockMessage> {
        lock(&self.published).clone()
    }

    pub fn get_subscriptions(&self) -> Vec<String> {
        lock(&self.subscriptions).clone()
    }

    pub fn find_messages_by_topic(&self, topic: &str) -> Vec<MockMessage> {
        lock(&self.published)
            .iter()
            .filter(|msg| msg.topic == topic)
            .cloned()
            .collect()
    }

    /// Last publish on `topic` decoded as JSON.
    pub fn get_last_json_message<T>(&self, topic: &str) -> Result<Option<T>>
    where
        T: for<'de> serde::Deserialize<'de>,
    {
        match self.find_messages_by_topic(topic).last() {
            Some(msg) => Ok(Some(serde_json::from_slice(&msg.payload)?)),
            None => Ok(None),
        }
    }

    pub fn clear(&self) {
        lock(&self.published).clear();
        lock(&self.subscriptions).clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_and_subscribe_are_recorded() {
        let client = MockMqttClient::new();
        client.subscribe("dispenser/alerts/event@v1", QoS::AtLeastOnce).await.unwrap();
        client
            .publish("dispenser/notifications/request@v1", QoS::AtLeastOnce, false, br#"{"title":"Low Alert"}"#.to_vec())
            .await
            .unwrap();

        assert_eq!(client.get_subscriptions(), vec!["dispenser/alerts/event@v1"]);
        let last: Option<serde_json::Value> =
            client.get_last_json_message("dispenser/notifications/request@v1").unwrap();
        assert_eq!(last.unwrap()["title"], "Low Alert");

        client.clear();
        assert!(client.get_published_messages().is_empty());
    }

    #[tokio::test]
    async fn test_simulated_incoming_reaches_receiver() {
        let client = MockMqttClient::new();
        assert!(client.simulate_incoming("t", b"x".to_vec()).await.is_err());

        let mut rx = client.setup_receiver();
        client.simulate_incoming("t", b"payload".to_vec()).await.unwrap();
        let msg = rx.recv().await.unwrap();
        assert_eq!(msg.topic, "t");
        assert_eq!(msg.payload, b"payload");
    }
}
