//! Change monitor: subscribes to the notification topics and logs every
//! message published by [`MqttNotifier`](crate::MqttNotifier).

use std::future::Future;

use rumqttc::{AsyncClient, Event, Packet, QoS};
use serde::Deserialize;

use smarthome_domain::id::EntityKind;

use crate::{MqttConfig, MqttError, RECONNECT_DELAY, options};

const KINDS: [EntityKind; 3] = [EntityKind::Device, EntityKind::Room, EntityKind::User];

/// Body of a change message, as built by [`message`](crate::message).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChangeMessage {
    pub url: String,
    pub method: String,
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default)]
    pub description: String,
}

/// A decoded message together with the collection it was published for.
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    /// Last topic segment, e.g. `devices`.
    pub collection: String,
    pub message: ChangeMessage,
}

impl Change {
    /// Decode a message received on `topic`.
    ///
    /// # Errors
    ///
    /// Returns [`MqttError::Payload`] when the payload is not a change
    /// message.
    pub fn decode(topic: &str, payload: &[u8]) -> Result<Self, MqttError> {
        let message = serde_json::from_slice(payload).map_err(MqttError::Payload)?;
        let collection = topic.rsplit('/').next().unwrap_or(topic).to_string();
        Ok(Self {
            collection,
            message,
        })
    }
}

/// Subscriber logging every change published under `<base_topic>`.
pub struct MqttMonitor {
    config: MqttConfig,
    topics: Vec<String>,
}

impl MqttMonitor {
    /// The monitor connects as `<client_id>-monitor` so it can share a
    /// broker and a configuration file with the daemon.
    #[must_use]
    pub fn new(config: &MqttConfig) -> Self {
        let topics = KINDS
            .iter()
            .map(|kind| format!("{}/{}", config.base_topic, kind.collection()))
            .collect();
        Self {
            config: config.clone(),
            topics,
        }
    }

    /// Topics the monitor subscribes to.
    #[must_use]
    pub fn topics(&self) -> &[String] {
        &self.topics
    }

    /// Drive the connection until `shutdown` resolves.
    ///
    /// Subscriptions are renewed on every connection acknowledgement, since
    /// a clean session forgets them on reconnect.
    pub async fn run(self, shutdown: impl Future<Output = ()>) {
        let options = options(&self.config, format!("{}-monitor", self.config.client_id));
        let (client, mut eventloop) = AsyncClient::new(options, self.config.channel_capacity);
        let mut shutdown = std::pin::pin!(shutdown);
        tracing::info!(topics = ?self.topics, "MQTT monitor started");

        loop {
            tokio::select! {
                () = &mut shutdown => break,
                event = eventloop.poll() => match event {
                    Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                        tracing::info!(code = ?ack.code, "monitor connected to MQTT broker");
                        subscribe(&client, &self.topics);
                    }
                    Ok(Event::Incoming(Packet::Publish(publish))) => {
                        log_change(&publish.topic, &publish.payload);
                    }
                    Ok(event) => tracing::trace!(?event, "MQTT event"),
                    Err(err) => {
                        tracing::warn!(error = %err, "MQTT connection error, retrying");
                        tokio::select! {
                            () = &mut shutdown => break,
                            () = tokio::time::sleep(RECONNECT_DELAY) => {}
                        }
                    }
                },
            }
        }

        if let Err(err) = client.try_disconnect() {
            tracing::debug!(error = %err, "MQTT disconnect could not be queued");
        }
        tracing::info!("MQTT monitor stopped");
    }
}

fn subscribe(client: &AsyncClient, topics: &[String]) {
    for topic in topics {
        if let Err(err) = client.try_subscribe(topic.as_str(), QoS::AtLeastOnce) {
            tracing::error!(%topic, error = %err, "subscription could not be queued");
        }
    }
}

fn log_change(topic: &str, payload: &[u8]) {
    match Change::decode(topic, payload) {
        Ok(change) => {
            tracing::info!(
                collection = %change.collection,
                method = %change.message.method,
                url = %change.message.url,
                description = %change.message.description,
                "change received"
            );
            tracing::debug!(data = %change.message.data, "changed entity");
        }
        Err(err) => tracing::warn!(
            %topic,
            error = %err,
            payload = %String::from_utf8_lossy(payload),
            "unreadable change message"
        ),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::message;
    use smarthome_domain::notification::{Notification, Operation};
    use smarthome_domain::room::{Room, RoomType};

    #[test]
    fn should_subscribe_to_every_collection_under_base_topic() {
        let config = MqttConfig {
            base_topic: "house".to_string(),
            ..MqttConfig::default()
        };

        let monitor = MqttMonitor::new(&config);

        assert_eq!(monitor.topics(), ["house/devices", "house/rooms", "house/users"]);
    }

    #[test]
    fn should_decode_messages_published_by_notifier() {
        let room = Room::builder()
            .name("Cellar")
            .room_type(RoomType::Basement)
            .build()
            .unwrap();
        let notification = Notification::of(Operation::Delete, &room, "room 'Cellar' deleted");
        let payload = serde_json::to_vec_pretty(&message(&notification)).unwrap();

        let change = Change::decode("smarthome/rooms", &payload).unwrap();

        assert_eq!(change.collection, "rooms");
        assert_eq!(change.message.method, "DELETE");
        assert_eq!(change.message.url, format!("/api/v1/rooms/{}", room.id));
        assert_eq!(change.message.description, "room 'Cellar' deleted");
        assert_eq!(change.message.data["name"], "Cellar");
    }

    #[test]
    fn should_reject_payload_that_is_not_a_change_message() {
        let result = Change::decode("smarthome/devices", b"lamp on");

        assert!(matches!(result, Err(MqttError::Payload(_))));
    }

    #[tokio::test]
    async fn should_stop_when_shutdown_resolves_even_without_broker() {
        let config = MqttConfig {
            broker_port: 1,
            ..MqttConfig::default()
        };
        let monitor = MqttMonitor::new(&config);

        let stopped = tokio::time::timeout(
            Duration::from_secs(5),
            monitor.run(tokio::time::sleep(Duration::from_millis(50))),
        )
        .await;

        assert!(stopped.is_ok());
    }
}
