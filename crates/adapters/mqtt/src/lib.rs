//! # smarthome-adapter-mqtt
//!
//! MQTT adapter — publishes change notifications to a broker via rumqttc.
//!
//! ## Responsibilities
//! - Connect to an MQTT broker and keep the connection alive in a background task
//! - Implement the `Notifier` port: one JSON message per change, on
//!   `<base_topic>/devices`, `<base_topic>/rooms` or `<base_topic>/users`
//! - Disconnect cleanly on shutdown, even when the broker never answered
//! - Monitor the same topics and log every change ([`MqttMonitor`])
//!
//! Publishing never waits for the broker. A message that cannot be queued is
//! reported as an error to the caller, which logs and drops it.
//!
//! ## Dependency rule
//! Same as other adapters: depends on `smarthome-app` and `smarthome-domain`.

mod config;
mod error;
mod monitor;

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use tokio::task::JoinHandle;

use smarthome_app::ports::Notifier;
use smarthome_domain::error::SmartHomeError;
use smarthome_domain::id::EntityKind;
use smarthome_domain::notification::Notification;

pub use config::MqttConfig;
pub use error::MqttError;
pub use monitor::{Change, ChangeMessage, MqttMonitor};

const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// [`Notifier`] publishing to an MQTT broker.
pub struct MqttNotifier {
    client: AsyncClient,
    base_topic: String,
    driver: Mutex<Option<JoinHandle<()>>>,
}

impl MqttNotifier {
    /// Create the client and spawn the task driving its event loop.
    ///
    /// The connection itself is established asynchronously by that task;
    /// an unreachable broker is logged and retried, not reported here.
    #[must_use]
    pub fn connect(config: &MqttConfig) -> Self {
        let options = options(config, config.client_id.clone());
        let (client, eventloop) = AsyncClient::new(options, config.channel_capacity);
        let driver = tokio::spawn(drive(eventloop));
        tracing::info!(
            host = %config.broker_host,
            port = config.broker_port,
            base_topic = %config.base_topic,
            "MQTT notifier started"
        );

        Self {
            client,
            base_topic: config.base_topic.clone(),
            driver: Mutex::new(Some(driver)),
        }
    }

    /// Topic for notifications about `kind`.
    #[must_use]
    pub fn topic_for(&self, kind: EntityKind) -> String {
        format!("{}/{}", self.base_topic, kind.collection())
    }

    /// Disconnect from the broker and stop the event loop task.
    ///
    /// The disconnect request is only queued: with the broker unreachable
    /// the request queue is never drained, so waiting on it could block
    /// forever. Messages still queued at this point are dropped.
    pub async fn shutdown(&self) {
        let driver = self.driver.lock().ok().and_then(|mut guard| guard.take());
        let Some(driver) = driver else {
            return;
        };
        if let Err(err) = self.client.try_disconnect() {
            tracing::warn!(error = %err, "MQTT disconnect could not be queued");
        }
        driver.abort();
        if let Err(err) = driver.await
            && !err.is_cancelled()
        {
            tracing::warn!(error = %err, "MQTT driver task failed");
        }
        tracing::info!("MQTT notifier stopped");
    }

    fn is_running(&self) -> bool {
        self.driver
            .lock()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }
}

/// Connection options shared by the notifier and the monitor.
fn options(config: &MqttConfig, client_id: String) -> MqttOptions {
    let mut options = MqttOptions::new(client_id, config.broker_host.clone(), config.broker_port);
    options.set_keep_alive(Duration::from_secs(u64::from(config.keep_alive_secs)));
    if let Some(username) = &config.username {
        options.set_credentials(
            username.clone(),
            config.password.clone().unwrap_or_default(),
        );
    }
    options
}

/// Message body: where the change happened, how, and the new state.
#[must_use]
pub fn message(notification: &Notification) -> serde_json::Value {
    serde_json::json!({
        "url": notification.url(),
        "method": notification.operation.method(),
        "data": notification.payload,
        "description": notification.description,
    })
}

async fn drive(mut eventloop: EventLoop) {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                tracing::info!(code = ?ack.code, "connected to MQTT broker");
            }
            Ok(event) => tracing::trace!(?event, "MQTT event"),
            Err(err) => {
                tracing::warn!(error = %err, "MQTT connection error, retrying");
                tokio::time::sleep(RECONNECT_DELAY).await;
            }
        }
    }
}

impl Notifier for MqttNotifier {
    fn publish(
        &self,
        notification: Notification,
    ) -> impl Future<Output = Result<(), SmartHomeError>> + Send {
        let result = if self.is_running() {
            let topic = self.topic_for(notification.kind);
            serde_json::to_vec_pretty(&message(&notification))
                .map_err(MqttError::Payload)
                .and_then(|payload| {
                    self.client
                        .try_publish(topic, QoS::AtLeastOnce, false, payload)
                        .map_err(MqttError::Client)
                })
                .map_err(SmartHomeError::from)
        } else {
            Err(MqttError::NotConnected.into())
        };
        async { result }
    }
}
