//! Notifier selected at startup from configuration.

use std::future::Future;

use smarthome_adapter_mqtt::{MqttConfig, MqttNotifier};
use smarthome_app::notifier::InProcessNotifier;
use smarthome_app::ports::Notifier;
use smarthome_domain::error::SmartHomeError;
use smarthome_domain::notification::Notification;

const IN_PROCESS_CAPACITY: usize = 256;

/// Either a broker connection or the in-process fallback.
pub enum Notifiers {
    Mqtt(MqttNotifier),
    InProcess(InProcessNotifier),
}

impl Notifiers {
    /// Connect to the broker when enabled, otherwise keep notifications
    /// in-process.
    pub fn from_config(config: &MqttConfig) -> Self {
        if config.enabled {
            Self::Mqtt(MqttNotifier::connect(config))
        } else {
            tracing::info!("MQTT disabled, using in-process notifier");
            Self::InProcess(InProcessNotifier::new(IN_PROCESS_CAPACITY))
        }
    }

    pub async fn shutdown(&self) {
        if let Self::Mqtt(inner) = self {
            inner.shutdown().await;
        }
    }
}

impl Notifier for Notifiers {
    fn publish(
        &self,
        notification: Notification,
    ) -> impl Future<Output = Result<(), SmartHomeError>> + Send {
        async move {
            match self {
                Self::Mqtt(inner) => inner.publish(notification).await,
                Self::InProcess(inner) => inner.publish(notification).await,
            }
        }
    }
}
