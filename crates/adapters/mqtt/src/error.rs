//! MQTT adapter error types.

use smarthome_domain::error::SmartHomeError;

/// Errors specific to the MQTT adapter.
#[derive(Debug, thiserror::Error)]
pub enum MqttError {
    /// The notifier was shut down.
    #[error("MQTT client not connected")]
    NotConnected,

    /// The rumqttc client refused the request, usually because its queue is full.
    #[error("MQTT client error")]
    Client(#[source] rumqttc::ClientError),

    /// Failed to encode an outgoing message.
    #[error("failed to encode MQTT payload")]
    Payload(#[source] serde_json::Error),
}

impl From<MqttError> for SmartHomeError {
    fn from(err: MqttError) -> Self {
        Self::Storage(Box::new(err))
    }
}
