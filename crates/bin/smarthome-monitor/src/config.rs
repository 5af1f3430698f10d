//! Monitor configuration: the `[logging]` and `[mqtt]` sections of
//! `smarthome.toml`, so daemon and monitor can share one file. Other
//! sections are ignored.

use serde::Deserialize;

use smarthome_adapter_mqtt::MqttConfig;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub mqtt: MqttConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "smarthome_monitor=info,smarthome_adapter_mqtt=info".to_string(),
        }
    }
}

impl Config {
    /// Load `smarthome.toml` (if present), then apply environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is malformed or the broker settings are
    /// unusable.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::fs::read_to_string("smarthome.toml") {
            Ok(content) => toml::from_str(&content)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(err) => return Err(ConfigError::Io(err)),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("SMARTHOME_MONITOR_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("SMARTHOME_MQTT_HOST") {
            self.mqtt.broker_host = val;
        }
        if let Some(port) = var("SMARTHOME_MQTT_PORT").and_then(|val| val.parse().ok()) {
            self.mqtt.broker_port = port;
        }
        if let Some(val) = var("SMARTHOME_MQTT_USERNAME") {
            self.mqtt.username = Some(val);
        }
        if let Some(val) = var("SMARTHOME_MQTT_PASSWORD") {
            self.mqtt.password = Some(val);
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("mqtt.broker_host", &self.mqtt.broker_host),
            ("mqtt.base_topic", &self.mqtt.base_topic),
            ("mqtt.client_id", &self.mqtt.client_id),
        ];
        if let Some((name, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(ConfigError::Validation(format!("{name} must not be empty")));
        }
        if self.mqtt.channel_capacity == 0 {
            return Err(ConfigError::Validation(
                "mqtt.channel_capacity must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn should_read_mqtt_section_and_ignore_daemon_sections() {
        let toml = "
            [server]
            port = 9090

            [mqtt]
            broker_host = 'broker.local'
            base_topic = 'house'
        ";

        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.mqtt.broker_host, "broker.local");
        assert_eq!(config.mqtt.base_topic, "house");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_apply_broker_overrides() {
        let vars: HashMap<&str, &str> = [
            ("SMARTHOME_MQTT_HOST", "10.0.0.2"),
            ("SMARTHOME_MQTT_PORT", "8883"),
            ("RUST_LOG", "debug"),
        ]
        .into_iter()
        .collect();
        let mut config = Config::default();

        config.apply_overrides(|key| vars.get(key).map(|val| (*val).to_string()));

        assert_eq!(config.mqtt.broker_host, "10.0.0.2");
        assert_eq!(config.mqtt.broker_port, 8883);
        assert_eq!(config.logging.filter, "debug");
    }

    #[test]
    fn should_reject_empty_base_topic() {
        let mut config = Config::default();
        config.mqtt.base_topic = String::new();

        let err = config.validate().unwrap_err();

        assert!(err.to_string().contains("mqtt.base_topic"));
    }
}
