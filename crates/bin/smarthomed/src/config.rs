//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `smarthome.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use serde::Deserialize;

use smarthome_adapter_mqtt::MqttConfig;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Database settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Broker used for change notifications.
    pub mqtt: MqttConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// `SQLite` database configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL or file path.
    pub url: String,
    /// Connection pool size.
    pub max_connections: u32,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

impl Config {
    /// Load configuration from `smarthome.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("smarthome.toml")?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    /// Apply overrides looked up by variable name. Unparsable numbers and
    /// booleans are ignored.
    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("SMARTHOME_HOST") {
            self.server.host = val;
        }
        if let Some(port) = var("SMARTHOME_PORT").and_then(|val| val.parse().ok()) {
            self.server.port = port;
        }
        if let Some(val) = var("SMARTHOME_BIND")
            && let Some((host, port)) = val.rsplit_once(':')
        {
            self.server.host = host.to_string();
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }
        if let Some(val) = var("SMARTHOME_DATABASE_URL") {
            self.database.url = val;
        }
        if let Some(val) = var("SMARTHOME_LOG") {
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
        if let Some(enabled) = var("SMARTHOME_MQTT_ENABLED").and_then(|val| val.parse().ok()) {
            self.mqtt.enabled = enabled;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Validation(
                "database.max_connections must be non-zero".to_string(),
            ));
        }
        if self.mqtt.enabled {
            if self.mqtt.broker_host.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "mqtt.broker_host must not be empty".to_string(),
                ));
            }
            if self.mqtt.base_topic.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "mqtt.base_topic must not be empty".to_string(),
                ));
            }
            if self.mqtt.client_id.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "mqtt.client_id must not be empty".to_string(),
                ));
            }
            if self.mqtt.channel_capacity == 0 {
                return Err(ConfigError::Validation(
                    "mqtt.channel_capacity must be non-zero".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Return the database URL in `sqlx`-compatible format.
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database.url
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:smarthome.db?mode=rwc".to_string(),
            max_connections: 5,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "smarthomed=info,smarthome=info,tower_http=debug".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn overridden(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        let mut config = Config::default();
        config.apply_overrides(|key| vars.get(key).cloned());
        config
    }

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database.url, "sqlite:smarthome.db?mode=rwc");
        assert!(config.mqtt.enabled);
        assert_eq!(config.mqtt.base_topic, "smarthome");
    }

    #[test]
    fn should_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn should_parse_full_toml() {
        let toml = "
            [server]
            host = '127.0.0.1'
            port = 9090

            [database]
            url = 'sqlite:test.db'
            max_connections = 2

            [logging]
            filter = 'debug'

            [mqtt]
            enabled = false
            broker_host = 'broker.local'
            base_topic = 'house'
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.database.url, "sqlite:test.db");
        assert_eq!(config.database.max_connections, 2);
        assert_eq!(config.logging.filter, "debug");
        assert!(!config.mqtt.enabled);
        assert_eq!(config.mqtt.broker_host, "broker.local");
        assert_eq!(config.mqtt.base_topic, "house");
        assert_eq!(config.mqtt.broker_port, 1883);
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn should_reject_zero_port() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_empty_connection_pool() {
        let mut config = Config::default();
        config.database.max_connections = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_empty_broker_host_when_mqtt_enabled() {
        let mut config = Config::default();
        config.mqtt.broker_host = String::new();
        assert!(config.validate().is_err());

        config.mqtt.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_reject_empty_base_topic_when_mqtt_enabled() {
        let mut config = Config::default();
        config.mqtt.base_topic = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_accept_defaults() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn should_format_bind_addr() {
        let config = Config::default();
        assert_eq!(config.bind_addr(), "0.0.0.0:3000");
    }

    #[test]
    fn should_apply_bind_override_over_host_and_port() {
        let config = overridden(&[("SMARTHOME_PORT", "8080"), ("SMARTHOME_BIND", "127.0.0.1:9090")]);
        assert_eq!(config.bind_addr(), "127.0.0.1:9090");
    }

    #[test]
    fn should_prefer_rust_log_over_smarthome_log() {
        let config = overridden(&[("SMARTHOME_LOG", "debug"), ("RUST_LOG", "trace")]);
        assert_eq!(config.logging.filter, "trace");
    }

    #[test]
    fn should_apply_mqtt_overrides() {
        let config = overridden(&[
            ("SMARTHOME_MQTT_HOST", "broker.local"),
            ("SMARTHOME_MQTT_PORT", "8883"),
            ("SMARTHOME_MQTT_USERNAME", "hub"),
            ("SMARTHOME_MQTT_PASSWORD", "secret"),
            ("SMARTHOME_MQTT_ENABLED", "false"),
        ]);
        assert_eq!(config.mqtt.broker_host, "broker.local");
        assert_eq!(config.mqtt.broker_port, 8883);
        assert_eq!(config.mqtt.username.as_deref(), Some("hub"));
        assert_eq!(config.mqtt.password.as_deref(), Some("secret"));
        assert!(!config.mqtt.enabled);
    }

    #[test]
    fn should_ignore_unparsable_port_override() {
        let config = overridden(&[("SMARTHOME_PORT", "http")]);
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn should_return_database_url() {
        let config = overridden(&[("SMARTHOME_DATABASE_URL", "sqlite::memory:")]);
        assert_eq!(config.database_url(), "sqlite::memory:");
    }

    #[test]
    fn should_report_parse_error_for_invalid_toml() {
        let result: Result<Config, _> = toml::from_str("invalid {{{");
        assert!(result.is_err());
    }
}
