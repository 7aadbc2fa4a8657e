//! Node configuration
//!
//! Loaded from an optional TOML file, then overridden by environment
//! variables such as `SENSOR_NODE__BROKER_HOST`.

use crate::pipeline::PipelineConfig;
use crate::NodeError;
use cloud_events::CloudConfig;
use ::config::{Config, Environment, File, FileFormat};
use payload_encoder::MAX_EVENT_DATA_LENGTH;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "SENSOR_NODE";

/// Node configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Device identifier, used as the MQTT client id
    pub device_id: String,
    /// MQTT broker host
    pub broker_host: String,
    /// MQTT port
    pub broker_port: u16,
    /// Topic prefix for all events
    pub topic_prefix: String,
    /// Inbound event that requests a reading (prefix match)
    pub trigger_event: String,
    /// Outbound event carrying the reading
    pub publish_event: String,
    /// I2C bus device node
    pub i2c_device: String,
    /// Main loop poll interval (milliseconds)
    pub poll_interval_ms: u64,
    /// Extra publish attempts after a failure
    pub publish_retries: u32,
    /// Delay between publish attempts (milliseconds)
    pub retry_backoff_ms: u64,
    /// Payload buffer size, one byte reserved
    pub payload_capacity: usize,
    /// Default log filter when RUST_LOG is unset
    pub log_level: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            device_id: "sensor-node".to_string(),
            broker_host: "localhost".to_string(),
            broker_port: 1883,
            topic_prefix: "events".to_string(),
            trigger_event: "SEND-DATA".to_string(),
            publish_event: "PROCESS-DATA".to_string(),
            i2c_device: "/dev/i2c-1".to_string(),
            poll_interval_ms: 10,
            publish_retries: 0,
            retry_backoff_ms: 100,
            payload_capacity: MAX_EVENT_DATA_LENGTH + 1,
            log_level: "info".to_string(),
        }
    }
}

impl NodeConfig {
    /// Load from `path` (if given) and the environment
    pub fn load(path: Option<&Path>) -> Result<Self, NodeError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        let config: NodeConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document, ignoring the environment
    pub fn from_toml(source: &str) -> Result<Self, NodeError> {
        let config: NodeConfig = Config::builder()
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the node cannot run with
    pub fn validate(&self) -> Result<(), NodeError> {
        if self.trigger_event.is_empty() {
            return Err(NodeError::Config("trigger_event must not be empty".to_string()));
        }
        if self.publish_event.is_empty() {
            return Err(NodeError::Config("publish_event must not be empty".to_string()));
        }
        // Triggers match by prefix on the same topic space as our own publishes
        if self.publish_event.starts_with(&self.trigger_event) {
            return Err(NodeError::Config(format!(
                "trigger_event {:?} would match publish_event {:?}",
                self.trigger_event, self.publish_event
            )));
        }
        if self.payload_capacity < 2 || self.payload_capacity > MAX_EVENT_DATA_LENGTH + 1 {
            return Err(NodeError::Config(format!(
                "payload_capacity must be within 2..={}",
                MAX_EVENT_DATA_LENGTH + 1
            )));
        }
        if self.poll_interval_ms == 0 {
            return Err(NodeError::Config("poll_interval_ms must be positive".to_string()));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn cloud_config(&self) -> CloudConfig {
        CloudConfig {
            broker_host: self.broker_host.clone(),
            broker_port: self.broker_port,
            client_id: self.device_id.clone(),
            topic_prefix: self.topic_prefix.clone(),
            ..Default::default()
        }
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            publish_event: self.publish_event.clone(),
            publish_retries: self.publish_retries,
            retry_backoff: Duration::from_millis(self.retry_backoff_ms),
            payload_capacity: self.payload_capacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = NodeConfig::default();
        assert_eq!(config.trigger_event, "SEND-DATA");
        assert_eq!(config.publish_event, "PROCESS-DATA");
        assert_eq!(config.payload_capacity, 1025);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = NodeConfig::from_toml(
            r#"
            broker_host = "broker.local"
            broker_port = 8883
            publish_retries = 2
            "#,
        )
        .unwrap();

        assert_eq!(config.broker_host, "broker.local");
        assert_eq!(config.broker_port, 8883);
        assert_eq!(config.publish_retries, 2);
        assert_eq!(config.trigger_event, "SEND-DATA");
        assert_eq!(config.i2c_device, "/dev/i2c-1");
    }

    #[test]
    fn test_invalid_capacity() {
        let err = NodeConfig::from_toml("payload_capacity = 1").unwrap_err();
        assert!(matches!(err, NodeError::Config(_)));

        let err = NodeConfig::from_toml("payload_capacity = 4096").unwrap_err();
        assert!(matches!(err, NodeError::Config(_)));
    }

    #[test]
    fn test_empty_event_names_rejected() {
        assert!(NodeConfig::from_toml(r#"trigger_event = """#).is_err());
        assert!(NodeConfig::from_toml(r#"publish_event = """#).is_err());
    }

    #[test]
    fn test_trigger_matching_own_publish_rejected() {
        let err = NodeConfig::from_toml(r#"trigger_event = "PROCESS""#).unwrap_err();
        assert!(matches!(err, NodeError::Config(_)));

        let err = NodeConfig::from_toml(
            r#"
            trigger_event = "DATA"
            publish_event = "DATA"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, NodeError::Config(_)));

        // A trigger longer than the publish name cannot match it
        assert!(NodeConfig::from_toml(r#"trigger_event = "PROCESS-DATA-NOW""#).is_ok());
    }

    #[test]
    fn test_environment_overrides() {
        std::env::set_var("SENSOR_NODE__BROKER_HOST", "broker.env");
        std::env::set_var("SENSOR_NODE__PUBLISH_RETRIES", "3");

        let loaded = NodeConfig::load(None);

        std::env::remove_var("SENSOR_NODE__BROKER_HOST");
        std::env::remove_var("SENSOR_NODE__PUBLISH_RETRIES");

        let config = loaded.unwrap();
        assert_eq!(config.broker_host, "broker.env");
        assert_eq!(config.publish_retries, 3);
        assert_eq!(config.broker_port, 1883);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let path = Path::new("/nonexistent/sensor-node.toml");
        assert!(NodeConfig::load(Some(path)).is_err());
    }

    #[test]
    fn test_derived_configs() {
        let config = NodeConfig {
            device_id: "node-7".to_string(),
            retry_backoff_ms: 250,
            ..Default::default()
        };

        let cloud = config.cloud_config();
        assert_eq!(cloud.client_id, "node-7");
        assert_eq!(cloud.topic_prefix, "events");

        let pipeline = config.pipeline_config();
        assert_eq!(pipeline.publish_event, "PROCESS-DATA");
        assert_eq!(pipeline.retry_backoff, Duration::from_millis(250));
    }
}
