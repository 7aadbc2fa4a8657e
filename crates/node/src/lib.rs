//! Triggered Sensor Node
//!
//! Waits for a named cloud event, then reads the compiled-in sensor, encodes
//! the reading as JSON and publishes it:
//!
//! ```text
//! MQTT task:  SEND-DATA ──> TriggerHandler ──> PendingRequest
//!                                                   │
//! main loop:  Pipeline ── read ── encode ── publish PROCESS-DATA
//! ```
//!
//! The sensor is chosen at build time: ADT7410 temperature by default, LSM9DS1
//! acceleration with the `imu` feature.

pub mod config;
pub mod lifecycle;
pub mod linux_i2c;
pub mod pipeline;

pub use config::NodeConfig;
pub use lifecycle::{halt, Node, NodeState};
pub use linux_i2c::LinuxI2c;
pub use pipeline::{CycleOutcome, Pipeline, PipelineConfig, PipelineState};

use cloud_events::{CloudError, MqttCloud, PendingRequest, TriggerFilter, TriggerHandler};
use sensor_source::{Clock, SensorError, SensorKind, SensorSource, SystemClock};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Sensor kind compiled into this build
pub const SENSOR_KIND: SensorKind = if cfg!(feature = "imu") {
    SensorKind::Inertial
} else {
    SensorKind::Temperature
};

/// Node error types
#[derive(Error, Debug)]
pub enum NodeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Sensor error: {0}")]
    Sensor(#[from] SensorError),

    #[error("Cloud error: {0}")]
    Cloud(#[from] CloudError),

    #[error("Node not ready: {0}")]
    NotReady(String),
}

impl From<::config::ConfigError> for NodeError {
    fn from(err: ::config::ConfigError) -> Self {
        NodeError::Config(err.to_string())
    }
}

/// Initialize logging. `RUST_LOG` overrides `default_level`.
pub fn init_logging(
    default_level: &str,
) -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
}

/// Open the I2C bus and build the compiled-in sensor driver
pub fn open_sensor(
    config: &NodeConfig,
    clock: Arc<dyn Clock>,
) -> Result<Box<dyn SensorSource + Send>, SensorError> {
    let bus = LinuxI2c::open(&config.i2c_device)
        .map_err(|e| SensorError::Bus(format!("{}: {}", config.i2c_device, e)))?;

    #[cfg(feature = "imu")]
    let source = sensor_source::Lsm9ds1::new(bus, sensor_source::Lsm9ds1Config::default(), clock);
    #[cfg(not(feature = "imu"))]
    let source = sensor_source::Adt7410::new(bus, clock);

    Ok(Box::new(source))
}

/// Start the sensor, connect to the cloud and serve triggers until Ctrl-C.
///
/// A sensor that cannot be opened or started parks the node in [`halt`].
pub async fn run(config: NodeConfig) -> Result<(), NodeError> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let source = match open_sensor(&config, clock) {
        Ok(source) => source,
        Err(e) => {
            error!("{} sensor unavailable: {}", SENSOR_KIND, e);
            halt().await;
            return Ok(());
        }
    };

    let mut node = Node::new(source);
    if let NodeState::Failed(_) = node.start() {
        halt().await;
        return Ok(());
    }

    let pending = Arc::new(PendingRequest::new());
    let handler = TriggerHandler::new(TriggerFilter::new(config.trigger_event.as_str()), pending.clone());
    let cloud = MqttCloud::connect(config.cloud_config(), handler)?;
    info!("Listening for {}", config.trigger_event);

    let mut pipeline = node.into_pipeline(cloud, pending, config.pipeline_config())?;
    tokio::select! {
        _ = pipeline.run(config.poll_interval()) => {}
        _ = tokio::signal::ctrl_c() => info!("Shutting down"),
    }

    Ok(())
}
