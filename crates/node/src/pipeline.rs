//! Acquire → encode → publish pipeline
//!
//! Runs on the main loop. The trigger handler only raises the shared
//! [`PendingRequest`]; this loop observes it, clears it, and performs one
//! dispatch cycle.

use cloud_events::{CloudError, PendingRequest, Publisher};
use payload_encoder::{EncodeError, EncodedBuffer, PayloadEncoder, MAX_EVENT_DATA_LENGTH};
use sensor_source::{SensorError, SensorSource};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Outbound event name
    pub publish_event: String,
    /// Extra publish attempts after a failure
    pub publish_retries: u32,
    /// Delay between publish attempts
    pub retry_backoff: Duration,
    /// Payload buffer size, one byte reserved
    pub payload_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            publish_event: "PROCESS-DATA".to_string(),
            publish_retries: 0,
            retry_backoff: Duration::from_millis(100),
            payload_capacity: MAX_EVENT_DATA_LENGTH + 1,
        }
    }
}

/// Main loop state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Waiting for a pending request
    Idle,
    /// Running a dispatch cycle
    Dispatching,
}

/// Result of one dispatch cycle
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// Payload handed to the publisher
    Published { bytes: usize },
    /// Sensor read failed; cycle skipped
    ReadFailed(SensorError),
    /// Measurement could not be encoded; cycle skipped
    EncodeFailed(EncodeError),
    /// Every publish attempt failed; payload dropped
    PublishFailed(CloudError),
}

/// Event-triggered sensor pipeline
pub struct Pipeline<S, P> {
    source: S,
    publisher: P,
    encoder: PayloadEncoder,
    buffer: EncodedBuffer,
    pending: Arc<PendingRequest>,
    config: PipelineConfig,
    state: PipelineState,
    cycles: u64,
}

impl<S: SensorSource, P: Publisher> Pipeline<S, P> {
    /// Build a pipeline around a started sensor source
    pub fn new(
        source: S,
        publisher: P,
        pending: Arc<PendingRequest>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            source,
            publisher,
            encoder: PayloadEncoder::new(),
            buffer: EncodedBuffer::new(config.payload_capacity),
            pending,
            config,
            state: PipelineState::Idle,
            cycles: 0,
        }
    }

    /// Check for a pending request and run one cycle if there is one.
    ///
    /// The request is cleared before any work starts, so a trigger arriving
    /// mid-cycle is kept for the next poll.
    pub async fn poll_once(&mut self) -> Option<CycleOutcome> {
        if !self.pending.take() {
            return None;
        }
        Some(self.dispatch().await)
    }

    /// Run forever, polling every `interval`
    pub async fn run(&mut self, interval: Duration) {
        info!(
            "Pipeline running ({} sensor, publishing {})",
            self.source.kind(),
            self.config.publish_event
        );
        loop {
            self.poll_once().await;
            tokio::time::sleep(interval).await;
        }
    }

    /// One acquire → encode → publish cycle
    pub async fn dispatch(&mut self) -> CycleOutcome {
        self.state = PipelineState::Dispatching;
        self.cycles += 1;
        metrics::counter!("sensor_node_dispatch_total").increment(1);

        let outcome = self.acquire_and_publish().await;

        self.state = PipelineState::Idle;
        outcome
    }

    async fn acquire_and_publish(&mut self) -> CycleOutcome {
        // Blocking bus read of at most six bytes. Kept inline: the loop owns the
        // task and `block_in_place` panics on a current-thread runtime.
        let measurement = match self.source.read() {
            Ok(m) => m,
            Err(e) => {
                warn!("Sensor read failed, skipping cycle: {}", e);
                metrics::counter!("sensor_node_read_failures_total").increment(1);
                return CycleOutcome::ReadFailed(e);
            }
        };

        let bytes = match self.encoder.encode(&measurement, &mut self.buffer) {
            Ok(bytes) => bytes,
            Err(e) => {
                error!("Failed to encode {:?}: {}", measurement, e);
                metrics::counter!("sensor_node_encode_failures_total").increment(1);
                return CycleOutcome::EncodeFailed(e);
            }
        };

        match self.publish_with_retry().await {
            Ok(()) => {
                info!("Published {}: {}", self.config.publish_event, self.buffer.as_str());
                CycleOutcome::Published { bytes }
            }
            Err(e) => {
                error!("Dropping payload, publish failed: {}", e);
                metrics::counter!("sensor_node_publish_failures_total").increment(1);
                CycleOutcome::PublishFailed(e)
            }
        }
    }

    async fn publish_with_retry(&self) -> Result<(), CloudError> {
        let mut attempt = 0;
        loop {
            match self
                .publisher
                .publish(&self.config.publish_event, self.buffer.as_bytes())
                .await
            {
                Ok(()) => return Ok(()),
                Err(e) if attempt < self.config.publish_retries => {
                    attempt += 1;
                    warn!(
                        "Publish failed (attempt {}/{}): {}",
                        attempt,
                        self.config.publish_retries + 1,
                        e
                    );
                    tokio::time::sleep(self.config.retry_backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Number of dispatch cycles started
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Last encoded payload
    pub fn buffer(&self) -> &EncodedBuffer {
        &self.buffer
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }
}
