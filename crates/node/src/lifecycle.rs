//! Node startup state machine
//!
//! ```text
//! Uninitialized --begin ok--> Ready --> Pipeline
//!       |
//!       +------begin err----> Failed (terminal)
//! ```

use crate::pipeline::{Pipeline, PipelineConfig};
use crate::NodeError;
use cloud_events::{PendingRequest, Publisher};
use sensor_source::{SensorError, SensorSource};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// Interval at which a halted node wakes up
pub const HALT_INTERVAL: Duration = Duration::from_millis(500);

/// Node lifecycle state
#[derive(Debug, Clone, PartialEq)]
pub enum NodeState {
    /// Sensor not started yet
    Uninitialized,
    /// Sensor started, triggers may be served
    Ready,
    /// Sensor startup failed. Terminal.
    Failed(SensorError),
}

/// A sensor node before it starts serving triggers
pub struct Node<S> {
    source: S,
    state: NodeState,
}

impl<S: SensorSource> Node<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            state: NodeState::Uninitialized,
        }
    }

    /// Run the one-time sensor startup.
    ///
    /// Only the first call talks to the device; `Ready` and `Failed` are
    /// final.
    pub fn start(&mut self) -> &NodeState {
        if self.state == NodeState::Uninitialized {
            self.state = match self.source.begin() {
                Ok(()) => {
                    info!("{} sensor started", self.source.kind());
                    NodeState::Ready
                }
                Err(e) => {
                    error!("{} sensor failed to start: {}", self.source.kind(), e);
                    NodeState::Failed(e)
                }
            };
        }
        &self.state
    }

    pub fn state(&self) -> &NodeState {
        &self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == NodeState::Ready
    }

    /// Hand a ready sensor to a new pipeline
    pub fn into_pipeline<P: Publisher>(
        self,
        publisher: P,
        pending: Arc<PendingRequest>,
        config: PipelineConfig,
    ) -> Result<Pipeline<S, P>, NodeError> {
        match self.state {
            NodeState::Ready => Ok(Pipeline::new(self.source, publisher, pending, config)),
            NodeState::Uninitialized => {
                Err(NodeError::NotReady("sensor not started".to_string()))
            }
            NodeState::Failed(e) => Err(NodeError::NotReady(e.to_string())),
        }
    }
}

/// Park the node forever after a fatal startup failure
pub async fn halt() {
    error!("Node halted: sensor unavailable, triggers will not be served");
    loop {
        tokio::time::sleep(HALT_INTERVAL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloud_events::MemoryPublisher;
    use sensor_source::{ManualClock, MockSensor};

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(1_700_000_000))
    }

    #[test]
    fn test_initial_state() {
        let node = Node::new(MockSensor::temperature(clock(), 21.0));
        assert_eq!(node.state(), &NodeState::Uninitialized);
        assert!(!node.is_ready());
    }

    #[test]
    fn test_start_ready() {
        let mut node = Node::new(MockSensor::temperature(clock(), 21.0));
        assert_eq!(node.start(), &NodeState::Ready);
        assert!(node.is_ready());
    }

    #[test]
    fn test_start_failed_is_terminal() {
        let mut node = Node::new(MockSensor::inertial(clock(), [0.0; 3]).with_startup_failure());

        assert!(matches!(node.start(), NodeState::Failed(SensorError::NotDetected { .. })));
        assert!(matches!(node.start(), NodeState::Failed(_)));
    }

    #[tokio::test]
    async fn test_failed_node_never_publishes() {
        let mut node = Node::new(MockSensor::temperature(clock(), 21.0).with_startup_failure());
        node.start();

        let pending = Arc::new(PendingRequest::new());
        pending.signal();
        let result = node.into_pipeline(MemoryPublisher::new(), pending.clone(), PipelineConfig::default());

        assert!(matches!(result, Err(NodeError::NotReady(_))));
        // Nobody consumed the request
        assert!(pending.is_pending());
    }

    #[test]
    fn test_unstarted_node_has_no_pipeline() {
        let node = Node::new(MockSensor::temperature(clock(), 21.0));
        let result = node.into_pipeline(
            MemoryPublisher::new(),
            Arc::new(PendingRequest::new()),
            PipelineConfig::default(),
        );
        assert!(matches!(result, Err(NodeError::NotReady(_))));
    }

    #[tokio::test]
    async fn test_ready_node_builds_pipeline() {
        let mut node = Node::new(MockSensor::temperature(clock(), 21.0));
        node.start();

        let pending = Arc::new(PendingRequest::new());
        let mut pipeline = node
            .into_pipeline(MemoryPublisher::new(), pending.clone(), PipelineConfig::default())
            .unwrap();

        pending.signal();
        assert!(pipeline.poll_once().await.is_some());
        assert_eq!(pipeline.publisher().events().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_halt_does_not_return() {
        let result = tokio::time::timeout(Duration::from_secs(5), halt()).await;
        assert!(result.is_err());
    }
}
