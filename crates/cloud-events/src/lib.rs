//! Cloud Event Channel
//!
//! Name-addressed events exchanged with the cloud:
//! - Inbound triggers (no payload), handled on the transport's background task
//! - A single-slot [`PendingRequest`] that hands triggers to the main loop
//! - Outbound fire-and-forget publishes
//!
//! Events are carried over MQTT, one topic per event name.

mod mqtt;
mod pending;
mod publisher;
mod trigger;

pub use mqtt::{event_name, event_topic, CloudConfig, MqttCloud};
pub use pending::PendingRequest;
pub use publisher::{MemoryPublisher, PublishedEvent, Publisher};
pub use trigger::{TriggerFilter, TriggerHandler};

use thiserror::Error;

/// Cloud event error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CloudError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Subscribe failed: {0}")]
    Subscribe(String),

    #[error("Publish failed: {0}")]
    Publish(String),
}
