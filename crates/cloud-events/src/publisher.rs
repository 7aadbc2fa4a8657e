//! Outbound event publishing

use crate::CloudError;
use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use tracing::debug;

/// Fire-and-forget emission of named events
pub trait Publisher {
    /// Publish `payload` under event `name`.
    ///
    /// `Ok` means the transport accepted the event, not that anyone received it.
    fn publish(
        &self,
        name: &str,
        payload: &[u8],
    ) -> impl Future<Output = Result<(), CloudError>> + Send;
}

/// An event captured by [`MemoryPublisher`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedEvent {
    pub name: String,
    pub payload: Vec<u8>,
}

impl PublishedEvent {
    /// Payload as text
    pub fn payload_str(&self) -> &str {
        std::str::from_utf8(&self.payload).unwrap_or("")
    }
}

/// In-memory publisher for tests and offline runs
#[derive(Debug, Default)]
pub struct MemoryPublisher {
    events: Mutex<Vec<PublishedEvent>>,
    failures: AtomicU32,
    attempts: AtomicU32,
}

impl MemoryPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the next `count` publish attempts
    pub fn fail_next(&self, count: u32) {
        self.failures.store(count, Ordering::SeqCst);
    }

    /// Events accepted so far
    pub fn events(&self) -> Vec<PublishedEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Publish attempts, rejected ones included
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl Publisher for MemoryPublisher {
    async fn publish(&self, name: &str, payload: &[u8]) -> Result<(), CloudError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        let rejected = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if rejected {
            return Err(CloudError::Publish("injected failure".to_string()));
        }

        let mut events = self
            .events
            .lock()
            .map_err(|e| CloudError::Publish(format!("Lock error: {}", e)))?;
        events.push(PublishedEvent {
            name: name.to_string(),
            payload: payload.to_vec(),
        });
        debug!("Captured event {} ({} bytes)", name, payload.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_publisher_captures_events() {
        let publisher = MemoryPublisher::new();
        publisher.publish("PROCESS-DATA", b"{}").await.unwrap();

        let events = publisher.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "PROCESS-DATA");
        assert_eq!(events[0].payload_str(), "{}");
    }

    #[tokio::test]
    async fn test_memory_publisher_injected_failures() {
        let publisher = MemoryPublisher::new();
        publisher.fail_next(2);

        assert!(publisher.publish("A", b"1").await.is_err());
        assert!(publisher.publish("A", b"2").await.is_err());
        assert!(publisher.publish("A", b"3").await.is_ok());

        assert_eq!(publisher.attempts(), 3);
        assert_eq!(publisher.events().len(), 1);
    }
}
