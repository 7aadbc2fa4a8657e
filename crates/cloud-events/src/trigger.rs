//! Inbound trigger handling

use crate::pending::PendingRequest;
use std::sync::Arc;
use tracing::debug;

/// Event-name subscription.
///
/// Names match by prefix: a filter for `SEND-DATA` also accepts
/// `SEND-DATA-NOW`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerFilter {
    prefix: String,
}

impl TriggerFilter {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn matches(&self, event_name: &str) -> bool {
        event_name.starts_with(&self.prefix)
    }
}

/// Trigger callback run on the transport's background context.
///
/// It only raises the pending flag; sensor I/O, encoding and publishing all
/// happen on the main loop.
#[derive(Debug, Clone)]
pub struct TriggerHandler {
    filter: TriggerFilter,
    pending: Arc<PendingRequest>,
}

impl TriggerHandler {
    pub fn new(filter: TriggerFilter, pending: Arc<PendingRequest>) -> Self {
        Self { filter, pending }
    }

    pub fn filter(&self) -> &TriggerFilter {
        &self.filter
    }

    /// Handle an inbound event. Payload is ignored.
    ///
    /// Returns `true` if the event name matched the subscription.
    pub fn handle(&self, event_name: &str, _data: &[u8]) -> bool {
        if !self.filter.matches(event_name) {
            return false;
        }

        metrics::counter!("sensor_node_triggers_total").increment(1);
        if self.pending.signal() {
            debug!("Trigger {} received", event_name);
        } else {
            debug!("Trigger {} coalesced with pending request", event_name);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_matching() {
        let filter = TriggerFilter::new("SEND-DATA");
        assert!(filter.matches("SEND-DATA"));
        assert!(filter.matches("SEND-DATA-NOW"));
        assert!(!filter.matches("SEND"));
        assert!(!filter.matches("PROCESS-DATA"));
    }

    #[test]
    fn test_handler_sets_pending() {
        let pending = Arc::new(PendingRequest::new());
        let handler = TriggerHandler::new(TriggerFilter::new("SEND-DATA"), pending.clone());

        assert!(handler.handle("SEND-DATA", b""));
        assert!(pending.take());
    }

    #[test]
    fn test_handler_ignores_other_events() {
        let pending = Arc::new(PendingRequest::new());
        let handler = TriggerHandler::new(TriggerFilter::new("SEND-DATA"), pending.clone());

        assert!(!handler.handle("PROCESS-DATA", b"{}"));
        assert!(!pending.is_pending());
    }

    #[test]
    fn test_payload_is_ignored() {
        let pending = Arc::new(PendingRequest::new());
        let handler = TriggerHandler::new(TriggerFilter::new("SEND-DATA"), pending.clone());

        assert!(handler.handle("SEND-DATA", b"{\"anything\":true}"));
        assert!(pending.take());
    }
}
