//! Encoding Error Types

use thiserror::Error;

/// Errors while encoding a measurement
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// Payload does not fit the buffer
    #[error("Payload exceeds buffer capacity of {capacity} bytes")]
    Overflow { capacity: usize },

    /// JSON cannot represent NaN or infinity
    #[error("Field {field} is not a finite number")]
    NonFinite { field: &'static str },

    /// Serializer failure
    #[error("Serialization error: {0}")]
    Serialization(String),
}
