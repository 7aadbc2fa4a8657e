//! Measurement to JSON encoder

use crate::buffer::EncodedBuffer;
use crate::error::EncodeError;
use sensor_source::Measurement;
use serde::Serialize;
use tracing::{debug, warn};

/// Wire shape of a payload. `type` is always written first.
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum Payload {
    #[serde(rename = "temp")]
    Temperature {
        ts: i64,
        #[serde(rename = "tempF")]
        temp_f: f64,
    },
    #[serde(rename = "imu")]
    Inertial { ts: i64, x: f64, y: f64, z: f64 },
}

impl Payload {
    fn from_measurement(measurement: &Measurement) -> Result<Self, EncodeError> {
        match *measurement {
            Measurement::Temperature { timestamp, value_f } => {
                ensure_finite("tempF", value_f)?;
                Ok(Payload::Temperature {
                    ts: timestamp,
                    temp_f: value_f,
                })
            }
            Measurement::InertialSample { timestamp, x, y, z } => {
                ensure_finite("x", x)?;
                ensure_finite("y", y)?;
                ensure_finite("z", z)?;
                Ok(Payload::Inertial { ts: timestamp, x, y, z })
            }
        }
    }
}

fn ensure_finite(field: &'static str, value: f64) -> Result<(), EncodeError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(EncodeError::NonFinite { field })
    }
}

/// Encodes measurements into an [`EncodedBuffer`]
#[derive(Debug, Clone, Copy, Default)]
pub struct PayloadEncoder;

impl PayloadEncoder {
    pub fn new() -> Self {
        Self
    }

    /// Encode `measurement` into `out`, replacing its previous content.
    ///
    /// On error `out` is left empty. Returns the payload length.
    pub fn encode(
        &self,
        measurement: &Measurement,
        out: &mut EncodedBuffer,
    ) -> Result<usize, EncodeError> {
        out.clear();

        let payload = Payload::from_measurement(measurement)?;
        if let Err(e) = serde_json::to_writer(out.writer(), &payload) {
            out.clear();
            if e.is_io() {
                warn!("Payload does not fit {} byte buffer", out.capacity());
                return Err(EncodeError::Overflow {
                    capacity: out.capacity(),
                });
            }
            return Err(EncodeError::Serialization(e.to_string()));
        }

        debug!("Encoded {} byte payload", out.len());
        Ok(out.len())
    }
}
