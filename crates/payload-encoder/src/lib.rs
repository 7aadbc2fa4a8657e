//! Payload Encoder
//!
//! Serializes a [`Measurement`](sensor_source::Measurement) into a flat JSON
//! object inside a fixed-capacity, reusable buffer:
//!
//! ```text
//! {"type":"temp","ts":1700000000,"tempF":69.8}
//! {"type":"imu","ts":1700000000,"x":0.0,"y":0.0,"z":1.0}
//! ```

mod buffer;
mod encoder;
mod error;

pub use buffer::{EncodedBuffer, MAX_EVENT_DATA_LENGTH};
pub use encoder::PayloadEncoder;
pub use error::EncodeError;
