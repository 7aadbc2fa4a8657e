//! Sensor Source Library
//!
//! Interchangeable sensor sources for the triggered sensor node:
//! - ADT7410 ambient temperature sensor (I2C)
//! - LSM9DS1 accelerometer (I2C)
//! - Scripted mock source for tests and bench runs
//!
//! Every source goes through a one-time [`SensorSource::begin`] step before
//! the first [`SensorSource::read`].

pub mod adt7410;
pub mod clock;
pub mod lsm9ds1;
pub mod measurement;
pub mod mock;

#[cfg(test)]
pub(crate) mod test_bus;

pub use adt7410::{Adt7410, ADT7410_DEFAULT_ADDRESS};
pub use clock::{Clock, ManualClock, SystemClock};
pub use lsm9ds1::{AccelScale, Lsm9ds1, Lsm9ds1Config};
pub use measurement::{celsius_to_fahrenheit, Measurement, SensorKind};
pub use mock::MockSensor;

use thiserror::Error;

/// Sensor error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SensorError {
    #[error("Bus transaction failed: {0}")]
    Bus(String),

    #[error("Sensor not detected: expected id {expected:#04X}, found {found:#04X}")]
    NotDetected { expected: u8, found: u8 },

    #[error("Sensor not initialized")]
    NotInitialized,
}

impl SensorError {
    pub(crate) fn from_bus<E: embedded_hal::i2c::Error>(err: E) -> Self {
        SensorError::Bus(format!("{:?}", err.kind()))
    }
}

/// A device that produces one [`Measurement`] per read.
///
/// The active source is chosen once when the node is built; the pipeline only
/// ever sees this trait.
pub trait SensorSource {
    /// Which payload variant this source produces
    fn kind(&self) -> SensorKind;

    /// One-time device startup. Must succeed before any read.
    fn begin(&mut self) -> Result<(), SensorError>;

    /// Take a single reading
    fn read(&mut self) -> Result<Measurement, SensorError>;
}

impl<S: SensorSource + ?Sized> SensorSource for Box<S> {
    fn kind(&self) -> SensorKind {
        (**self).kind()
    }

    fn begin(&mut self) -> Result<(), SensorError> {
        (**self).begin()
    }

    fn read(&mut self) -> Result<Measurement, SensorError> {
        (**self).read()
    }
}
