//! Measurement types

use std::fmt;

/// Which kind of sensor is compiled into the node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorKind {
    /// Ambient temperature (ADT7410)
    Temperature,
    /// 3-axis acceleration (LSM9DS1)
    Inertial,
}

impl SensorKind {
    /// Payload `type` tag for this kind
    pub fn type_tag(&self) -> &'static str {
        match self {
            SensorKind::Temperature => "temp",
            SensorKind::Inertial => "imu",
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_tag())
    }
}

/// One sensor reading, created fresh for every dispatch cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Measurement {
    /// Ambient temperature
    Temperature {
        /// Seconds since the Unix epoch
        timestamp: i64,
        /// Degrees Fahrenheit
        value_f: f64,
    },
    /// Acceleration in units of standard gravity
    InertialSample {
        /// Seconds since the Unix epoch
        timestamp: i64,
        x: f64,
        y: f64,
        z: f64,
    },
}

impl Measurement {
    /// Kind of sensor that produced this measurement
    pub fn kind(&self) -> SensorKind {
        match self {
            Measurement::Temperature { .. } => SensorKind::Temperature,
            Measurement::InertialSample { .. } => SensorKind::Inertial,
        }
    }

    /// Timestamp in seconds since the Unix epoch
    pub fn timestamp(&self) -> i64 {
        match *self {
            Measurement::Temperature { timestamp, .. } => timestamp,
            Measurement::InertialSample { timestamp, .. } => timestamp,
        }
    }
}

/// Convert Celsius to Fahrenheit
pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}
