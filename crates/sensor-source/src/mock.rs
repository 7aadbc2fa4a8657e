//! Scripted sensor source for tests and hardware-free runs

use crate::clock::Clock;
use crate::measurement::{celsius_to_fahrenheit, Measurement, SensorKind};
use crate::{SensorError, SensorSource};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy)]
enum Reading {
    Celsius(f64),
    Accel([f64; 3]),
}

/// Mock sensor with a fixed reading and scriptable failures
pub struct MockSensor {
    reading: Reading,
    clock: Arc<dyn Clock>,
    startup_ok: bool,
    failing_reads: u32,
    initialized: bool,
    reads: usize,
}

impl MockSensor {
    /// Temperature source reporting `celsius`
    pub fn temperature(clock: Arc<dyn Clock>, celsius: f64) -> Self {
        Self::with_reading(clock, Reading::Celsius(celsius))
    }

    /// Inertial source reporting `(x, y, z)` in g
    pub fn inertial(clock: Arc<dyn Clock>, accel: [f64; 3]) -> Self {
        Self::with_reading(clock, Reading::Accel(accel))
    }

    fn with_reading(clock: Arc<dyn Clock>, reading: Reading) -> Self {
        Self {
            reading,
            clock,
            startup_ok: true,
            failing_reads: 0,
            initialized: false,
            reads: 0,
        }
    }

    /// Make `begin` report the device as absent
    pub fn with_startup_failure(mut self) -> Self {
        self.startup_ok = false;
        self
    }

    /// Fail the next `count` reads with a bus error
    pub fn fail_next_reads(&mut self, count: u32) {
        self.failing_reads = count;
    }

    /// Change the reported temperature
    pub fn set_celsius(&mut self, celsius: f64) {
        self.reading = Reading::Celsius(celsius);
    }

    /// Change the reported acceleration
    pub fn set_accel(&mut self, accel: [f64; 3]) {
        self.reading = Reading::Accel(accel);
    }

    /// Number of read attempts, failed ones included
    pub fn read_count(&self) -> usize {
        self.reads
    }
}

impl SensorSource for MockSensor {
    fn kind(&self) -> SensorKind {
        match self.reading {
            Reading::Celsius(_) => SensorKind::Temperature,
            Reading::Accel(_) => SensorKind::Inertial,
        }
    }

    fn begin(&mut self) -> Result<(), SensorError> {
        if !self.startup_ok {
            return Err(SensorError::NotDetected {
                expected: 0xFF,
                found: 0x00,
            });
        }
        self.initialized = true;
        Ok(())
    }

    fn read(&mut self) -> Result<Measurement, SensorError> {
        if !self.initialized {
            return Err(SensorError::NotInitialized);
        }

        self.reads += 1;
        if self.failing_reads > 0 {
            self.failing_reads -= 1;
            debug!("Mock sensor read failure injected");
            return Err(SensorError::Bus("injected failure".to_string()));
        }

        let timestamp = self.clock.now();
        Ok(match self.reading {
            Reading::Celsius(celsius) => Measurement::Temperature {
                timestamp,
                value_f: celsius_to_fahrenheit(celsius),
            },
            Reading::Accel([x, y, z]) => Measurement::InertialSample { timestamp, x, y, z },
        })
    }
}
