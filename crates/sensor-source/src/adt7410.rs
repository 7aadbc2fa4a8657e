//! ADT7410 16-bit digital temperature sensor

use crate::clock::Clock;
use crate::measurement::{celsius_to_fahrenheit, Measurement, SensorKind};
use crate::{SensorError, SensorSource};
use embedded_hal::i2c::I2c;
use std::sync::Arc;
use tracing::{debug, info};

/// Default I2C address (A0 and A1 tied low)
pub const ADT7410_DEFAULT_ADDRESS: u8 = 0x48;

const REG_TEMP_MSB: u8 = 0x00;
const REG_CONFIG: u8 = 0x03;
const REG_ID: u8 = 0x0B;

/// Manufacturer ID bits of the ID register
const MANUFACTURER_ID: u8 = 0xC8;
const MANUFACTURER_MASK: u8 = 0xF8;

/// Configuration: 16-bit resolution, continuous conversion
const CONFIG_16BIT: u8 = 0x80;

/// Degrees Celsius per LSB in 16-bit mode
const CELSIUS_PER_LSB: f64 = 1.0 / 128.0;

/// ADT7410 driver
pub struct Adt7410<I> {
    bus: I,
    address: u8,
    clock: Arc<dyn Clock>,
    initialized: bool,
}

impl<I: I2c> Adt7410<I> {
    /// Create a driver at the default address
    pub fn new(bus: I, clock: Arc<dyn Clock>) -> Self {
        Self::with_address(bus, ADT7410_DEFAULT_ADDRESS, clock)
    }

    /// Create a driver at a specific address
    pub fn with_address(bus: I, address: u8, clock: Arc<dyn Clock>) -> Self {
        Self {
            bus,
            address,
            clock,
            initialized: false,
        }
    }

    /// Read the temperature in degrees Celsius
    pub fn read_celsius(&mut self) -> Result<f64, SensorError> {
        if !self.initialized {
            return Err(SensorError::NotInitialized);
        }

        let mut raw = [0u8; 2];
        self.bus
            .write_read(self.address, &[REG_TEMP_MSB], &mut raw)
            .map_err(SensorError::from_bus)?;

        let celsius = i16::from_be_bytes(raw) as f64 * CELSIUS_PER_LSB;
        debug!("ADT7410 raw {:02X?} -> {:.3} C", raw, celsius);
        Ok(celsius)
    }

    /// Release the underlying bus
    pub fn release(self) -> I {
        self.bus
    }
}

impl<I: I2c> SensorSource for Adt7410<I> {
    fn kind(&self) -> SensorKind {
        SensorKind::Temperature
    }

    fn begin(&mut self) -> Result<(), SensorError> {
        let mut id = [0u8; 1];
        self.bus
            .write_read(self.address, &[REG_ID], &mut id)
            .map_err(SensorError::from_bus)?;

        let found = id[0] & MANUFACTURER_MASK;
        if found != MANUFACTURER_ID {
            return Err(SensorError::NotDetected {
                expected: MANUFACTURER_ID,
                found,
            });
        }

        self.bus
            .write(self.address, &[REG_CONFIG, CONFIG_16BIT])
            .map_err(SensorError::from_bus)?;

        self.initialized = true;
        info!("ADT7410 ready at {:#04X} (revision {})", self.address, id[0] & 0x07);
        Ok(())
    }

    fn read(&mut self) -> Result<Measurement, SensorError> {
        let celsius = self.read_celsius()?;
        Ok(Measurement::Temperature {
            timestamp: self.clock.now(),
            value_f: celsius_to_fahrenheit(celsius),
        })
    }
}
