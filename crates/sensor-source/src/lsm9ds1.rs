//! LSM9DS1 9-axis IMU, accelerometer channel
//!
//! Only the accelerometer is read; the magnetometer is probed at startup so a
//! half-populated or wrongly strapped board fails fast.

use crate::clock::Clock;
use crate::measurement::{Measurement, SensorKind};
use crate::{SensorError, SensorSource};
use embedded_hal::i2c::I2c;
use std::sync::Arc;
use tracing::{debug, info};

const REG_WHO_AM_I: u8 = 0x0F;
const REG_CTRL_REG5_XL: u8 = 0x1F;
const REG_CTRL_REG6_XL: u8 = 0x20;
const REG_OUT_X_L_XL: u8 = 0x28;

const WHO_AM_I_AG: u8 = 0x68;
const WHO_AM_I_M: u8 = 0x3D;

/// Enable X, Y and Z accelerometer outputs
const CTRL5_XL_ENABLE_ALL: u8 = 0x38;
/// Output data rate 952 Hz
const CTRL6_XL_ODR_952HZ: u8 = 0b110 << 5;

/// Accelerometer full-scale range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccelScale {
    #[default]
    G2,
    G4,
    G8,
    G16,
}

impl AccelScale {
    /// FS_XL bits of CTRL_REG6_XL
    fn bits(&self) -> u8 {
        match self {
            AccelScale::G2 => 0b00,
            AccelScale::G16 => 0b01,
            AccelScale::G4 => 0b10,
            AccelScale::G8 => 0b11,
        }
    }

    /// Standard gravity per LSB
    pub fn sensitivity(&self) -> f64 {
        match self {
            AccelScale::G2 => 0.000061,
            AccelScale::G4 => 0.000122,
            AccelScale::G8 => 0.000244,
            AccelScale::G16 => 0.000732,
        }
    }
}

/// LSM9DS1 configuration
#[derive(Debug, Clone)]
pub struct Lsm9ds1Config {
    /// Accelerometer/gyroscope address (0x6A if SDO_AG is low)
    pub ag_address: u8,
    /// Magnetometer address (0x1C if SDO_M is low)
    pub m_address: u8,
    /// Accelerometer range
    pub scale: AccelScale,
}

impl Default for Lsm9ds1Config {
    fn default() -> Self {
        Self {
            ag_address: 0x6B,
            m_address: 0x1E,
            scale: AccelScale::G2,
        }
    }
}

/// LSM9DS1 driver
pub struct Lsm9ds1<I> {
    bus: I,
    config: Lsm9ds1Config,
    clock: Arc<dyn Clock>,
    initialized: bool,
}

impl<I: I2c> Lsm9ds1<I> {
    pub fn new(bus: I, config: Lsm9ds1Config, clock: Arc<dyn Clock>) -> Self {
        Self {
            bus,
            config,
            clock,
            initialized: false,
        }
    }

    fn who_am_i(&mut self, address: u8) -> Result<u8, SensorError> {
        let mut id = [0u8; 1];
        self.bus
            .write_read(address, &[REG_WHO_AM_I], &mut id)
            .map_err(SensorError::from_bus)?;
        Ok(id[0])
    }

    /// Read raw accelerometer counts (x, y, z)
    pub fn read_accel_raw(&mut self) -> Result<[i16; 3], SensorError> {
        if !self.initialized {
            return Err(SensorError::NotInitialized);
        }

        let mut buf = [0u8; 6];
        self.bus
            .write_read(self.config.ag_address, &[REG_OUT_X_L_XL], &mut buf)
            .map_err(SensorError::from_bus)?;

        Ok([
            i16::from_le_bytes([buf[0], buf[1]]),
            i16::from_le_bytes([buf[2], buf[3]]),
            i16::from_le_bytes([buf[4], buf[5]]),
        ])
    }

    /// Convert raw counts to standard gravity
    pub fn calc_accel(&self, raw: i16) -> f64 {
        raw as f64 * self.config.scale.sensitivity()
    }

    pub fn release(self) -> I {
        self.bus
    }
}

impl<I: I2c> SensorSource for Lsm9ds1<I> {
    fn kind(&self) -> SensorKind {
        SensorKind::Inertial
    }

    fn begin(&mut self) -> Result<(), SensorError> {
        let ag = self.who_am_i(self.config.ag_address)?;
        if ag != WHO_AM_I_AG {
            return Err(SensorError::NotDetected {
                expected: WHO_AM_I_AG,
                found: ag,
            });
        }

        let m = self.who_am_i(self.config.m_address)?;
        if m != WHO_AM_I_M {
            return Err(SensorError::NotDetected {
                expected: WHO_AM_I_M,
                found: m,
            });
        }

        let address = self.config.ag_address;
        let ctrl6 = CTRL6_XL_ODR_952HZ | (self.config.scale.bits() << 3);
        self.bus
            .write(address, &[REG_CTRL_REG5_XL, CTRL5_XL_ENABLE_ALL])
            .map_err(SensorError::from_bus)?;
        self.bus
            .write(address, &[REG_CTRL_REG6_XL, ctrl6])
            .map_err(SensorError::from_bus)?;

        self.initialized = true;
        info!(
            "LSM9DS1 ready (ag {:#04X}, m {:#04X}, {:?})",
            self.config.ag_address, self.config.m_address, self.config.scale
        );
        Ok(())
    }

    fn read(&mut self) -> Result<Measurement, SensorError> {
        let [ax, ay, az] = self.read_accel_raw()?;
        debug!("LSM9DS1 raw accel ({}, {}, {})", ax, ay, az);

        Ok(Measurement::InertialSample {
            timestamp: self.clock.now(),
            x: self.calc_accel(ax),
            y: self.calc_accel(ay),
            z: self.calc_accel(az),
        })
    }
}
