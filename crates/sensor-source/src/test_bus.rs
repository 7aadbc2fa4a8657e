//! Register-map I2C bus used by the driver tests

use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct FakeBus {
    registers: HashMap<(u8, u8), u8>,
    pub writes: Vec<(u8, Vec<u8>)>,
    pub fail: bool,
}

impl FakeBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, address: u8, register: u8, value: u8) {
        self.registers.insert((address, register), value);
    }

    pub fn set_block(&mut self, address: u8, start: u8, values: &[u8]) {
        for (i, value) in values.iter().enumerate() {
            self.set(address, start + i as u8, *value);
        }
    }

    pub fn get(&self, address: u8, register: u8) -> u8 {
        self.registers.get(&(address, register)).copied().unwrap_or(0)
    }
}

impl ErrorType for FakeBus {
    type Error = ErrorKind;
}

impl I2c for FakeBus {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if self.fail {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        }

        let mut pointer = 0u8;
        for op in operations.iter_mut() {
            match op {
                Operation::Write(bytes) => {
                    self.writes.push((address, bytes.to_vec()));
                    if let Some((&register, data)) = bytes.split_first() {
                        pointer = register;
                        for (i, value) in data.iter().enumerate() {
                            self.registers.insert((address, register + i as u8), *value);
                        }
                    }
                }
                Operation::Read(buf) => {
                    for (i, byte) in buf.iter_mut().enumerate() {
                        *byte = self.get(address, pointer + i as u8);
                    }
                }
            }
        }
        Ok(())
    }
}
