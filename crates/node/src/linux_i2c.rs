//! Linux i2c-dev bus
//!
//! Minimal `embedded-hal` I2C implementation over `/dev/i2c-N`. A transaction
//! is submitted as one `I2C_RDWR` ioctl carrying every operation as an
//! `i2c_msg`, so the kernel issues a repeated START between operations and a
//! single STOP at the end.

use embedded_hal::i2c::{self, ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};
use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Combined read/write transfer ioctl
const I2C_RDWR: libc::c_ulong = 0x0707;
/// Message flag marking a read
const I2C_M_RD: u16 = 0x0001;
/// Kernel limit on messages per `I2C_RDWR` call
const I2C_RDWR_MAX_MSGS: usize = 42;

/// `struct i2c_msg` from `linux/i2c.h`
#[repr(C)]
#[derive(Debug)]
struct I2cMsg {
    addr: u16,
    flags: u16,
    len: u16,
    buf: *mut u8,
}

/// `struct i2c_rdwr_ioctl_data` from `linux/i2c-dev.h`
#[repr(C)]
struct I2cRdwrIoctlData {
    msgs: *mut I2cMsg,
    nmsgs: u32,
}

/// I/O error from the i2c-dev driver
#[derive(Debug, Error)]
#[error("i2c-dev: {0}")]
pub struct LinuxI2cError(#[from] io::Error);

impl i2c::Error for LinuxI2cError {
    fn kind(&self) -> ErrorKind {
        match self.0.raw_os_error() {
            Some(libc::ENXIO) | Some(libc::EREMOTEIO) => {
                ErrorKind::NoAcknowledge(NoAcknowledgeSource::Unknown)
            }
            Some(libc::EAGAIN) => ErrorKind::ArbitrationLoss,
            _ => ErrorKind::Other,
        }
    }
}

fn invalid_input(message: String) -> LinuxI2cError {
    io::Error::new(io::ErrorKind::InvalidInput, message).into()
}

/// Build the kernel message list for one transaction.
///
/// The returned messages borrow the operation buffers through raw pointers
/// and must not outlive `operations`.
fn build_messages(
    address: u8,
    operations: &mut [Operation<'_>],
) -> Result<Vec<I2cMsg>, LinuxI2cError> {
    if operations.len() > I2C_RDWR_MAX_MSGS {
        return Err(invalid_input(format!(
            "{} operations exceed the i2c-dev limit of {}",
            operations.len(),
            I2C_RDWR_MAX_MSGS
        )));
    }

    operations
        .iter_mut()
        .map(|op| -> Result<I2cMsg, LinuxI2cError> {
            let (flags, len, buf) = match op {
                Operation::Write(bytes) => (0, bytes.len(), bytes.as_ptr() as *mut u8),
                Operation::Read(buf) => (I2C_M_RD, buf.len(), buf.as_mut_ptr()),
            };
            let len = u16::try_from(len)
                .map_err(|_| invalid_input(format!("{} byte transfer is too long", len)))?;
            Ok(I2cMsg {
                addr: u16::from(address),
                flags,
                len,
                buf,
            })
        })
        .collect()
}

/// I2C bus backed by a Linux i2c-dev character device
pub struct LinuxI2c {
    file: File,
    path: PathBuf,
}

impl LinuxI2c {
    /// Open an i2c-dev node such as `/dev/i2c-1`
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LinuxI2cError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().read(true).write(true).open(&path)?;
        debug!("Opened I2C bus {}", path.display());
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ErrorType for LinuxI2c {
    type Error = LinuxI2cError;
}

impl I2c for LinuxI2c {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if operations.is_empty() {
            return Ok(());
        }

        let mut msgs = build_messages(address, operations)?;
        let mut data = I2cRdwrIoctlData {
            msgs: msgs.as_mut_ptr(),
            nmsgs: msgs.len() as u32,
        };

        // SAFETY: every msg points into a buffer of `operations`, which outlives
        // this call; read buffers are exclusively borrowed and sized by `len`.
        let ret = unsafe {
            libc::ioctl(
                self.file.as_raw_fd(),
                I2C_RDWR as _,
                &mut data as *mut I2cRdwrIoctlData,
            )
        };
        if ret < 0 {
            return Err(io::Error::last_os_error().into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::i2c::Error;

    #[test]
    fn test_open_missing_device() {
        assert!(LinuxI2c::open("/nonexistent/i2c-99").is_err());
    }

    #[test]
    fn test_error_kinds() {
        let nack = LinuxI2cError(io::Error::from_raw_os_error(libc::ENXIO));
        assert_eq!(nack.kind(), ErrorKind::NoAcknowledge(NoAcknowledgeSource::Unknown));

        let other = LinuxI2cError(io::Error::from_raw_os_error(libc::EIO));
        assert_eq!(other.kind(), ErrorKind::Other);
        assert!(other.to_string().starts_with("i2c-dev: "));
    }

    #[test]
    fn test_register_read_is_one_combined_transfer() {
        let register = [0x28u8];
        let mut data = [0u8; 6];
        let mut ops = [Operation::Write(&register), Operation::Read(&mut data)];

        let msgs = build_messages(0x6B, &mut ops).unwrap();

        assert_eq!(msgs.len(), 2);
        assert_eq!((msgs[0].addr, msgs[0].flags, msgs[0].len), (0x6B, 0, 1));
        assert_eq!((msgs[1].addr, msgs[1].flags, msgs[1].len), (0x6B, I2C_M_RD, 6));
        assert_eq!(msgs[0].buf as *const u8, register.as_ptr());
    }

    #[test]
    fn test_oversized_transfer_rejected() {
        let mut big = vec![0u8; usize::from(u16::MAX) + 1];
        let mut ops = [Operation::Read(&mut big)];
        let err = build_messages(0x48, &mut ops).unwrap_err();
        assert_eq!(err.0.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_too_many_operations_rejected() {
        let byte = [0u8];
        let mut ops: Vec<Operation<'_>> = (0..=I2C_RDWR_MAX_MSGS)
            .map(|_| Operation::Write(&byte))
            .collect();
        assert!(build_messages(0x48, &mut ops).is_err());
    }
}
