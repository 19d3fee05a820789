// src/serial.rs

//! Host serial backend built on the `serialport` crate.

use crate::common::{
    config::LinkConfig,
    error::{ConnectionErrorKind, SensorError},
    hal_traits::{SensorSerial, SensorTimer},
};
use crate::transport::Transport;
use log::debug;
use serialport::SerialPort;
use std::boxed::Box;
use std::io::{self, Read, Write};
use std::string::String;
use std::time::{Duration, Instant};

/// Per-call port timeout. Kept short so the transport's spin loop, not the
/// driver, enforces the read timeout.
const PORT_POLL_TIMEOUT: Duration = Duration::from_millis(10);

/// An open serial device (8N1, no flow control) plus the host clock.
pub struct SerialPortInterface {
    port: Option<Box<dyn SerialPort>>,
    path: String,
}

impl core::fmt::Debug for SerialPortInterface {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SerialPortInterface")
            .field("path", &self.path)
            .field("open", &self.port.is_some())
            .finish()
    }
}

impl SerialPortInterface {
    /// Opens `path` at `baud_rate`.
    pub fn open(path: &str, baud_rate: u32) -> Result<Self, SensorError<io::Error>> {
        debug!("Opening connection: {} at {} baud", path, baud_rate);
        let port = serialport::new(path, baud_rate)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            .timeout(PORT_POLL_TIMEOUT)
            .open()
            .map_err(|e| {
                debug!("Open of {} failed: {}", path, e);
                SensorError::Connection(connection_error_kind(&e))
            })?;
        Ok(SerialPortInterface {
            port: Some(port),
            path: String::from(path),
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Classifies a failed open for the caller's help text.
pub fn connection_error_kind(error: &serialport::Error) -> ConnectionErrorKind {
    if error.description.to_ascii_lowercase().contains("busy") {
        return ConnectionErrorKind::Busy;
    }
    match error.kind {
        serialport::ErrorKind::Io(io::ErrorKind::NotFound) | serialport::ErrorKind::NoDevice => {
            ConnectionErrorKind::NotFound
        }
        serialport::ErrorKind::Io(io::ErrorKind::PermissionDenied) => ConnectionErrorKind::PermissionDenied,
        _ => ConnectionErrorKind::Other,
    }
}

fn not_open() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "serial port closed")
}

impl SensorSerial for SerialPortInterface {
    type Error = io::Error;

    fn read(&mut self, buf: &mut [u8]) -> nb::Result<usize, Self::Error> {
        let port = self.port.as_mut().ok_or_else(|| nb::Error::Other(not_open()))?;
        match port.read(buf) {
            Ok(0) => Err(nb::Error::WouldBlock),
            Ok(n) => Ok(n),
            Err(e) => match e.kind() {
                io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted => {
                    Err(nb::Error::WouldBlock)
                }
                _ => Err(nb::Error::Other(e)),
            },
        }
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        let port = self.port.as_mut().ok_or_else(not_open)?;
        port.write_all(bytes)
    }

    fn flush(&mut self) -> nb::Result<(), Self::Error> {
        let port = self.port.as_mut().ok_or_else(|| nb::Error::Other(not_open()))?;
        match port.flush() {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Err(nb::Error::WouldBlock),
            Err(e) => Err(nb::Error::Other(e)),
        }
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn close(&mut self) {
        // Dropping the handle releases the device.
        self.port = None;
    }
}

impl SensorTimer for SerialPortInterface {
    type Instant = Instant;

    fn delay_us(&mut self, us: u32) {
        std::thread::sleep(Duration::from_micros(u64::from(us)));
    }

    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(Duration::from_millis(u64::from(ms)));
    }

    fn now(&self) -> Self::Instant {
        Instant::now()
    }
}

impl Transport<SerialPortInterface> {
    /// Opens a serial device with the default read timeout.
    pub fn open(path: &str, baud_rate: u32) -> Result<Self, SensorError<io::Error>> {
        Self::open_with(path, &LinkConfig::default().baud_rate(baud_rate))
    }

    /// Opens a serial device with the baud rate and read timeout from `config`.
    pub fn open_with(path: &str, config: &LinkConfig) -> Result<Self, SensorError<io::Error>> {
        let interface = SerialPortInterface::open(path, config.baud_rate)?;
        Ok(Transport::with_config(interface, config))
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    fn error(kind: serialport::ErrorKind, description: &str) -> serialport::Error {
        serialport::Error::new(kind, description)
    }

    #[test]
    fn test_error_kind_mapping() {
        assert_eq!(
            connection_error_kind(&error(serialport::ErrorKind::Io(io::ErrorKind::NotFound), "No such file or directory")),
            ConnectionErrorKind::NotFound
        );
        assert_eq!(
            connection_error_kind(&error(serialport::ErrorKind::NoDevice, "Not a typewriter")),
            ConnectionErrorKind::NotFound
        );
        assert_eq!(
            connection_error_kind(&error(
                serialport::ErrorKind::Io(io::ErrorKind::PermissionDenied),
                "Permission denied"
            )),
            ConnectionErrorKind::PermissionDenied
        );
        assert_eq!(
            connection_error_kind(&error(serialport::ErrorKind::NoDevice, "Device or resource busy")),
            ConnectionErrorKind::Busy
        );
        assert_eq!(
            connection_error_kind(&error(serialport::ErrorKind::InvalidInput, "bad baud")),
            ConnectionErrorKind::Other
        );
    }

    #[test]
    fn test_open_missing_device() {
        let result = Transport::<SerialPortInterface>::open("/dev/a542-autostart-does-not-exist", 460_800);
        assert!(matches!(result, Err(SensorError::Connection(_))));
    }
}
