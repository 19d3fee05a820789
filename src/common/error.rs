// src/common/error.rs

use super::window::Window;

/// Why a serial device could not be opened.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ConnectionErrorKind {
    /// The device path does not exist.
    NotFound,
    /// The process lacks permission to open the device.
    PermissionDenied,
    /// Another process holds the device.
    Busy,
    /// Any other open failure.
    Other,
}

impl core::fmt::Display for ConnectionErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let text = match self {
            ConnectionErrorKind::NotFound => "device not found",
            ConnectionErrorKind::PermissionDenied => "permission denied",
            ConnectionErrorKind::Busy => "device busy",
            ConnectionErrorKind::Other => "open failed",
        };
        f.write_str(text)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SensorError<E = ()>
where
    E: core::fmt::Debug,
{
    /// Underlying I/O error from the serial backend.
    #[error("I/O error: {0:?}")]
    Io(E),

    /// The serial device could not be opened.
    #[error("Connection error: {0}")]
    Connection(ConnectionErrorKind),

    /// A command was issued on a transport that has been closed.
    #[error("Connection not open")]
    NotOpen,

    /// No byte arrived within the read timeout.
    #[error("Read timeout occurred")]
    Timeout,

    /// Fewer response bytes than the command expects.
    #[error("Short response: expected {expected} bytes, got {got}")]
    ShortResponse { expected: usize, got: usize },

    /// Response buffer too small for the command sequence.
    #[error("Buffer overflow: needed {needed}, got {got}")]
    BufferOverflow { needed: usize, got: usize },

    /// Window index outside the sensor's register banks.
    #[error("Invalid register window: {0}")]
    InvalidWindow(u8),

    /// A register needed by a batch read could not be read.
    #[error("Failed to read register {address:#04x} in window {window}")]
    RegisterRead { window: Window, address: u8 },

    #[error("Flash backup did not complete in time")]
    FlashBackupTimeout,

    /// DIAG_STAT1.FLASH_BU_ERR was set after a backup.
    #[error("Flash backup error detected (FLASH_BU_ERR=1)")]
    FlashBackupError,

    #[error("Flash test did not complete in time")]
    FlashTestTimeout,

    /// DIAG_STAT1.FLASH_ERR was set after a flash test.
    #[error("FLASH_ERR flag set after flash test")]
    FlashTestError,

    /// MODE_CTRL did not report configuration mode after an exit request.
    #[error("Sensor did not report configuration mode (MODE_CTRL={mode_ctrl:#06x})")]
    ModeNotConfirmed { mode_ctrl: u16 },

    /// GLOB_CMD kept reporting not-ready until the wait bound expired.
    #[error("Timed out waiting for sensor ready state")]
    NotReady,
}

impl<E: core::fmt::Debug> From<E> for SensorError<E> {
    fn from(e: E) -> Self {
        SensorError::Io(e)
    }
}

impl<E: core::fmt::Debug> SensorError<E> {
    /// True for failures of the byte exchange itself, as opposed to the
    /// sensor reporting a state the caller did not want.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            SensorError::Io(_)
                | SensorError::Connection(_)
                | SensorError::NotOpen
                | SensorError::Timeout
                | SensorError::ShortResponse { .. }
                | SensorError::BufferOverflow { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct MockIoError;

    #[test]
    fn test_from_backend_error() {
        let err: SensorError<MockIoError> = MockIoError.into();
        assert!(matches!(err, SensorError::Io(MockIoError)));
        assert!(err.is_transport());
    }

    #[test]
    fn test_protocol_errors_are_not_transport() {
        assert!(!SensorError::<()>::FlashBackupError.is_transport());
        assert!(!SensorError::<()>::ModeNotConfirmed { mode_ctrl: 0 }.is_transport());
        assert!(SensorError::<()>::ShortResponse { expected: 4, got: 2 }.is_transport());
    }
}
