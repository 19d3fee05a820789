// src/transport/io_helpers.rs

use super::Transport;
use crate::common::{
    error::SensorError,
    hal_traits::{SensorSerial, SensorTimer},
    timing,
};
use core::fmt::Debug;
use core::time::Duration;
use nb::Result as NbResult;

// Implementation block for I/O related helpers
impl<IF> Transport<IF>
where
    IF: SensorSerial + SensorTimer,
    IF::Error: Debug,
{
    /// Executes a non-blocking I/O operation (`f`) repeatedly until it
    /// stops returning `WouldBlock`, returning the final result or a timeout error.
    pub(super) fn execute_blocking_io_with_timeout<FN, T>(
        &mut self,
        timeout: Duration,
        mut f: FN,
    ) -> Result<T, SensorError<IF::Error>>
    where
        FN: FnMut(&mut IF) -> NbResult<T, IF::Error>,
    {
        let deadline = self.interface.now() + timeout;

        loop {
            match f(&mut self.interface) {
                Ok(result) => return Ok(result),
                Err(nb::Error::WouldBlock) => {
                    if self.interface.now() >= deadline {
                        return Err(SensorError::Timeout);
                    }
                    self.interface.delay_us(timing::IO_SPIN_DELAY_US);
                }
                Err(nb::Error::Other(e)) => return Err(SensorError::Io(e)),
            }
        }
    }

    /// Writes one command frame verbatim and waits for it to leave the port.
    pub(super) fn write_command_bytes(&mut self, bytes: &[u8]) -> Result<(), SensorError<IF::Error>> {
        self.interface.write(bytes).map_err(SensorError::Io)?;
        let flush_timeout = self.read_timeout;
        self.execute_blocking_io_with_timeout(flush_timeout, |iface| iface.flush())
    }

    /// Fills `buf` completely, one chunk at a time.
    ///
    /// Each chunk gets the full read timeout. A chunk that yields nothing is a
    /// `Timeout` when nothing has arrived yet, and a `ShortResponse` once
    /// part of the response is in.
    pub(super) fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), SensorError<IF::Error>> {
        let expected = buf.len();
        let read_timeout = self.read_timeout;
        let mut filled = 0;

        while filled < expected {
            let received = match self
                .execute_blocking_io_with_timeout(read_timeout, |iface| iface.read(&mut buf[filled..]))
            {
                Ok(n) => n,
                Err(SensorError::Timeout) if filled > 0 => {
                    return Err(SensorError::ShortResponse { expected, got: filled });
                }
                Err(e) => return Err(e),
            };

            if received == 0 {
                return Err(SensorError::Timeout);
            }
            filled += received.min(expected - filled);
        }

        Ok(())
    }
}
