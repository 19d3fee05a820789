// src/common/hal_traits.rs

use core::fmt::Debug;
use core::ops::{Add, Sub};
use core::time::Duration;

/// A point in time as reported by a [`SensorTimer`].
///
/// Implemented for every type with the required arithmetic, which includes
/// `std::time::Instant`.
pub trait SensorInstant:
    Copy + PartialOrd + Add<Duration, Output = Self> + Sub<Self, Output = Duration>
{
}

impl<T> SensorInstant for T where
    T: Copy + PartialOrd + Add<Duration, Output = T> + Sub<T, Output = Duration>
{
}

/// Abstraction for the delays and clock the protocol needs.
pub trait SensorTimer {
    type Instant: SensorInstant;

    /// Delay for at least the specified number of microseconds.
    fn delay_us(&mut self, us: u32);

    /// Delay for at least the specified number of milliseconds.
    fn delay_ms(&mut self, ms: u32);

    /// Current time.
    fn now(&self) -> Self::Instant;
}

/// Abstraction for the byte stream connected to the sensor's UART.
pub trait SensorSerial {
    /// Associated error type for communication errors.
    type Error: Debug;

    /// Attempts to read available bytes into `buf`.
    ///
    /// Returns `Ok(n)` with `n > 0` when bytes were read, or
    /// `Err(nb::Error::WouldBlock)` if nothing is available yet.
    fn read(&mut self, buf: &mut [u8]) -> nb::Result<usize, Self::Error>;

    /// Writes the whole slice.
    fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;

    /// Attempts to flush the transmit buffer.
    ///
    /// Returns `Err(nb::Error::WouldBlock)` while transmission is still in progress.
    fn flush(&mut self) -> nb::Result<(), Self::Error>;

    /// Whether the underlying device is still held.
    fn is_open(&self) -> bool;

    /// Releases the underlying device. Calling it again has no effect.
    fn close(&mut self);
}
