// src/common/config.rs

use super::timing::DEFAULT_READ_TIMEOUT;
use core::time::Duration;

/// Baud rates the sensor can be configured for.
pub const SUPPORTED_BAUD_RATES: [u32; 3] = [230_400, 460_800, 921_600];

/// Factory default baud rate.
pub const DEFAULT_BAUD_RATE: u32 = 460_800;

/// Returns `true` when `baud` is one of the sensor's baud rates.
///
/// Advisory only: the engine runs at whatever rate the stream supports, a
/// mismatch just garbles responses.
pub fn is_supported_baud(baud: u32) -> bool {
    SUPPORTED_BAUD_RATES.contains(&baud)
}

/// Serial link settings.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LinkConfig {
    /// Line rate in bits per second.
    pub baud_rate: u32,
    /// Bound on each chunk of a response read.
    pub read_timeout: Duration,
}

impl LinkConfig {
    /// Creates a new `LinkConfig`.
    ///
    /// # Arguments
    ///
    /// * `baud_rate` - Line rate in bits per second.
    /// * `read_timeout` - Bound on each chunk of a response read.
    pub fn new(baud_rate: u32, read_timeout: Duration) -> LinkConfig {
        LinkConfig {
            baud_rate,
            read_timeout,
        }
    }

    /// Sets the baud rate.
    pub fn baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Sets the per-chunk read timeout.
    pub fn read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }
}

impl Default for LinkConfig {
    /// 460800 baud, 3 second read timeout.
    fn default() -> LinkConfig {
        LinkConfig {
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }
}
