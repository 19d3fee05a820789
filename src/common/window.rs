// src/common/window.rs

use super::error::SensorError;
use core::convert::TryFrom;
use core::fmt;

/// Register bank selector written to WIN_CTRL before every window-relative access.
///
/// The selected window lives on the sensor, not here. Every read or write
/// sequence names its window explicitly and re-selects it.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum Window {
    /// Window 0: MODE_CTRL, DIAG_STAT1 and the sampled-data registers.
    Zero = 0,
    /// Window 1: UART_CTRL, GLOB_CMD, MSC_CTRL and the identity registers.
    One = 1,
}

impl Window {
    pub fn new(index: u8) -> Result<Self, SensorError<()>> {
        match index {
            0 => Ok(Window::Zero),
            1 => Ok(Window::One),
            other => Err(SensorError::InvalidWindow(other)),
        }
    }

    #[inline]
    pub const fn index(self) -> u8 {
        self as u8
    }
}

impl Default for Window {
    fn default() -> Self {
        Window::Zero
    }
}

impl TryFrom<u8> for Window {
    type Error = SensorError<()>;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Window> for u8 {
    fn from(value: Window) -> Self {
        value.index()
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_windows() {
        assert_eq!(Window::new(0).unwrap(), Window::Zero);
        assert_eq!(Window::new(1).unwrap(), Window::One);
        assert_eq!(Window::try_from(1).unwrap().index(), 1);
    }

    #[test]
    fn test_invalid_windows() {
        assert!(matches!(Window::new(2), Err(SensorError::InvalidWindow(2))));
        assert!(matches!(Window::try_from(0xFF), Err(SensorError::InvalidWindow(0xFF))));
    }

    #[test]
    fn test_default_is_window_zero() {
        assert_eq!(Window::default(), Window::Zero);
        assert_eq!(u8::from(Window::default()), 0);
    }
}
