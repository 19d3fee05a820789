// src/common/command.rs

//! Register command framing.
//!
//! Every command is three bytes `[byte1, byte2, 0x0D]`. Writes get no
//! answer; reads are answered with `[address, MSB, LSB, 0x0D]`.

use core::fmt;

use super::registers::{DELIMITER, READ_RESPONSE_LEN, RESET_SPELL_BYTE, WIN_CTRL};
use super::window::Window;

/// One command frame and the number of response bytes it provokes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Command {
    /// 0 for writes, 4 for register reads.
    pub response_len: usize,
    /// Bytes written verbatim, delimiter included.
    pub payload: [u8; 3],
}

impl Command {
    /// Builds an arbitrary frame. Prefer the named constructors below.
    pub const fn new(response_len: usize, byte1: u8, byte2: u8) -> Self {
        Command {
            response_len,
            payload: [byte1, byte2, DELIMITER],
        }
    }

    /// Recovery frame `FF FF 0D`; sent three times to return the UART
    /// command parser to a known state.
    pub const fn reset_spell() -> Self {
        Self::new(0, RESET_SPELL_BYTE, RESET_SPELL_BYTE)
    }

    /// Selects the register window for the accesses that follow.
    pub const fn select_window(window: Window) -> Self {
        Self::new(0, WIN_CTRL, window.index())
    }

    /// Writes one byte of a register. `address` is the write address (bit 7 set).
    pub const fn write(address: u8, value: u8) -> Self {
        Self::new(0, address, value)
    }

    /// Reads the 16-bit register at `address` in the currently selected window.
    pub const fn read(address: u8) -> Self {
        Self::new(READ_RESPONSE_LEN, address, 0x00)
    }

    #[inline]
    pub const fn is_read(&self) -> bool {
        self.response_len > 0
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.payload
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {:02X} {:02X} {:02X}",
            self.response_len, self.payload[0], self.payload[1], self.payload[2]
        )
    }
}

/// Extracts the 16-bit value of the last register read in `response`.
///
/// The value is taken from fixed offsets relative to the end of the buffer,
/// so a concatenation of several responses yields the final register.
/// Returns `None` when fewer than four bytes are present.
pub fn decode_word(response: &[u8]) -> Option<u16> {
    if response.len() < READ_RESPONSE_LEN {
        return None;
    }
    let msb = response[response.len() - 3];
    let lsb = response[response.len() - 2];
    Some(u16::from_be_bytes([msb, lsb]))
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_frames() {
        assert_eq!(Command::select_window(Window::One).payload, [0xFE, 0x01, 0x0D]);
        assert_eq!(Command::write(0x88, 0x03).payload, [0x88, 0x03, 0x0D]);
        assert_eq!(Command::reset_spell().payload, [0xFF, 0xFF, 0x0D]);
        assert_eq!(Command::write(0x8A, 0x08).response_len, 0);
        assert!(!Command::reset_spell().is_read());
    }

    #[test]
    fn test_read_frame() {
        let cmd = Command::read(0x0A);
        assert_eq!(cmd.payload, [0x0A, 0x00, 0x0D]);
        assert_eq!(cmd.response_len, 4);
        assert!(cmd.is_read());
    }

    #[test]
    fn test_decode_word_big_endian() {
        assert_eq!(decode_word(&[0x0A, 0x12, 0x34, 0x0D]), Some(0x1234));
        assert_eq!(decode_word(&[0x04, 0x00, 0x01, 0x0D]), Some(0x0001));
    }

    #[test]
    fn test_decode_word_uses_last_response() {
        let concatenated = [0x6A, 0x11, 0x11, 0x0D, 0x6C, 0xAB, 0xCD, 0x0D];
        assert_eq!(decode_word(&concatenated), Some(0xABCD));
    }

    #[test]
    fn test_decode_word_short_response() {
        assert_eq!(decode_word(&[]), None);
        assert_eq!(decode_word(&[0x0A, 0x12, 0x34]), None);
    }

    #[test]
    fn test_display() {
        use std::string::ToString;
        assert_eq!(Command::read(0x04).to_string(), "[4] 04 00 0D");
    }
}
