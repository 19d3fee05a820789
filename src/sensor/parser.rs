// src/sensor/parser.rs

use crate::common::registers::{DELIMITER, RESET_SPELL_BYTE, WIN_CTRL};

/// A host command as seen from the sensor's side of the wire.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HostRequest {
    /// `FF FF 0D` recovery frame.
    ResetSpell,
    /// WIN_CTRL write; the index is unvalidated.
    SelectWindow(u8),
    /// Register read at an even word address.
    Read { address: u8 },
    /// One-byte register write; `address` has bit 7 set.
    Write { address: u8, value: u8 },
}

/// Why a frame was rejected.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// Not exactly three bytes.
    InvalidLength(usize),
    /// The third byte was not `0x0D`.
    MissingDelimiter(u8),
}

/// Parses one raw command frame `[byte1, byte2, 0x0D]`.
///
/// # Arguments
///
/// * `bytes`: the frame exactly as written by the host, delimiter included.
///
/// # Returns
///
/// * `Ok(HostRequest)` for a well-formed frame.
/// * `Err(FrameError)` on a wrong length or a missing delimiter.
pub fn parse_frame(bytes: &[u8]) -> Result<HostRequest, FrameError> {
    let [byte1, byte2, delimiter] = match bytes {
        [a, b, c] => [*a, *b, *c],
        _ => return Err(FrameError::InvalidLength(bytes.len())),
    };
    if delimiter != DELIMITER {
        return Err(FrameError::MissingDelimiter(delimiter));
    }

    let request = match (byte1, byte2) {
        (RESET_SPELL_BYTE, RESET_SPELL_BYTE) => HostRequest::ResetSpell,
        (WIN_CTRL, index) => HostRequest::SelectWindow(index),
        (address, value) if address & 0x80 != 0 => HostRequest::Write { address, value },
        (address, _) => HostRequest::Read { address },
    };
    Ok(request)
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reset_spell() {
        assert_eq!(parse_frame(&[0xFF, 0xFF, 0x0D]), Ok(HostRequest::ResetSpell));
    }

    #[test]
    fn test_parse_window_select() {
        assert_eq!(parse_frame(&[0xFE, 0x01, 0x0D]), Ok(HostRequest::SelectWindow(1)));
        assert_eq!(parse_frame(&[0xFE, 0x07, 0x0D]), Ok(HostRequest::SelectWindow(7)));
    }

    #[test]
    fn test_parse_write_and_read() {
        assert_eq!(
            parse_frame(&[0x8A, 0x08, 0x0D]),
            Ok(HostRequest::Write { address: 0x8A, value: 0x08 })
        );
        assert_eq!(parse_frame(&[0x04, 0x00, 0x0D]), Ok(HostRequest::Read { address: 0x04 }));
    }

    #[test]
    fn test_parse_rejects_malformed_frames() {
        assert_eq!(parse_frame(&[0x04, 0x00]), Err(FrameError::InvalidLength(2)));
        assert_eq!(parse_frame(&[0x04, 0x00, 0x0A]), Err(FrameError::MissingDelimiter(0x0A)));
        assert_eq!(parse_frame(&[]), Err(FrameError::InvalidLength(0)));
    }
}
