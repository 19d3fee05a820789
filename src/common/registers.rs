// src/common/registers.rs

//! Register map of the M-A542VR1 family.
//!
//! Read addresses are the even word address. Write addresses set bit 7 and
//! address one byte of the word: even for the low byte, odd for the high byte.

// === Window selection (both windows) ===

/// WIN_CTRL low-byte write address.
pub const WIN_CTRL: u8 = 0xFE;

// === Window 0 ===

/// MODE_CTRL read address.
pub const MODE_CTRL: u8 = 0x02;
/// MODE_CTRL high-byte write address.
pub const MODE_CTRL_WRITE_HI: u8 = 0x83;
/// MODE_CMD value requesting the move from Auto Mode to Configuration Mode.
pub const MODE_CMD_GOTO_CONFIG: u8 = 0x02;
/// MODE_STAT bit: set while the sensor is in Configuration Mode.
pub const MODE_STAT_CONFIG: u16 = 0x0400;

/// DIAG_STAT1 read address.
pub const DIAG_STAT1: u8 = 0x04;
/// FLASH_BU_ERR: last flash backup failed.
pub const DIAG_FLASH_BU_ERR: u16 = 0x0001;
/// FLASH_ERR: last flash test failed.
pub const DIAG_FLASH_ERR: u16 = 0x0004;

// === Window 1 ===

/// MSC_CTRL read address.
pub const MSC_CTRL: u8 = 0x02;
/// MSC_CTRL high-byte write address.
pub const MSC_CTRL_WRITE_HI: u8 = 0x83;
/// Value written to the MSC_CTRL high byte to start a flash test.
pub const MSC_CMD_FLASH_TEST: u8 = 0x08;
/// Set while a flash test is running.
pub const MSC_FLASH_TEST_BUSY: u16 = 0x0400;

/// UART_CTRL low-byte write address.
pub const UART_CTRL_WRITE_LO: u8 = 0x88;
/// UART_AUTO (bit 0): sampled data is sent without a host request.
pub const UART_AUTO: u8 = 0x01;
/// AUTO_START (bit 1): sampling starts automatically after boot.
pub const AUTO_START: u8 = 0x02;

/// GLOB_CMD read address.
pub const GLOB_CMD: u8 = 0x0A;
/// GLOB_CMD low-byte write address.
pub const GLOB_CMD_WRITE_LO: u8 = 0x8A;
/// FLASH_BACKUP (bit 3): write to start, reads 1 until the backup finishes.
pub const GLOB_FLASH_BACKUP: u8 = 0x08;
/// SW_RESET (bit 7).
pub const GLOB_SW_RESET: u8 = 0x80;
/// NOT_READY: set while the sensor is still initializing.
pub const GLOB_NOT_READY: u16 = 0x0400;

/// Product ID words, window 1.
pub const PROD_ID_REGISTERS: [u8; 4] = [0x6A, 0x6C, 0x6E, 0x70];
/// Serial number words, window 1.
pub const SERIAL_NUM_REGISTERS: [u8; 4] = [0x74, 0x76, 0x78, 0x7A];

// === Framing ===

/// Terminator closing every command and every read response.
pub const DELIMITER: u8 = 0x0D;
/// Byte sent twice per frame by the recovery spell.
pub const RESET_SPELL_BYTE: u8 = 0xFF;
/// Length of a register read response: echoed address, MSB, LSB, delimiter.
pub const READ_RESPONSE_LEN: usize = 4;
