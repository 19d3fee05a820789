// src/common/mod.rs

// --- Declare all public modules within common ---
pub mod command;
pub mod config;
pub mod error;
pub mod hal_traits;
pub mod identity;
pub mod registers;
pub mod timing;
pub mod window;

// --- Re-export key types/traits/functions for easier access ---

// From command.rs
pub use command::{decode_word, Command};

// From config.rs
pub use config::{is_supported_baud, LinkConfig, DEFAULT_BAUD_RATE, SUPPORTED_BAUD_RATES};

// From error.rs
pub use error::{ConnectionErrorKind, SensorError};

// From hal_traits.rs
pub use hal_traits::{SensorInstant, SensorSerial, SensorTimer};

// From identity.rs
pub use identity::{decode_ascii_words, encode_ascii_words, IdString, IdentityRecord};

// From window.rs
pub use window::Window;

// Register addresses and timing constants stay namespaced:
// common::registers::GLOB_CMD, common::timing::FLASH_OPERATION_TIMEOUT, ...
