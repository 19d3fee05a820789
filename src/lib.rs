// src/lib.rs

#![cfg_attr(not(any(test, feature = "std")), no_std)]

pub mod common;
pub mod configurator;
pub mod transport;

// Host-only pieces
#[cfg(feature = "std")]
pub mod platform;
#[cfg(feature = "std")]
pub mod sensor;
#[cfg(feature = "std")]
pub mod serial;

// Re-export key types for convenience
pub use common::{IdentityRecord, LinkConfig, SensorError, Window};
pub use configurator::SyncConfigurator;
pub use transport::Transport;

#[cfg(feature = "std")]
pub use serial::SerialPortInterface;
