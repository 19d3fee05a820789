// src/sensor/mod.rs

// Device side of the link: a register model that answers host commands.
// Used to exercise the configurator without hardware attached.

pub mod parser; // Raw frame -> HostRequest
mod sim; // Register banks, status bits and the virtual clock

// --- Public Re-exports ---
pub use parser::{parse_frame, FrameError, HostRequest};
pub use sim::{SimError, SimInstant, SimulatedSensor};
