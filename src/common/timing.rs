// src/common/timing.rs

use core::time::Duration;

// === Transport ===

/// Per-chunk read timeout. Longer waits are built from polling loops.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(3);
/// Pause between `WouldBlock` results while spinning on the serial seam.
pub const IO_SPIN_DELAY_US: u32 = 100;

// === Settling delays ===

/// After the reset spell, before addressed accesses.
pub const RESET_SETTLE: Duration = Duration::from_millis(100);
/// After requesting Configuration Mode, before reading MODE_CTRL.
pub const MODE_EXIT_SETTLE: Duration = Duration::from_millis(50);
/// After a completed full reset, for hardware stabilization.
pub const POST_RESET_STABILIZATION: Duration = Duration::from_millis(800);

// === Polling ===

/// Interval between FLASH_BACKUP / FLASH_TEST status polls.
pub const FLASH_POLL_INTERVAL: Duration = Duration::from_millis(100);
/// Bound on a flash backup or flash test.
pub const FLASH_OPERATION_TIMEOUT: Duration = Duration::from_secs(5);
/// Interval between GLOB_CMD readiness polls.
pub const READY_POLL_INTERVAL: Duration = Duration::from_millis(50);
/// Readiness bound after a successful flash test.
pub const FLASH_TEST_READY_TIMEOUT: Duration = Duration::from_secs(2);
/// Readiness bound after a software reset; covers the reboot.
pub const SOFTWARE_RESET_READY_TIMEOUT: Duration = Duration::from_secs(7);
