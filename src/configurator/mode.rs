// src/configurator/mode.rs

use super::{report, SyncConfigurator};
use crate::common::{
    error::SensorError,
    hal_traits::{SensorSerial, SensorTimer},
    registers::*,
    timing,
    window::Window,
};
use core::fmt::Debug;
use log::{info, warn};

impl<IF> SyncConfigurator<IF>
where
    IF: SensorSerial + SensorTimer,
    IF::Error: Debug,
{
    /// Enables UART Auto Start in volatile registers.
    pub fn set_uart_auto_start(&mut self) -> bool {
        let result = self.try_set_uart_auto_start();
        report("Setting UART_CTRL", result)
    }

    /// Resets the command parser, then writes `UART_AUTO | AUTO_START` to
    /// UART_CTRL. Nothing is persisted until a flash backup.
    pub fn try_set_uart_auto_start(&mut self) -> Result<(), SensorError<IF::Error>> {
        self.reset_sensor()?;
        self.transport.delay(timing::RESET_SETTLE);
        self.write_register(Window::One, UART_CTRL_WRITE_LO, UART_AUTO | AUTO_START)?;
        info!("UART_CTRL register set to 0x03 (AUTO_START=1, UART_AUTO=1)");
        Ok(())
    }

    /// Enables Auto Start and persists it to flash.
    pub fn configure(&mut self) -> bool {
        let result = self.try_configure();
        report("Configuration", result)
    }

    pub fn try_configure(&mut self) -> Result<(), SensorError<IF::Error>> {
        self.try_set_uart_auto_start()?;
        self.try_flash_backup()?;
        info!("Sensor configured in UART Auto Start mode");
        info!("After power cycle or reset, the sensor starts transmitting data on its own");
        Ok(())
    }

    /// Requests a software reset and waits for the sensor to come back.
    pub fn software_reset(&mut self) -> bool {
        let result = self.try_software_reset();
        report("Software reset", result)
    }

    pub fn try_software_reset(&mut self) -> Result<(), SensorError<IF::Error>> {
        self.write_register(Window::One, GLOB_CMD_WRITE_LO, GLOB_SW_RESET)?;
        info!("Software reset command issued; waiting for reboot");
        self.try_wait_until_ready(timing::SOFTWARE_RESET_READY_TIMEOUT)
    }

    /// Leaves UART Auto Mode and disables Auto Start.
    pub fn exit_auto_mode(&mut self, persist: bool) -> bool {
        let result = self.try_exit_auto_mode(persist);
        report("Exiting auto mode", result)
    }

    /// Requests Configuration Mode, confirms it through MODE_CTRL, then
    /// clears UART_CTRL. With `persist`, the cleared state is backed up to
    /// flash. Window 0 is selected on success.
    ///
    /// UART_CTRL is left untouched if the mode change is not confirmed.
    pub fn try_exit_auto_mode(&mut self, persist: bool) -> Result<(), SensorError<IF::Error>> {
        info!("Requesting sensor to exit UART Auto Mode");
        self.write_register(Window::Zero, MODE_CTRL_WRITE_HI, MODE_CMD_GOTO_CONFIG)?;
        self.transport.delay(timing::MODE_EXIT_SETTLE);

        let mode_ctrl = self.try_read_word(MODE_CTRL, Window::Zero)?;
        if mode_ctrl & MODE_STAT_CONFIG == 0 {
            return Err(SensorError::ModeNotConfirmed { mode_ctrl });
        }
        info!("Sensor reports configuration mode (MODE_CTRL={:#06X})", mode_ctrl);

        self.write_register(Window::One, UART_CTRL_WRITE_LO, 0x00)?;
        info!("UART_CTRL cleared (0x88 -> 0x00)");

        if persist {
            info!("Persisting UART auto disable state via flash backup");
            self.try_flash_backup()?;
        }

        self.select_window(Window::Zero)
    }

    /// Exits Auto Mode, resets the parser, runs a flash test, then performs a
    /// software reset.
    pub fn full_reset(&mut self, persist: bool) -> bool {
        let result = self.try_full_reset(persist);
        report("Full reset sequence", result)
    }

    /// With `persist`, a failed [`try_exit_auto_mode`](Self::try_exit_auto_mode)
    /// aborts the sequence. Without it, the sensor is only switched to window 0.
    ///
    /// A failed flash test is logged and the sequence continues; a failed
    /// software reset aborts.
    pub fn try_full_reset(&mut self, persist: bool) -> Result<(), SensorError<IF::Error>> {
        info!(
            "Starting sensor reset sequence (persist_disable_auto={})",
            persist
        );

        if persist {
            self.try_exit_auto_mode(true)?;
        } else {
            self.select_window(Window::Zero)?;
        }

        self.reset_sensor()?;
        self.transport.delay(timing::RESET_SETTLE);

        if let Err(e) = self.try_flash_test() {
            warn!("Flash test reported an error; continuing with reset ({})", e);
        }

        self.try_software_reset()?;

        info!("Sensor reset sequence completed; allowing stabilization");
        self.transport.delay(timing::POST_RESET_STABILIZATION);
        Ok(())
    }
}
