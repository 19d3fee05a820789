// src/configurator/flash.rs

use super::{report, SyncConfigurator};
use crate::common::{
    error::SensorError,
    hal_traits::{SensorSerial, SensorTimer},
    registers::*,
    timing,
    window::Window,
};
use core::fmt::Debug;
use log::{debug, info};

impl<IF> SyncConfigurator<IF>
where
    IF: SensorSerial + SensorTimer,
    IF::Error: Debug,
{
    /// Copies the current register settings into non-volatile memory.
    ///
    /// Returns `true` only when the backup finished within the flash
    /// operation bound and DIAG_STAT1 reports no backup error.
    pub fn flash_backup(&mut self) -> bool {
        let result = self.try_flash_backup();
        report("Flash backup", result)
    }

    /// Starts a flash backup, waits for GLOB_CMD.FLASH_BACKUP to clear, then
    /// checks DIAG_STAT1.FLASH_BU_ERR.
    pub fn try_flash_backup(&mut self) -> Result<(), SensorError<IF::Error>> {
        self.write_register(Window::One, GLOB_CMD_WRITE_LO, GLOB_FLASH_BACKUP)?;
        info!("Flash backup command sent");

        let busy = u16::from(GLOB_FLASH_BACKUP);
        let completed = self.poll_register(
            GLOB_CMD,
            Window::One,
            timing::FLASH_POLL_INTERVAL,
            timing::FLASH_OPERATION_TIMEOUT,
            |glob_cmd| glob_cmd & busy == 0,
        )?;
        if completed.is_none() {
            return Err(SensorError::FlashBackupTimeout);
        }
        info!("Flash backup completed");

        let diag = self.try_read_word(DIAG_STAT1, Window::Zero)?;
        if diag & DIAG_FLASH_BU_ERR != 0 {
            return Err(SensorError::FlashBackupError);
        }
        info!("Flash backup verified successfully");
        Ok(())
    }

    /// Runs the sensor's flash self-test.
    pub fn flash_test(&mut self) -> bool {
        let result = self.try_flash_test();
        report("Flash test", result)
    }

    /// Starts a flash test, waits for MSC_CTRL.FLASH_TEST to clear, then
    /// checks DIAG_STAT1.FLASH_ERR.
    ///
    /// A passing test is followed by a short ready wait whose outcome is
    /// ignored.
    pub fn try_flash_test(&mut self) -> Result<(), SensorError<IF::Error>> {
        self.write_register(Window::One, MSC_CTRL_WRITE_HI, MSC_CMD_FLASH_TEST)?;
        info!("Flash test command issued");

        let completed = self.poll_register(
            MSC_CTRL,
            Window::One,
            timing::FLASH_POLL_INTERVAL,
            timing::FLASH_OPERATION_TIMEOUT,
            |msc_ctrl| msc_ctrl & MSC_FLASH_TEST_BUSY == 0,
        )?;
        match completed {
            Some(msc_ctrl) => debug!("FLASH_TEST complete (MSC_CTRL={:#06X})", msc_ctrl),
            None => return Err(SensorError::FlashTestTimeout),
        }

        let diag = self.try_read_word(DIAG_STAT1, Window::Zero)?;
        if diag & DIAG_FLASH_ERR != 0 {
            return Err(SensorError::FlashTestError);
        }

        if !self.wait_until_ready(timing::FLASH_TEST_READY_TIMEOUT) {
            debug!("Sensor still busy after flash test");
        }
        info!("Flash test completed successfully");
        Ok(())
    }
}

// --- Unit Tests ---
#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;
    use crate::sensor::{HostRequest, SimulatedSensor};
    use crate::transport::Transport;
    use core::time::Duration;

    fn configurator(sensor: SimulatedSensor) -> SyncConfigurator<SimulatedSensor> {
        SyncConfigurator::new(Transport::new(sensor))
    }

    /// GLOB_CMD reads issued after the last DIAG_STAT1 read.
    fn ready_polls_after_diag(sim: &SimulatedSensor) -> usize {
        let requests = sim.requests();
        let diag = requests
            .iter()
            .rposition(|r| *r == (Window::Zero, HostRequest::Read { address: DIAG_STAT1 }))
            .expect("DIAG_STAT1 was read");
        requests[diag + 1..]
            .iter()
            .filter(|r| **r == (Window::One, HostRequest::Read { address: GLOB_CMD }))
            .count()
    }

    #[test]
    fn test_flash_backup_success() {
        let mut sensor = SimulatedSensor::new();
        sensor.set_register(Window::One, 0x08, 0x0003);
        let mut cfg = configurator(sensor);

        assert!(cfg.flash_backup());
        let sim = cfg.transport().interface();
        assert_eq!(sim.persisted_uart_ctrl(), 0x03);
        assert_eq!(sim.writes_to(Window::One, GLOB_CMD_WRITE_LO), 1);
        assert_eq!(
            &sim.written_frames()[..2],
            [[0xFE, 0x01, 0x0D], [0x8A, 0x08, 0x0D]]
        );
    }

    #[test]
    fn test_flash_backup_never_clears() {
        let mut sensor = SimulatedSensor::new();
        sensor.set_flash_backup_busy_polls(None);
        let mut cfg = configurator(sensor);

        let start = cfg.transport().now();
        assert!(matches!(
            cfg.try_flash_backup(),
            Err(SensorError::FlashBackupTimeout)
        ));
        let waited = cfg.transport().now() - start;
        assert!(waited >= timing::FLASH_OPERATION_TIMEOUT);
        assert!(waited < timing::FLASH_OPERATION_TIMEOUT + Duration::from_millis(200));
    }

    #[test]
    fn test_flash_backup_error_flag() {
        let mut sensor = SimulatedSensor::new();
        sensor.set_flash_backup_error(true);
        let mut cfg = configurator(sensor);

        assert!(!cfg.flash_backup());
        assert!(matches!(
            cfg.try_flash_backup(),
            Err(SensorError::FlashBackupError)
        ));
    }

    #[test]
    fn test_flash_backup_diag_read_failure() {
        let mut sensor = SimulatedSensor::new();
        sensor.fail_reads_of(Window::Zero, DIAG_STAT1);
        let mut cfg = configurator(sensor);

        assert!(matches!(cfg.try_flash_backup(), Err(SensorError::Timeout)));
    }

    #[test]
    fn test_flash_test_success() {
        let mut cfg = configurator(SimulatedSensor::new());
        assert!(cfg.flash_test());
        let sim = cfg.transport().interface();
        assert_eq!(sim.register(Window::One, MSC_CTRL) & MSC_FLASH_TEST_BUSY, 0);
        assert_eq!(sim.writes_to(Window::One, MSC_CTRL_WRITE_HI), 1);
        assert!(!sim.is_busy());
        // A passing test is followed by the ready wait.
        assert!(ready_polls_after_diag(sim) >= 1);
    }

    #[test]
    fn test_flash_test_error_flag() {
        let mut sensor = SimulatedSensor::new();
        sensor.set_flash_test_error(true);
        let mut cfg = configurator(sensor);

        assert!(matches!(cfg.try_flash_test(), Err(SensorError::FlashTestError)));
        assert_eq!(ready_polls_after_diag(cfg.transport().interface()), 0);
    }

    #[test]
    fn test_flash_test_timeout() {
        let mut sensor = SimulatedSensor::new();
        sensor.set_flash_test_busy_polls(None);
        let mut cfg = configurator(sensor);

        assert!(!cfg.flash_test());
        assert!(cfg.transport().interface().is_busy());
    }

    #[test]
    fn test_flash_test_short_verify_read_fails() {
        let mut sensor = SimulatedSensor::new();
        sensor.truncate_reads_of(Window::Zero, DIAG_STAT1, 3);
        let mut cfg = configurator(sensor);

        assert!(matches!(
            cfg.try_flash_test(),
            Err(SensorError::ShortResponse { expected: 4, got: 3 })
        ));
    }
}
