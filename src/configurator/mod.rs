// src/configurator/mod.rs

// Operation groups, each adding methods to SyncConfigurator
mod flash;
mod identity;
mod mode;

use crate::common::{
    command::{decode_word, Command},
    error::SensorError,
    hal_traits::{SensorSerial, SensorTimer},
    registers::{GLOB_CMD, GLOB_NOT_READY, READ_RESPONSE_LEN},
    timing,
    window::Window,
};
use crate::transport::Transport;
use core::fmt::Debug;
use core::time::Duration;
use log::{debug, error, warn};

/// Drives the sensor's register protocol over an open [`Transport`].
///
/// Every operation re-selects the register window it needs; nothing about
/// the sensor's current window is remembered between calls.
#[derive(Debug)]
pub struct SyncConfigurator<IF>
where
    IF: SensorSerial + SensorTimer,
{
    transport: Transport<IF>,
}

impl<IF> SyncConfigurator<IF>
where
    IF: SensorSerial + SensorTimer,
    IF::Error: Debug,
{
    pub fn new(transport: Transport<IF>) -> Self {
        SyncConfigurator { transport }
    }

    pub fn transport(&self) -> &Transport<IF> {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut Transport<IF> {
        &mut self.transport
    }

    pub fn into_transport(self) -> Transport<IF> {
        self.transport
    }

    /// Sends the recovery spell `FF FF 0D` three times.
    ///
    /// Brings the sensor's command parser back to a known state. Nothing is
    /// read back.
    pub fn reset_sensor(&mut self) -> Result<(), SensorError<IF::Error>> {
        self.transport.send_commands(&[
            Command::reset_spell(),
            Command::reset_spell(),
            Command::reset_spell(),
        ])?;
        debug!("Sensor reset commands sent");
        Ok(())
    }

    /// Reads one register, returning `None` on any failure.
    ///
    /// The failure is logged at debug level; the caller decides whether it
    /// is fatal.
    pub fn read_register_word(&mut self, address: u8, window: Window) -> Option<u16> {
        match self.try_read_word(address, window) {
            Ok(word) => Some(word),
            Err(e) => {
                debug!("Failed to read register {:#04X}: {}", address, e);
                None
            }
        }
    }

    /// Selects `window`, then reads the 16-bit register at `address`.
    pub fn try_read_word(&mut self, address: u8, window: Window) -> Result<u16, SensorError<IF::Error>> {
        let response = self
            .transport
            .send_commands(&[Command::select_window(window), Command::read(address)])?;
        decode_word(&response).ok_or(SensorError::ShortResponse {
            expected: READ_RESPONSE_LEN,
            got: response.len(),
        })
    }

    /// Polls GLOB_CMD until NOT_READY clears, for at most `timeout`.
    ///
    /// Returns `false` only when the bound expires.
    pub fn wait_until_ready(&mut self, timeout: Duration) -> bool {
        self.try_wait_until_ready(timeout).is_ok()
    }

    /// Like [`wait_until_ready`](Self::wait_until_ready), failing with `NotReady`.
    ///
    /// Transport errors while polling mean "not ready yet": the sensor stops
    /// answering while it reboots.
    pub fn try_wait_until_ready(&mut self, timeout: Duration) -> Result<(), SensorError<IF::Error>> {
        let start = self.transport.now();
        while self.transport.now() - start < timeout {
            match self.try_read_word(GLOB_CMD, Window::One) {
                Ok(glob_cmd) if glob_cmd & GLOB_NOT_READY == 0 => return Ok(()),
                Ok(glob_cmd) => debug!("Sensor not ready (GLOB_CMD={:#06X})", glob_cmd),
                Err(SensorError::Timeout) => debug!("Waiting for sensor ready... (timeout)"),
                Err(e) => debug!("Transient error while waiting for ready: {}", e),
            }
            self.transport.delay(timing::READY_POLL_INTERVAL);
        }
        warn!("Timed out waiting for sensor ready state");
        Err(SensorError::NotReady)
    }

    // --- Register access helpers ---

    fn select_window(&mut self, window: Window) -> Result<(), SensorError<IF::Error>> {
        self.transport.send_command(&Command::select_window(window))?;
        Ok(())
    }

    fn write_register(&mut self, window: Window, address: u8, value: u8) -> Result<(), SensorError<IF::Error>> {
        self.transport.send_commands(&[
            Command::select_window(window),
            Command::write(address, value),
        ])?;
        Ok(())
    }

    /// Reads `address` every `interval` until `done` accepts the value.
    ///
    /// Returns the accepted value, or `None` when `timeout` expires first.
    /// Transport errors abort the poll.
    fn poll_register<F>(
        &mut self,
        address: u8,
        window: Window,
        interval: Duration,
        timeout: Duration,
        done: F,
    ) -> Result<Option<u16>, SensorError<IF::Error>>
    where
        F: Fn(u16) -> bool,
    {
        let start = self.transport.now();
        while self.transport.now() - start < timeout {
            let value = self.try_read_word(address, window)?;
            if done(value) {
                return Ok(Some(value));
            }
            self.transport.delay(interval);
        }
        Ok(None)
    }
}

/// Logs a failed operation and flattens its result to a flag.
fn report<E: Debug>(operation: &str, result: Result<(), SensorError<E>>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            error!("{} failed: {}", operation, e);
            false
        }
    }
}

// --- Unit Tests ---
#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;
    use crate::sensor::{HostRequest, SimulatedSensor};

    fn configurator(sensor: SimulatedSensor) -> SyncConfigurator<SimulatedSensor> {
        SyncConfigurator::new(Transport::new(sensor))
    }

    #[test]
    fn test_reset_sensor_sends_three_spells() {
        let mut cfg = configurator(SimulatedSensor::new());
        cfg.reset_sensor().unwrap();
        let log = cfg.transport().interface().requests();
        assert_eq!(log.len(), 3);
        assert!(log.iter().all(|(_, req)| *req == HostRequest::ResetSpell));
    }

    #[test]
    fn test_read_register_word_decodes_big_endian() {
        let mut sensor = SimulatedSensor::new();
        sensor.set_register(Window::One, 0x6A, 0xA1B2);
        let mut cfg = configurator(sensor);

        assert_eq!(cfg.read_register_word(0x6A, Window::One), Some(0xA1B2));
        assert_eq!(
            cfg.transport().interface().written_frames(),
            [[0xFE, 0x01, 0x0D], [0x6A, 0x00, 0x0D]]
        );
    }

    #[test]
    fn test_read_register_word_respects_window() {
        let mut sensor = SimulatedSensor::new();
        sensor.set_register(Window::Zero, 0x02, 0x0400);
        sensor.set_register(Window::One, 0x02, 0x0000);
        let mut cfg = configurator(sensor);

        assert_eq!(cfg.read_register_word(0x02, Window::Zero), Some(0x0400));
        assert_eq!(cfg.read_register_word(0x02, Window::One), Some(0x0000));
    }

    #[test]
    fn test_read_register_word_none_on_failure() {
        let mut sensor = SimulatedSensor::new();
        sensor.fail_reads_of(Window::One, 0x6C);
        let mut cfg = configurator(sensor);

        assert_eq!(cfg.read_register_word(0x6C, Window::One), None);
        assert!(matches!(
            cfg.try_read_word(0x6C, Window::One),
            Err(SensorError::Timeout)
        ));
    }

    #[test]
    fn test_read_register_word_none_on_short_response() {
        let mut sensor = SimulatedSensor::new();
        sensor.truncate_reads_of(Window::One, 0x0A, 2);
        let mut cfg = configurator(sensor);

        assert_eq!(cfg.read_register_word(0x0A, Window::One), None);
        assert!(matches!(
            cfg.try_read_word(0x0A, Window::One),
            Err(SensorError::ShortResponse { expected: 4, got: 2 })
        ));
    }

    #[test]
    fn test_wait_until_ready_immediate() {
        let mut cfg = configurator(SimulatedSensor::new());
        assert!(cfg.wait_until_ready(Duration::from_secs(2)));
    }

    #[test]
    fn test_wait_until_ready_times_out_when_never_ready() {
        let mut sensor = SimulatedSensor::new();
        sensor.set_register(Window::One, GLOB_CMD, GLOB_NOT_READY);
        let mut cfg = configurator(sensor);

        let start = cfg.transport().now();
        assert!(!cfg.wait_until_ready(Duration::from_secs(2)));
        assert!(cfg.transport().now() - start >= Duration::from_secs(2));
    }

    #[test]
    fn test_wait_until_ready_tolerates_silence() {
        let mut sensor = SimulatedSensor::new();
        sensor.go_silent_for(1);
        let mut cfg = configurator(sensor);

        // One 3 s read timeout, then the sensor answers ready.
        assert!(cfg.wait_until_ready(Duration::from_secs(7)));
        assert!(matches!(
            cfg.try_wait_until_ready(Duration::from_millis(10)),
            Ok(())
        ));
    }
}
