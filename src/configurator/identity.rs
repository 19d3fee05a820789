// src/configurator/identity.rs

use super::SyncConfigurator;
use crate::common::{
    error::SensorError,
    hal_traits::{SensorSerial, SensorTimer},
    identity::IdentityRecord,
    registers::{PROD_ID_REGISTERS, SERIAL_NUM_REGISTERS},
    window::Window,
};
use core::fmt::Debug;
use log::{error, info, warn};

impl<IF> SyncConfigurator<IF>
where
    IF: SensorSerial + SensorTimer,
    IF::Error: Debug,
{
    /// Reads the product ID and serial number, or `None` if any register
    /// could not be read.
    pub fn detect_identity(&mut self) -> Option<IdentityRecord> {
        match self.try_detect_identity() {
            Ok(identity) => Some(identity),
            Err(e) => {
                error!("{}", e);
                None
            }
        }
    }

    /// Reads the four product ID and four serial number words from window 1.
    ///
    /// Window 0 is selected again afterwards, on success and on failure.
    pub fn try_detect_identity(&mut self) -> Result<IdentityRecord, SensorError<IF::Error>> {
        info!("Reading product and serial number registers");
        let result = self.read_identity_words();
        if let Err(e) = self.select_window(Window::Zero) {
            warn!("Could not restore register window 0: {}", e);
        }
        let (product_words, serial_words) = result?;

        info!(
            "Product ID registers: {}",
            WordList(&PROD_ID_REGISTERS, &product_words)
        );
        info!(
            "Serial number registers: {}",
            WordList(&SERIAL_NUM_REGISTERS, &serial_words)
        );

        let identity = IdentityRecord::from_words(product_words, serial_words);
        info!("Detected {}", identity);
        Ok(identity)
    }

    fn read_identity_words(&mut self) -> Result<([u16; 4], [u16; 4]), SensorError<IF::Error>> {
        let product_words = self.read_word_block(&PROD_ID_REGISTERS)?;
        let serial_words = self.read_word_block(&SERIAL_NUM_REGISTERS)?;
        Ok((product_words, serial_words))
    }

    fn read_word_block(&mut self, addresses: &[u8; 4]) -> Result<[u16; 4], SensorError<IF::Error>> {
        let mut words = [0u16; 4];
        for (word, &address) in words.iter_mut().zip(addresses) {
            *word = self
                .read_register_word(address, Window::One)
                .ok_or(SensorError::RegisterRead {
                    window: Window::One,
                    address,
                })?;
        }
        Ok(words)
    }
}

/// Formats `0x6A=0x3341, 0x6C=...` for the identity log lines.
struct WordList<'a>(&'a [u8; 4], &'a [u16; 4]);

impl core::fmt::Display for WordList<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for (i, (address, word)) in self.0.iter().zip(self.1).enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{:#04X}={:#06X}", address, word)?;
        }
        Ok(())
    }
}

// --- Unit Tests ---
#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;
    use crate::sensor::{HostRequest, SimulatedSensor};
    use crate::transport::Transport;
    use std::string::ToString;

    fn configurator(sensor: SimulatedSensor) -> SyncConfigurator<SimulatedSensor> {
        SyncConfigurator::new(Transport::new(sensor))
    }

    #[test]
    fn test_detect_identity_applies_alias() {
        let sensor = SimulatedSensor::new().with_identity("A342VD10", "12345678");
        let mut cfg = configurator(sensor);

        let identity = cfg.detect_identity().unwrap();
        assert_eq!(identity.product_id.as_str(), "M-A542VR1");
        assert_eq!(identity.product_id_raw.as_str(), "A342VD10");
        assert_eq!(identity.serial_number.as_str(), "12345678");
        assert_eq!(identity.product_words[0], 0x3341);
    }

    #[test]
    fn test_detect_identity_unknown_product_kept() {
        let sensor = SimulatedSensor::new().with_identity("G370PDF1", "0042");
        let mut cfg = configurator(sensor);

        let identity = cfg.detect_identity().unwrap();
        assert_eq!(identity.product_id, identity.product_id_raw);
        assert_eq!(identity.product_id.as_str(), "G370PDF1");
        assert_eq!(identity.serial_number.as_str(), "0042");
    }

    #[test]
    fn test_detect_identity_restores_window_zero() {
        let sensor = SimulatedSensor::new().with_identity("A342VD10", "12345678");
        let mut cfg = configurator(sensor);
        cfg.detect_identity().unwrap();

        let sim = cfg.transport().interface();
        assert_eq!(sim.current_window(), Window::Zero);
        assert_eq!(
            sim.requests().last(),
            Some(&(Window::Zero, HostRequest::SelectWindow(0)))
        );
    }

    #[test]
    fn test_detect_identity_fails_on_missing_register() {
        let mut sensor = SimulatedSensor::new().with_identity("A342VD10", "12345678");
        sensor.fail_reads_of(Window::One, 0x78);
        let mut cfg = configurator(sensor);

        let err = cfg.try_detect_identity().unwrap_err();
        assert!(matches!(
            err,
            SensorError::RegisterRead { window: Window::One, address: 0x78 }
        ));
        assert_eq!(cfg.transport().interface().current_window(), Window::Zero);
        assert_eq!(cfg.detect_identity(), None);
    }

    #[test]
    fn test_word_list_format() {
        let text = WordList(&[0x6A, 0x6C, 0x6E, 0x70], &[0x3341, 0x3234, 0x4456, 0x3031]).to_string();
        assert_eq!(text, "0x6A=0x3341, 0x6C=0x3234, 0x6E=0x4456, 0x70=0x3031");
    }
}
