// src/platform.rs

//! Host OS detection and serial port naming rules.

use core::fmt;
use std::string::String;
use std::vec::Vec;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HostOs {
    Linux,
    Windows,
    MacOs,
    Other,
}

impl HostOs {
    /// The OS this binary was built for.
    pub fn current() -> Self {
        if cfg!(target_os = "linux") {
            HostOs::Linux
        } else if cfg!(target_os = "windows") {
            HostOs::Windows
        } else if cfg!(target_os = "macos") {
            HostOs::MacOs
        } else {
            HostOs::Other
        }
    }

    /// Typical device name prefix for a USB serial adapter.
    pub fn port_prefix(self) -> &'static str {
        match self {
            HostOs::Windows => "COM",
            HostOs::MacOs => "/dev/tty.usbserial",
            HostOs::Linux | HostOs::Other => "/dev/ttyUSB",
        }
    }
}

impl fmt::Display for HostOs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HostOs::Linux => "Linux",
            HostOs::Windows => "Windows",
            HostOs::MacOs => "macOS",
            HostOs::Other => "Other",
        };
        f.write_str(name)
    }
}

/// Whether a device name looks like a sensor adapter on `os`.
pub fn is_candidate_port(os: HostOs, name: &str) -> bool {
    match os {
        // ttyAMA is the Raspberry Pi GPIO UART
        HostOs::Linux => {
            !name.starts_with("/dev/ttyAMA")
                && (name.starts_with("/dev/ttyUSB") || name.starts_with("/dev/ttyACM"))
        }
        HostOs::Windows => name.starts_with("COM"),
        HostOs::MacOs => name.starts_with("/dev/tty.usbserial") || name.starts_with("/dev/tty.usbmodem"),
        HostOs::Other => true,
    }
}

/// Sorted serial devices that could be the sensor. Empty if enumeration fails.
pub fn list_serial_ports() -> Vec<String> {
    let os = HostOs::current();
    let mut ports: Vec<String> = match serialport::available_ports() {
        Ok(ports) => ports
            .into_iter()
            .map(|info| info.port_name)
            .filter(|name| is_candidate_port(os, name))
            .collect(),
        Err(e) => {
            log::debug!("Serial port enumeration failed: {}", e);
            Vec::new()
        }
    };
    ports.sort();
    ports
}

/// Checks a port name against the host OS naming rules.
pub fn validate_port(port: &str) -> bool {
    validate_port_for(HostOs::current(), port)
}

pub fn validate_port_for(os: HostOs, port: &str) -> bool {
    if port.is_empty() {
        return false;
    }
    match os {
        HostOs::Windows => {
            let (Some(prefix), Some(number)) = (port.get(..3), port.get(3..)) else {
                return false;
            };
            prefix.eq_ignore_ascii_case("COM")
                && !number.is_empty()
                && number.bytes().all(|b| b.is_ascii_digit())
        }
        HostOs::Linux => port.starts_with("/dev/tty"),
        HostOs::MacOs => port.starts_with("/dev/tty."),
        HostOs::Other => true,
    }
}

/// How to fix a permission-denied open.
pub fn permission_help() -> &'static str {
    permission_help_for(HostOs::current())
}

pub fn permission_help_for(os: HostOs) -> &'static str {
    match os {
        HostOs::Linux => {
            "Permission denied error. To fix:\n  \
             sudo usermod -a -G dialout $USER\n  \
             Then log out and log back in\n\
             Or run with sudo (not recommended):\n  \
             sudo a542-autostart <port>"
        }
        HostOs::MacOs => {
            "Permission denied error. You may need to:\n  \
             1. Add your user to the dialout group\n  \
             2. Or run with sudo (not recommended)"
        }
        HostOs::Windows | HostOs::Other => "Permission denied. Check if you have access to the serial port.",
    }
}

/// Example port names for error messages.
pub fn port_examples() -> &'static str {
    port_examples_for(HostOs::current())
}

pub fn port_examples_for(os: HostOs) -> &'static str {
    match os {
        HostOs::Windows => "COM1, COM2, COM3, etc.",
        HostOs::Linux => "/dev/ttyUSB0, /dev/ttyUSB1, /dev/ttyACM0, etc.",
        HostOs::MacOs => "/dev/tty.usbserial-*, /dev/tty.usbmodem-*, etc.",
        HostOs::Other => "/dev/ttyUSB0, COM1, etc.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_windows_ports() {
        assert!(validate_port_for(HostOs::Windows, "COM3"));
        assert!(validate_port_for(HostOs::Windows, "com12"));
        assert!(!validate_port_for(HostOs::Windows, "COM"));
        assert!(!validate_port_for(HostOs::Windows, "COMX"));
        assert!(!validate_port_for(HostOs::Windows, "/dev/ttyUSB0"));
        assert!(!validate_port_for(HostOs::Windows, "CÖM1"));
    }

    #[test]
    fn test_validate_unix_ports() {
        assert!(validate_port_for(HostOs::Linux, "/dev/ttyUSB0"));
        assert!(validate_port_for(HostOs::Linux, "/dev/ttyACM1"));
        assert!(!validate_port_for(HostOs::Linux, "COM3"));
        assert!(validate_port_for(HostOs::MacOs, "/dev/tty.usbserial-1410"));
        assert!(!validate_port_for(HostOs::MacOs, "/dev/ttyUSB0"));
        assert!(validate_port_for(HostOs::Other, "anything"));
    }

    #[test]
    fn test_empty_port_always_invalid() {
        for os in [HostOs::Linux, HostOs::Windows, HostOs::MacOs, HostOs::Other] {
            assert!(!validate_port_for(os, ""));
        }
    }

    #[test]
    fn test_candidate_filters() {
        assert!(is_candidate_port(HostOs::Linux, "/dev/ttyUSB0"));
        assert!(is_candidate_port(HostOs::Linux, "/dev/ttyACM0"));
        assert!(!is_candidate_port(HostOs::Linux, "/dev/ttyAMA0"));
        assert!(!is_candidate_port(HostOs::Linux, "/dev/ttyS0"));
        assert!(is_candidate_port(HostOs::MacOs, "/dev/tty.usbmodem14101"));
        assert!(!is_candidate_port(HostOs::MacOs, "/dev/tty.Bluetooth-Incoming-Port"));
        assert!(is_candidate_port(HostOs::Windows, "COM4"));
    }

    #[test]
    fn test_help_texts() {
        assert!(permission_help_for(HostOs::Linux).contains("dialout"));
        assert_eq!(port_examples_for(HostOs::Windows), "COM1, COM2, COM3, etc.");
        assert_eq!(HostOs::MacOs.to_string(), "macOS");
    }
}
