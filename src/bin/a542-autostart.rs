// src/bin/a542-autostart.rs

use a542_autostart::common::config::{is_supported_baud, LinkConfig, DEFAULT_BAUD_RATE, SUPPORTED_BAUD_RATES};
use a542_autostart::common::error::ConnectionErrorKind;
use a542_autostart::{platform, SensorError, SerialPortInterface, SyncConfigurator, Transport};
use clap::{CommandFactory, Parser, ValueEnum};
use log::{error, info, warn};
use std::process::ExitCode;

/// Configure M-A542VR1 vibration sensors for UART Auto Start
#[derive(Parser, Debug)]
#[command(
    name = "a542-autostart",
    version,
    long_about = None,
    after_help = "Examples:\n  a542-autostart /dev/ttyUSB0\n  a542-autostart COM3 460800\n  \
                  a542-autostart /dev/tty.usbserial-1410 --action disable\n  a542-autostart --list-ports"
)]
struct Args {
    /// Serial port path (e.g. /dev/ttyUSB0, COM3, /dev/tty.usbserial-1410)
    port: Option<String>,

    /// Baud rate (230400, 460800 or 921600)
    baud: Option<u32>,

    /// Baud rate; overrides the positional value
    #[arg(long)]
    baud_rate: Option<u32>,

    /// List candidate serial ports and exit
    #[arg(long, default_value_t = false)]
    list_ports: bool,

    /// What to do once connected
    #[arg(long, value_enum, default_value_t = Action::Configure)]
    action: Action,

    /// Leave flash untouched when disabling or resetting
    #[arg(long, default_value_t = false)]
    no_persist: bool,

    /// Enable debug logging (every frame on the wire)
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Action {
    /// Enable UART Auto Start and save it to flash
    Configure,
    /// Leave Auto Mode and clear Auto Start
    Disable,
    /// Exit Auto Mode, flash test, then software reset
    Reset,
    /// Read product ID and serial number only
    Identify,
}

fn main() -> ExitCode {
    let args = Args::parse();

    env_logger::Builder::from_default_env()
        .filter_level(if args.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .init();

    if args.list_ports {
        list_available_ports();
        return ExitCode::SUCCESS;
    }

    let Some(port) = args.port.as_deref() else {
        // Printing help only fails if stdout is gone.
        let _ = Args::command().print_help();
        eprintln!("\nError: Port is required");
        eprintln!("Use --list-ports to see available ports");
        return ExitCode::FAILURE;
    };

    let baud = args.baud_rate.or(args.baud).unwrap_or(DEFAULT_BAUD_RATE);
    if run(port, baud, args.action, !args.no_persist) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn list_available_ports() {
    let os = platform::HostOs::current();
    println!("\nDetected OS: {}", os);
    println!("Port prefix: {}", os.port_prefix());
    println!("\nAvailable serial ports:");

    let ports = platform::list_serial_ports();
    if ports.is_empty() {
        println!("  No serial ports found");
        println!("\nTroubleshooting:");
        println!("  - Make sure the sensor is connected");
        println!("  - Check USB cable connection");
        println!("  - Try unplugging and replugging the device");
        if os == platform::HostOs::Linux {
            println!("  - Check if device appears in: ls -la /dev/ttyUSB*");
        }
        return;
    }
    for (i, port) in ports.iter().enumerate() {
        println!("  {}. {}", i + 1, port);
    }
    println!("\nTotal: {} port(s) found", ports.len());
}

fn run(port: &str, baud: u32, action: Action, persist: bool) -> bool {
    info!("Sensor Auto Start Configuration Tool");

    if !platform::validate_port(port) {
        error!("Invalid port name: {}", port);
        error!("Valid port examples: {}", platform::port_examples());
        return false;
    }
    if !is_supported_baud(baud) {
        warn!("Baud rate {} is not in recommended list: {:?}", baud, SUPPORTED_BAUD_RATES);
        warn!("Continuing anyway...");
    }

    info!("Connecting to {} at {} baud", port, baud);
    let config = LinkConfig::default().baud_rate(baud);
    let transport = match Transport::<SerialPortInterface>::open_with(port, &config) {
        Ok(transport) => transport,
        Err(e) => {
            report_open_failure(port, &e);
            return false;
        }
    };

    // Dropping the configurator closes the port on every path below.
    let mut configurator = SyncConfigurator::new(transport);

    if action == Action::Identify {
        return match configurator.detect_identity() {
            Some(identity) => {
                println!("Product ID:    {}", identity.product_id);
                println!("Serial number: {}", identity.serial_number);
                true
            }
            None => false,
        };
    }

    if configurator.detect_identity().is_none() {
        warn!("Could not read sensor identity; continuing");
    }

    let success = match action {
        Action::Configure => configurator.configure(),
        Action::Disable => configurator.exit_auto_mode(persist),
        Action::Reset => configurator.full_reset(persist),
        Action::Identify => true,
    };
    if success {
        info!("{:?} completed successfully", action);
    }
    success
}

fn report_open_failure<E: core::fmt::Debug>(port: &str, e: &SensorError<E>) {
    match e {
        SensorError::Connection(ConnectionErrorKind::PermissionDenied) => {
            error!("Permission denied: {}", port);
            error!("\n{}", platform::permission_help());
        }
        SensorError::Connection(ConnectionErrorKind::NotFound) => {
            error!("Port '{}' does not exist", port);
            error!("Use --list-ports to see available ports");
        }
        SensorError::Connection(ConnectionErrorKind::Busy) => {
            error!("Port '{}' is in use by another program", port);
        }
        other => error!("Failed to open {}: {}", port, other),
    }
}
