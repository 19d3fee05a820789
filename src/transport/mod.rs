// src/transport/mod.rs

mod io_helpers;

use crate::common::{
    command::Command,
    config::LinkConfig,
    error::SensorError,
    hal_traits::{SensorSerial, SensorTimer},
    timing,
};
use arrayvec::ArrayVec;
use core::fmt::Debug;
use core::time::Duration;
use log::debug;

/// Largest response a single `send_commands` call can collect.
pub const MAX_RESPONSE_LEN: usize = 64;

/// Response bytes of one or more commands, concatenated in order.
pub type Response = ArrayVec<u8, MAX_RESPONSE_LEN>;

/// One-command-at-a-time exchange over an open byte stream.
///
/// Owns the interface for the whole session and closes it when dropped.
#[derive(Debug)]
pub struct Transport<IF>
where
    IF: SensorSerial + SensorTimer,
{
    interface: IF,
    read_timeout: Duration,
}

impl<IF> Transport<IF>
where
    IF: SensorSerial + SensorTimer,
    IF::Error: Debug,
{
    /// Wraps an already-open interface with the default 3 second read timeout.
    pub fn new(interface: IF) -> Self {
        Transport {
            interface,
            read_timeout: timing::DEFAULT_READ_TIMEOUT,
        }
    }

    /// Wraps an already-open interface, taking the read timeout from `config`.
    pub fn with_config(interface: IF, config: &LinkConfig) -> Self {
        Transport {
            interface,
            read_timeout: config.read_timeout,
        }
    }

    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    pub fn is_open(&self) -> bool {
        self.interface.is_open()
    }

    /// Releases the stream. Safe to call when already closed.
    pub fn close(&mut self) {
        if self.interface.is_open() {
            self.interface.close();
            debug!("Connection closed");
        }
    }

    pub fn interface(&self) -> &IF {
        &self.interface
    }

    pub fn interface_mut(&mut self) -> &mut IF {
        &mut self.interface
    }

    /// Sends one command and returns its response (empty for writes).
    pub fn send_command(&mut self, command: &Command) -> Result<Response, SensorError<IF::Error>> {
        let mut response = Response::new();
        self.send_into(command, &mut response)?;
        Ok(response)
    }

    /// Sends each command in order and concatenates their responses.
    ///
    /// The first failure aborts the remaining commands.
    pub fn send_commands(&mut self, commands: &[Command]) -> Result<Response, SensorError<IF::Error>> {
        let mut response = Response::new();
        for command in commands {
            self.send_into(command, &mut response)?;
        }
        Ok(response)
    }

    /// Blocks for at least `duration`.
    pub fn delay(&mut self, duration: Duration) {
        self.interface.delay_ms(duration.as_millis() as u32);
    }

    pub fn now(&self) -> IF::Instant {
        self.interface.now()
    }

    fn send_into(&mut self, command: &Command, response: &mut Response) -> Result<(), SensorError<IF::Error>> {
        if !self.interface.is_open() {
            return Err(SensorError::NotOpen);
        }

        let needed = response.len() + command.response_len;
        if needed > response.capacity() {
            return Err(SensorError::BufferOverflow {
                needed,
                got: response.capacity(),
            });
        }

        debug!("Sending command: {}", command);
        self.write_command_bytes(command.as_bytes())?;

        if command.response_len > 0 {
            let mut read_buffer = [0u8; MAX_RESPONSE_LEN];
            let chunk = &mut read_buffer[..command.response_len];
            self.read_exact(chunk)?;
            debug!("Received: {:02X?}", chunk);
            response
                .try_extend_from_slice(chunk)
                .map_err(|_| SensorError::BufferOverflow {
                    needed,
                    got: MAX_RESPONSE_LEN,
                })?;
        }

        Ok(())
    }
}

impl<IF> Drop for Transport<IF>
where
    IF: SensorSerial + SensorTimer,
{
    fn drop(&mut self) {
        self.close();
    }
}
