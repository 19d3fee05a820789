// src/sensor/sim.rs

use super::parser::{parse_frame, FrameError, HostRequest};
use crate::common::{
    hal_traits::{SensorSerial, SensorTimer},
    identity::encode_ascii_words,
    registers::*,
    window::Window,
};
use core::ops::{Add, Sub};
use core::time::Duration;
use log::debug;
use std::collections::{HashMap, VecDeque};
use std::vec::Vec;

/// Virtual clock reading of a [`SimulatedSensor`], in microseconds.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SimInstant(pub u64);

impl Add<Duration> for SimInstant {
    type Output = Self;
    fn add(self, rhs: Duration) -> Self {
        SimInstant(self.0.saturating_add(rhs.as_micros() as u64))
    }
}

impl Sub<SimInstant> for SimInstant {
    type Output = Duration;
    fn sub(self, rhs: SimInstant) -> Duration {
        Duration::from_micros(self.0.saturating_sub(rhs.0))
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SimError {
    /// The port was closed.
    Closed,
}

/// How a read of a particular register misbehaves.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum ReadFault {
    /// No answer at all.
    Silent,
    /// Only the first `n` bytes of the answer.
    Truncated(usize),
}

/// A self-clearing busy flag with a configurable number of busy reads.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Busy {
    Idle,
    /// Busy for this many more status reads.
    For(u32),
    /// Never completes.
    Stuck,
}

impl Busy {
    fn start(polls: Option<u32>) -> Self {
        polls.map_or(Busy::Stuck, Busy::For)
    }

    /// Advances by one status read; returns `true` on the read that completes.
    fn poll(&mut self) -> bool {
        match *self {
            Busy::Idle | Busy::Stuck => false,
            Busy::For(0) => {
                *self = Busy::Idle;
                true
            }
            Busy::For(n) => {
                *self = Busy::For(n - 1);
                false
            }
        }
    }

    fn is_active(&self) -> bool {
        !matches!(self, Busy::Idle)
    }
}

/// In-memory M-A542VR1 register model speaking the UART command protocol.
///
/// Implements both [`SensorSerial`] and [`SensorTimer`] on a virtual clock, so
/// the configurator can be driven end to end without hardware. Delays and
/// read timeouts advance the clock instead of sleeping.
#[derive(Debug)]
pub struct SimulatedSensor {
    now_us: u64,
    open: bool,
    window: Window,
    banks: [[u16; 64]; 2],
    rx: Vec<u8>,
    tx: VecDeque<u8>,
    max_chunk: usize,
    requests: Vec<(Window, HostRequest)>,
    frames: Vec<[u8; 3]>,
    rejected: Vec<FrameError>,
    faults: HashMap<(Window, u8), ReadFault>,
    silent_reads: u32,

    persisted_uart_ctrl: u8,
    backup: Busy,
    backup_busy_polls: Option<u32>,
    backup_error: bool,
    flash_test: Busy,
    flash_test_busy_polls: Option<u32>,
    flash_test_error: bool,
    mode_exit_honored: bool,
    reboot_silent_reads: u32,
    reboot_not_ready_polls: u32,
    not_ready_polls: u32,
}

impl Default for SimulatedSensor {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedSensor {
    /// A ready sensor in Configuration Mode with Auto Start disabled.
    ///
    /// Flash backup and flash test each report busy for two status reads. A
    /// software reset silences the sensor for one read, then reports
    /// NOT_READY for two more.
    pub fn new() -> Self {
        let mut sensor = SimulatedSensor {
            now_us: 0,
            open: true,
            window: Window::Zero,
            banks: [[0; 64]; 2],
            rx: Vec::new(),
            tx: VecDeque::new(),
            max_chunk: usize::MAX,
            requests: Vec::new(),
            frames: Vec::new(),
            rejected: Vec::new(),
            faults: HashMap::new(),
            silent_reads: 0,
            persisted_uart_ctrl: 0,
            backup: Busy::Idle,
            backup_busy_polls: Some(2),
            backup_error: false,
            flash_test: Busy::Idle,
            flash_test_busy_polls: Some(2),
            flash_test_error: false,
            mode_exit_honored: true,
            reboot_silent_reads: 1,
            reboot_not_ready_polls: 2,
            not_ready_polls: 0,
        };
        sensor.set_register(Window::Zero, MODE_CTRL, MODE_STAT_CONFIG);
        sensor
    }

    /// A sensor streaming in Auto Mode with UART_AUTO and AUTO_START set and persisted.
    pub fn in_auto_mode() -> Self {
        let mut sensor = Self::new();
        let uart_ctrl = UART_AUTO | AUTO_START;
        sensor.set_register(Window::Zero, MODE_CTRL, 0);
        sensor.set_register(Window::One, UART_CTRL_WRITE_LO & 0x7F, u16::from(uart_ctrl));
        sensor.persisted_uart_ctrl = uart_ctrl;
        sensor
    }

    // --- Scenario setup ---

    /// Loads product ID and serial number text into the identity registers.
    pub fn with_identity(mut self, product_id: &str, serial_number: &str) -> Self {
        let product: [u16; 4] = encode_ascii_words(product_id);
        let serial: [u16; 4] = encode_ascii_words(serial_number);
        for (address, word) in PROD_ID_REGISTERS.iter().zip(product) {
            self.set_register(Window::One, *address, word);
        }
        for (address, word) in SERIAL_NUM_REGISTERS.iter().zip(serial) {
            self.set_register(Window::One, *address, word);
        }
        self
    }

    pub fn set_register(&mut self, window: Window, address: u8, value: u16) {
        self.banks[window.index() as usize][word_index(address)] = value;
    }

    pub fn register(&self, window: Window, address: u8) -> u16 {
        self.banks[window.index() as usize][word_index(address)]
    }

    /// Never answers reads of this register.
    pub fn fail_reads_of(&mut self, window: Window, address: u8) {
        self.faults.insert((window, address), ReadFault::Silent);
    }

    /// Answers reads of this register with only the first `len` bytes.
    pub fn truncate_reads_of(&mut self, window: Window, address: u8, len: usize) {
        self.faults.insert((window, address), ReadFault::Truncated(len));
    }

    /// Ignores the next `reads` read requests.
    pub fn go_silent_for(&mut self, reads: u32) {
        self.silent_reads = reads;
    }

    /// Busy status reads before a flash backup completes; `None` never completes.
    pub fn set_flash_backup_busy_polls(&mut self, polls: Option<u32>) {
        self.backup_busy_polls = polls;
    }

    /// Whether a completed flash backup raises FLASH_BU_ERR.
    pub fn set_flash_backup_error(&mut self, error: bool) {
        self.backup_error = error;
    }

    /// Busy status reads before a flash test completes; `None` never completes.
    pub fn set_flash_test_busy_polls(&mut self, polls: Option<u32>) {
        self.flash_test_busy_polls = polls;
    }

    /// Whether a completed flash test raises FLASH_ERR.
    pub fn set_flash_test_error(&mut self, error: bool) {
        self.flash_test_error = error;
    }

    /// Whether a request to leave Auto Mode is obeyed.
    pub fn set_mode_exit_honored(&mut self, honored: bool) {
        self.mode_exit_honored = honored;
    }

    /// Reads ignored right after a software reset, then GLOB_CMD reads
    /// reporting NOT_READY.
    pub fn set_reboot_behavior(&mut self, silent_reads: u32, not_ready_polls: u32) {
        self.reboot_silent_reads = silent_reads;
        self.reboot_not_ready_polls = not_ready_polls;
    }

    /// Caps the bytes returned by one `read` call.
    pub fn set_max_chunk(&mut self, max_chunk: usize) {
        self.max_chunk = max_chunk.max(1);
    }

    // --- Inspection ---

    /// Every parsed request with the window selected when it was handled.
    pub fn requests(&self) -> &[(Window, HostRequest)] {
        &self.requests
    }

    /// Every well-formed frame exactly as written.
    pub fn written_frames(&self) -> &[[u8; 3]] {
        &self.frames
    }

    pub fn rejected_frames(&self) -> &[FrameError] {
        &self.rejected
    }

    /// Number of writes to `address` while `window` was selected.
    pub fn writes_to(&self, window: Window, address: u8) -> usize {
        self.requests
            .iter()
            .filter(|(w, req)| {
                *w == window && matches!(req, HostRequest::Write { address: a, .. } if *a == address)
            })
            .count()
    }

    /// UART_CTRL value that survives a power cycle.
    pub fn persisted_uart_ctrl(&self) -> u8 {
        self.persisted_uart_ctrl
    }

    pub fn current_window(&self) -> Window {
        self.window
    }

    /// Whether MODE_CTRL reports Configuration Mode.
    pub fn in_config_mode(&self) -> bool {
        self.register(Window::Zero, MODE_CTRL) & MODE_STAT_CONFIG != 0
    }

    // --- Protocol handling ---

    fn handle_frame(&mut self, frame: [u8; 3]) {
        let request = match parse_frame(&frame) {
            Ok(request) => request,
            Err(e) => {
                debug!("Simulated sensor rejected frame {:02X?}: {:?}", frame, e);
                self.rejected.push(e);
                return;
            }
        };
        self.frames.push(frame);

        match request {
            HostRequest::ResetSpell => {}
            HostRequest::SelectWindow(index) => match Window::new(index) {
                Ok(window) => self.window = window,
                Err(_) => debug!("Simulated sensor ignored window {}", index),
            },
            HostRequest::Read { address } => self.handle_read(address),
            HostRequest::Write { address, value } => self.handle_write(address, value),
        }
        self.requests.push((self.window, request));
    }

    fn handle_read(&mut self, address: u8) {
        if self.silent_reads > 0 {
            self.silent_reads -= 1;
            return;
        }
        let window = self.window;
        self.advance_status(window, address);

        let [msb, lsb] = self.register(window, address).to_be_bytes();
        let answer = [address, msb, lsb, DELIMITER];
        match self.faults.get(&(window, address)) {
            Some(ReadFault::Silent) => {}
            Some(ReadFault::Truncated(len)) => {
                let len = (*len).min(answer.len());
                self.tx.extend(&answer[..len]);
            }
            None => self.tx.extend(&answer),
        }
    }

    /// Steps the self-clearing status bits seen by a read of `address`.
    fn advance_status(&mut self, window: Window, address: u8) {
        match (window, address) {
            (Window::One, GLOB_CMD) => {
                if self.backup.poll() {
                    self.finish_flash_backup();
                }
                if self.not_ready_polls > 0 {
                    self.not_ready_polls -= 1;
                    if self.not_ready_polls == 0 {
                        self.clear_bits(Window::One, GLOB_CMD, GLOB_NOT_READY);
                    }
                }
            }
            (Window::One, MSC_CTRL) => {
                if self.flash_test.poll() {
                    self.finish_flash_test();
                }
            }
            _ => {}
        }
    }

    fn handle_write(&mut self, address: u8, value: u8) {
        let window = self.window;
        match (window, address) {
            (Window::One, GLOB_CMD_WRITE_LO) => {
                if value & GLOB_FLASH_BACKUP != 0 {
                    self.start_flash_backup();
                }
                if value & GLOB_SW_RESET != 0 {
                    self.reboot();
                }
            }
            (Window::One, MSC_CTRL_WRITE_HI) => {
                if value & MSC_CMD_FLASH_TEST != 0 {
                    self.start_flash_test();
                }
            }
            (Window::Zero, MODE_CTRL_WRITE_HI) => {
                if value == MODE_CMD_GOTO_CONFIG && self.mode_exit_honored {
                    self.set_bits(Window::Zero, MODE_CTRL, MODE_STAT_CONFIG);
                }
            }
            _ => self.store_byte(window, address, value),
        }
    }

    fn store_byte(&mut self, window: Window, address: u8, value: u8) {
        let word_address = address & 0x7E;
        let current = self.register(window, word_address);
        let updated = if address & 0x01 == 0 {
            (current & 0xFF00) | u16::from(value)
        } else {
            (current & 0x00FF) | (u16::from(value) << 8)
        };
        self.set_register(window, word_address, updated);
    }

    fn start_flash_backup(&mut self) {
        self.backup = Busy::start(self.backup_busy_polls);
        self.set_bits(Window::One, GLOB_CMD, u16::from(GLOB_FLASH_BACKUP));
    }

    fn finish_flash_backup(&mut self) {
        self.clear_bits(Window::One, GLOB_CMD, u16::from(GLOB_FLASH_BACKUP));
        if self.backup_error {
            self.set_bits(Window::Zero, DIAG_STAT1, DIAG_FLASH_BU_ERR);
        } else {
            self.clear_bits(Window::Zero, DIAG_STAT1, DIAG_FLASH_BU_ERR);
            self.persisted_uart_ctrl = self.uart_ctrl();
        }
    }

    fn start_flash_test(&mut self) {
        self.flash_test = Busy::start(self.flash_test_busy_polls);
        self.set_bits(Window::One, MSC_CTRL, MSC_FLASH_TEST_BUSY);
    }

    fn finish_flash_test(&mut self) {
        self.clear_bits(Window::One, MSC_CTRL, MSC_FLASH_TEST_BUSY);
        if self.flash_test_error {
            self.set_bits(Window::Zero, DIAG_STAT1, DIAG_FLASH_ERR);
        } else {
            self.clear_bits(Window::Zero, DIAG_STAT1, DIAG_FLASH_ERR);
        }
    }

    /// Software reset: volatile state reloads from flash.
    fn reboot(&mut self) {
        let uart_ctrl = self.persisted_uart_ctrl;
        self.window = Window::Zero;
        self.backup = Busy::Idle;
        self.flash_test = Busy::Idle;
        self.tx.clear();
        self.set_register(Window::One, UART_CTRL_WRITE_LO & 0x7E, u16::from(uart_ctrl));
        self.set_register(Window::One, MSC_CTRL, 0);
        let mode = if uart_ctrl & AUTO_START != 0 { 0 } else { MODE_STAT_CONFIG };
        self.set_register(Window::Zero, MODE_CTRL, mode);

        self.silent_reads = self.reboot_silent_reads;
        self.not_ready_polls = self.reboot_not_ready_polls;
        let glob_cmd = if self.not_ready_polls > 0 { GLOB_NOT_READY } else { 0 };
        self.set_register(Window::One, GLOB_CMD, glob_cmd);
    }

    fn uart_ctrl(&self) -> u8 {
        (self.register(Window::One, UART_CTRL_WRITE_LO & 0x7E) & 0x00FF) as u8
    }

    fn set_bits(&mut self, window: Window, address: u8, bits: u16) {
        let value = self.register(window, address) | bits;
        self.set_register(window, address, value);
    }

    fn clear_bits(&mut self, window: Window, address: u8, bits: u16) {
        let value = self.register(window, address) & !bits;
        self.set_register(window, address, value);
    }

    /// Whether a flash backup or flash test is still running.
    pub fn is_busy(&self) -> bool {
        self.backup.is_active() || self.flash_test.is_active()
    }
}

fn word_index(address: u8) -> usize {
    usize::from((address & 0x7F) >> 1)
}

impl SensorTimer for SimulatedSensor {
    type Instant = SimInstant;

    fn delay_us(&mut self, us: u32) {
        self.now_us += u64::from(us);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.now_us += u64::from(ms) * 1000;
    }

    fn now(&self) -> Self::Instant {
        SimInstant(self.now_us)
    }
}

impl SensorSerial for SimulatedSensor {
    type Error = SimError;

    fn read(&mut self, buf: &mut [u8]) -> nb::Result<usize, Self::Error> {
        if !self.open {
            return Err(nb::Error::Other(SimError::Closed));
        }
        if self.tx.is_empty() || buf.is_empty() {
            return Err(nb::Error::WouldBlock);
        }
        let n = buf.len().min(self.max_chunk).min(self.tx.len());
        for slot in buf.iter_mut().take(n) {
            // n <= tx.len(), so pop_front always yields
            *slot = self.tx.pop_front().unwrap_or(0);
        }
        Ok(n)
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        if !self.open {
            return Err(SimError::Closed);
        }
        self.rx.extend_from_slice(bytes);
        while self.rx.len() >= 3 {
            let frame = [self.rx[0], self.rx[1], self.rx[2]];
            self.rx.drain(..3);
            self.handle_frame(frame);
        }
        Ok(())
    }

    fn flush(&mut self) -> nb::Result<(), Self::Error> {
        if !self.open {
            return Err(nb::Error::Other(SimError::Closed));
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn close(&mut self) {
        self.open = false;
    }
}
