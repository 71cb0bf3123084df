//! Shared test infrastructure for rgb-pattern-engine integration tests

#![allow(dead_code)] // Items used across multiple test files; Rust analyzes per-file

use core::convert::Infallible;
use std::collections::VecDeque;
use std::string::String;
use std::vec::Vec;

use embedded_storage::{ReadStorage, Storage};
use rgb_pattern_engine::config::STORAGE_CAPACITY;
use rgb_pattern_engine::{
    Color, PatternStorage, RgbLed, Scheduler, TimeDuration, TimeInstant, TimeSource, COLOR_OFF,
};

// ============================================================================
// Mock Time Types
// ============================================================================

/// Mock duration type for testing (wraps milliseconds)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TestDuration(pub u64);

impl TimeDuration for TestDuration {
    const ZERO: Self = TestDuration(0);

    fn as_millis(&self) -> u64 {
        self.0
    }

    fn from_millis(millis: u64) -> Self {
        TestDuration(millis)
    }
}

/// Mock instant type for testing
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TestInstant(pub u64);

impl TimeInstant for TestInstant {
    type Duration = TestDuration;

    fn duration_since(&self, earlier: Self) -> Self::Duration {
        TestDuration(self.0 - earlier.0)
    }
}

/// Mock time source with controllable time advancement
pub struct MockTimeSource {
    current_time: core::cell::Cell<TestInstant>,
}

impl MockTimeSource {
    pub fn new() -> Self {
        Self {
            current_time: core::cell::Cell::new(TestInstant(0)),
        }
    }

    /// Advance time by the given number of milliseconds
    pub fn advance(&self, millis: u64) {
        let current = self.current_time.get();
        self.current_time.set(TestInstant(current.0 + millis));
    }
}

impl TimeSource<TestInstant> for MockTimeSource {
    fn now(&self) -> TestInstant {
        self.current_time.get()
    }
}

// ============================================================================
// Mock LED
// ============================================================================

/// Mock LED that records all color changes for testing
pub struct MockLed {
    current_color: Color,
    color_history: Vec<Color>,
}

impl MockLed {
    pub fn new() -> Self {
        Self {
            current_color: COLOR_OFF,
            color_history: Vec::new(),
        }
    }

    pub fn last_color(&self) -> Color {
        self.current_color
    }

    pub fn color_history(&self) -> &[Color] {
        &self.color_history
    }
}

impl RgbLed for MockLed {
    fn set_color(&mut self, color: Color) {
        self.current_color = color;
        self.color_history.push(color);
    }
}

/// PWM channel that remembers its last duty
pub struct MockPwm {
    pub duty: u16,
}

impl MockPwm {
    pub fn new() -> Self {
        Self { duty: 0 }
    }
}

impl embedded_hal::pwm::ErrorType for MockPwm {
    type Error = Infallible;
}

impl embedded_hal::pwm::SetDutyCycle for MockPwm {
    fn max_duty_cycle(&self) -> u16 {
        255
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        self.duty = duty;
        Ok(())
    }
}

// ============================================================================
// Mock Serial
// ============================================================================

/// Serial port with queued input and captured output
pub struct MockSerial {
    input: VecDeque<u8>,
    output: Vec<u8>,
}

impl MockSerial {
    pub fn new() -> Self {
        Self {
            input: VecDeque::new(),
            output: Vec::new(),
        }
    }

    /// Queue raw bytes as if the host had sent them
    pub fn push_bytes(&mut self, bytes: &[u8]) {
        self.input.extend(bytes.iter().copied());
    }

    /// Queue a line plus its terminating newline
    pub fn push_line(&mut self, line: &str) {
        self.push_bytes(line.as_bytes());
        self.push_bytes(b"\n");
    }

    pub fn pending_input(&self) -> usize {
        self.input.len()
    }

    /// Returns all complete output lines and clears the output
    pub fn take_lines(&mut self) -> Vec<String> {
        let text = String::from_utf8(core::mem::take(&mut self.output)).unwrap();
        text.lines().map(String::from).collect()
    }
}

impl embedded_io::ErrorType for MockSerial {
    type Error = Infallible;
}

impl embedded_io::Read for MockSerial {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let mut n = 0;
        while n < buf.len() {
            match self.input.pop_front() {
                Some(b) => {
                    buf[n] = b;
                    n += 1;
                }
                None => break,
            }
        }
        Ok(n)
    }
}

impl embedded_io::ReadReady for MockSerial {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.input.is_empty())
    }
}

impl embedded_io::Write for MockSerial {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.output.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

// ============================================================================
// In-memory storage
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryError {
    OutOfBounds,
    WriteFailed,
}

/// RAM-backed storage, erased to 0xFF, with optional write fault injection
pub struct MemoryStorage {
    pub bytes: Vec<u8>,
    /// Number of write calls to accept before failing (simulates power loss)
    pub writes_left: Option<usize>,
}

impl MemoryStorage {
    pub fn new(size: usize) -> Self {
        Self {
            bytes: vec![0xFF; size],
            writes_left: None,
        }
    }

    pub fn failing() -> Self {
        Self {
            writes_left: Some(0),
            ..Self::new(STORAGE_CAPACITY)
        }
    }
}

impl ReadStorage for MemoryStorage {
    type Error = MemoryError;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        let start = offset as usize;
        let end = start + bytes.len();
        let src = self.bytes.get(start..end).ok_or(MemoryError::OutOfBounds)?;
        bytes.copy_from_slice(src);
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.bytes.len()
    }
}

impl Storage for MemoryStorage {
    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        if let Some(left) = self.writes_left.as_mut() {
            if *left == 0 {
                return Err(MemoryError::WriteFailed);
            }
            *left -= 1;
        }
        let start = offset as usize;
        let end = start + bytes.len();
        let dst = self.bytes.get_mut(start..end).ok_or(MemoryError::OutOfBounds)?;
        dst.copy_from_slice(bytes);
        Ok(())
    }
}

// ============================================================================
// Scheduler construction
// ============================================================================

pub type TestScheduler<'t, const C: usize> =
    Scheduler<'t, TestInstant, MockLed, MockTimeSource, MockSerial, MemoryStorage, C>;

/// Scheduler over the full-size storage region
pub fn new_scheduler(
    timer: &MockTimeSource,
    storage: MemoryStorage,
) -> TestScheduler<'_, STORAGE_CAPACITY> {
    new_scheduler_with_capacity(timer, storage)
}

/// Scheduler over a storage region of `C` bytes
pub fn new_scheduler_with_capacity<const C: usize>(
    timer: &MockTimeSource,
    storage: MemoryStorage,
) -> TestScheduler<'_, C> {
    Scheduler::new(
        MockLed::new(),
        timer,
        MockSerial::new(),
        PatternStorage::new(storage, 0),
    )
}

// ============================================================================
// Payload helpers
// ============================================================================

pub const RED_INSTANT: &str =
    r#"{"count":1,"transition":"instant","pattern":[{"r":255,"g":0,"b":0}]}"#;

pub const RGB_INSTANT: &str = r#"{"count":3,"transition":"instant","pattern":[{"r":255,"g":0,"b":0},{"r":0,"g":255,"b":0},{"r":0,"g":0,"b":255}]}"#;

pub const RAINBOW_FAST_HALF: &str = r#"{"count":1,"transition":"color_wheel","pattern":[{"r":255,"g":255,"b":255}],"speed":100,"brightness":50}"#;

/// Largest channel value of a color
pub fn peak(color: Color) -> u8 {
    color.red.max(color.green).max(color.blue)
}

/// Pattern of `n` shortest-form color entries (20 bytes each with the comma)
pub fn dense_pattern(n: usize) -> String {
    let entries: Vec<String> = (0..n)
        .map(|i| format!(r#"{{"r":0,"g":0,"b":{}}}"#, i % 10))
        .collect();
    format!(r#"{{"count":{},"pattern":[{}]}}"#, n, entries.join(","))
}

/// Writes a valid image holding `json` straight into `memory`
pub fn seed_image(memory: &mut MemoryStorage, json: &[u8]) {
    let magic = rgb_pattern_engine::config::STORAGE_MAGIC.to_le_bytes();
    let len = (json.len() as u16).to_le_bytes();
    memory.bytes[..4].copy_from_slice(&[magic[0], magic[1], len[0], len[1]]);
    memory.bytes[4..4 + json.len()].copy_from_slice(json);
}
