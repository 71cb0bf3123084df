//! Cooperative poll loop tying input, persistence and rendering together.
//!
//! Call [`Scheduler::boot`] once, then [`Scheduler::tick`] as often as the
//! main loop allows (every few milliseconds is plenty). Nothing in a tick
//! blocks: serial input is read only while bytes are ready, and animations
//! are evaluated frame by frame.

use crate::color::{Color, COLOR_OFF};
use crate::config::{CYCLE_INTERVAL_MS, LINE_CAPACITY, STORAGE_CAPACITY};
use crate::effect::Animation;
use crate::led::RgbLed;
use crate::pattern::{EngineState, Pattern};
use crate::protocol::{Command, Feed, LineBuffer, Reply};
use crate::storage::{PatternStorage, StorageError};
use crate::time::{TimeInstant, TimeSource};
use core::marker::PhantomData;
use embedded_io::{Read, ReadReady, Write};
use embedded_storage::Storage;

/// Drives one RGB LED from patterns received on a serial link.
///
/// # Type Parameters
/// * `'t` - Lifetime of the time source reference
/// * `I` - Time instant type
/// * `L` - LED implementation type
/// * `T` - Time source implementation type
/// * `S` - Serial port (non-blocking reads gated by `read_ready`)
/// * `P` - Non-volatile storage driver
/// * `CAPACITY` - Size of the persisted-image region
pub struct Scheduler<'t, I, L, T, S, P, const CAPACITY: usize = STORAGE_CAPACITY>
where
    I: TimeInstant,
    L: RgbLed,
    T: TimeSource<I>,
    S: Read + ReadReady + Write,
    P: Storage,
{
    led: L,
    time_source: &'t T,
    serial: S,
    storage: PatternStorage<P, CAPACITY>,
    line: LineBuffer<LINE_CAPACITY>,
    current_color: Color,
    seed: u32,
    _instant: PhantomData<I>,
}

impl<'t, I, L, T, S, P, const CAPACITY: usize> Scheduler<'t, I, L, T, S, P, CAPACITY>
where
    I: TimeInstant,
    L: RgbLed,
    T: TimeSource<I>,
    S: Read + ReadReady + Write,
    P: Storage,
{
    /// Creates a scheduler with the LED turned off.
    pub fn new(
        mut led: L,
        time_source: &'t T,
        serial: S,
        storage: PatternStorage<P, CAPACITY>,
    ) -> Self {
        led.set_color(COLOR_OFF);

        Self {
            led,
            time_source,
            serial,
            storage,
            line: LineBuffer::new(),
            current_color: COLOR_OFF,
            seed: 0x2545_F491,
            _instant: PhantomData,
        }
    }

    /// Restores the persisted pattern, or the off state if there is none.
    ///
    /// A restored pattern is not written back to storage.
    pub fn boot(&mut self, state: &mut EngineState<I>) {
        let now = self.time_source.now();
        state.reset();

        match self.storage.load(&mut state.raw) {
            Ok(pattern) => {
                info!(
                    "restored pattern: {} colors, {}",
                    pattern.len(),
                    pattern.transition().name()
                );
                state.install(pattern, now);
            }
            Err(e) => {
                info!("no stored pattern: {}", e);
                state.reset();
            }
        }

        self.start_step(state, now);
    }

    /// Runs one pass of the main loop.
    ///
    /// 1. Handles at most one complete input line.
    /// 2. Advances the running animation, if any.
    /// 3. Otherwise advances either the pattern cursor or the rainbow hue.
    pub fn tick(&mut self, state: &mut EngineState<I>) {
        self.poll_input(state);

        let now = self.time_source.now();
        if state.pattern.is_off() {
            return;
        }

        self.render_animation(state, now);
        if state.animation.is_some() {
            return;
        }

        if state.rainbow_mode {
            self.advance_rainbow(state, now);
        } else {
            self.advance_pattern(state, now);
        }
    }

    /// Reads bytes while available until one line completes.
    fn read_line(&mut self) -> Option<Feed> {
        let mut byte = [0u8; 1];
        loop {
            if !matches!(self.serial.read_ready(), Ok(true)) {
                return None;
            }
            if !matches!(self.serial.read(&mut byte), Ok(1)) {
                return None;
            }
            match self.line.feed(byte[0]) {
                Feed::Pending => continue,
                done => return Some(done),
            }
        }
    }

    fn poll_input(&mut self, state: &mut EngineState<I>) {
        match self.read_line() {
            Some(Feed::Line) => {
                let now = self.time_source.now();
                let accepted = {
                    let Self {
                        line,
                        serial,
                        storage,
                        ..
                    } = self;
                    handle_line(line.line(), serial, storage, state, now)
                };
                self.line.clear();

                if accepted {
                    self.start_step(state, now);
                }
            }
            Some(Feed::Overflow) => {
                warn!("input line exceeds {} bytes, dropped", LINE_CAPACITY);
                send(&mut self.serial, Reply::LineTooLong);
            }
            Some(Feed::Pending) | None => {}
        }
    }

    /// Starts the effect for the color under the cursor.
    fn start_step(&mut self, state: &mut EngineState<I>, now: I) {
        let Some(color) = state.current_target() else {
            state.animation = None;
            self.show(COLOR_OFF);
            return;
        };

        let transition = state.pattern.transition();
        // Rainbow intro lands on the first rainbow color, not the pattern color.
        let target = transition.rainbow().map_or(color, |r| r.color(state.rainbow_hue));

        let animation = Animation::new(transition.effect(), target, self.next_seed());
        state.animation = Some((animation, now));
        self.render_animation(state, now);
    }

    fn render_animation(&mut self, state: &mut EngineState<I>, now: I) {
        let Some((animation, started)) = state.animation else {
            return;
        };

        let frame = animation.frame(now.millis_since(started));
        self.show(frame.color);
        if frame.done {
            state.animation = None;
        }
    }

    fn advance_pattern(&mut self, state: &mut EngineState<I>, now: I) {
        let Some(last) = state.last_change else {
            return;
        };
        if now.millis_since(last) < CYCLE_INTERVAL_MS {
            return;
        }

        if state.pattern.len() > 1 {
            state.advance_cursor();
            trace!("pattern cursor -> {}", state.color_index);
        } else if !state.pattern.transition().loops() {
            return;
        }

        state.last_change = Some(now);
        self.start_step(state, now);
    }

    fn advance_rainbow(&mut self, state: &mut EngineState<I>, now: I) {
        let Some(rainbow) = state.pattern.transition().rainbow() else {
            return;
        };
        if let Some(last) = state.last_rainbow_step {
            if now.millis_since(last) < rainbow.interval_ms() {
                return;
            }
        }

        state.rainbow_hue = state.rainbow_hue.wrapping_add(rainbow.hue_step());
        state.last_rainbow_step = Some(now);
        self.show(rainbow.color(state.rainbow_hue));
    }

    /// Writes to the LED only when the color changes.
    fn show(&mut self, color: Color) {
        if color != self.current_color {
            self.led.set_color(color);
            self.current_color = color;
        }
    }

    fn next_seed(&mut self) -> u32 {
        self.seed = self.seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        self.seed
    }

    /// Color last written to the LED.
    pub fn current_color(&self) -> Color {
        self.current_color
    }

    pub fn led(&self) -> &L {
        &self.led
    }

    pub fn serial(&self) -> &S {
        &self.serial
    }

    pub fn serial_mut(&mut self) -> &mut S {
        &mut self.serial
    }

    pub fn storage(&self) -> &PatternStorage<P, CAPACITY> {
        &self.storage
    }

    /// Tears the scheduler down, returning its peripherals.
    pub fn release(self) -> (L, S, PatternStorage<P, CAPACITY>) {
        (self.led, self.serial, self.storage)
    }
}

fn send<S: Write>(serial: &mut S, reply: Reply<'_>) {
    // Acknowledgments are best-effort.
    let _ = reply.write_to(serial);
}

/// Handles one line. Returns true when a new pattern was installed.
fn handle_line<I, S, P, const CAPACITY: usize>(
    line: &[u8],
    serial: &mut S,
    storage: &mut PatternStorage<P, CAPACITY>,
    state: &mut EngineState<I>,
    now: I,
) -> bool
where
    I: TimeInstant,
    S: Write,
    P: Storage,
{
    match Command::classify(line) {
        Command::Empty => false,
        Command::GetVersion => {
            send(serial, Reply::Version);
            false
        }
        Command::GetPattern => {
            if state.pattern.is_off() {
                send(serial, Reply::NoPattern);
            } else {
                send(serial, Reply::Pattern(state.raw_json()));
            }
            false
        }
        Command::Pattern(json) => match Pattern::from_json(json) {
            Err(e) => {
                warn!("rejected pattern: {}", e);
                send(serial, Reply::ParseError);
                false
            }
            Ok(pattern) => {
                info!(
                    "pattern accepted: {} colors, {}",
                    pattern.len(),
                    pattern.transition().name()
                );
                send(serial, Reply::PatternReceived);

                match storage.save(json) {
                    Ok(()) => send(serial, Reply::PatternSaved),
                    Err(StorageError::TooLarge { len, max }) => {
                        warn!("pattern not saved: {} bytes exceeds {}", len, max);
                        send(serial, Reply::TooLarge { len, max });
                    }
                    Err(e) => {
                        warn!("pattern not saved: {}", e);
                        send(serial, Reply::StorageFailed);
                    }
                }

                let was_rainbow = state.rainbow_mode;
                state.replace(pattern, json, now);
                if state.rainbow_mode != was_rainbow {
                    debug!("rainbow mode {}", if state.rainbow_mode { "on" } else { "off" });
                }
                true
            }
        },
    }
}
