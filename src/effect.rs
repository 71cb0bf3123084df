//! Effect engine: pure step functions from elapsed time to LED color.
//!
//! Every one-shot effect is evaluated as `frame(elapsed)` rather than played
//! with sleeps, so the scheduler can keep polling input between frames and
//! a newly received pattern replaces an animation mid-flight.
//!
//! Rainbow mode is not a one-shot effect. [`Rainbow`] only describes its
//! cadence; the scheduler owns the hue counter.

use crate::color::{blend, hsv_to_rgb, scale, Color, COLOR_OFF};
use crate::config::{
    RAINBOW_FASTEST_MS, RAINBOW_MAX_HUE_STEP, RAINBOW_MIN_HUE_STEP, RAINBOW_SLOWEST_MS,
};
use core::f32::consts::PI;

const FADE_STEPS: u64 = 50;
const FADE_STEP_MS: u64 = 10;
const WIPE_STEPS: u64 = 20;
const WIPE_STEP_MS: u64 = 10;
const STROBE_FLASHES: u64 = 5;
const STROBE_PHASE_MS: u64 = 50;
const BOUNCE_MS: u64 = 800;
const SMOOTH_MS: u64 = 800;
const SPARKLE_FLICKERS: usize = 15;
const SPARKLE_MIN_LEVEL: u32 = 50;
const SPARKLE_MAX_LEVEL: u32 = 255;
const SPARKLE_MIN_HOLD_MS: u32 = 30;
const SPARKLE_MAX_HOLD_MS: u32 = 80;
const SWEEP_STEPS: u64 = 100;
const SWEEP_STEP_MS: u64 = 10;

/// One-shot effect kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Effect {
    Instant,
    Fade,
    Wipe,
    Pulse,
    Strobe,
    Bounce,
    Breathe,
    Blink,
    Heartbeat,
    Smooth,
    Sparkle,
    /// Hue sweep across the spectrum at HSV `value`, landing on the target.
    ColorSweep { value: u8 },
}

/// Result of evaluating an animation at some instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    /// Color to show now.
    pub color: Color,
    /// The animation has finished; `color` is the settled target.
    pub done: bool,
}

impl Frame {
    #[inline]
    fn running(color: Color) -> Self {
        Self { color, done: false }
    }

    #[inline]
    fn settled(target: Color) -> Self {
        Self {
            color: target,
            done: true,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Ease {
    Linear,
    /// `sin(t * pi/2)`: quick start, soft landing.
    SineOut,
    /// `1 - cos(t * pi/2)`: soft start.
    SineIn,
}

impl Ease {
    fn apply(self, t: f32) -> f32 {
        match self {
            Ease::Linear => t,
            Ease::SineOut => libm::sinf(t * PI / 2.0),
            Ease::SineIn => 1.0 - libm::cosf(t * PI / 2.0),
        }
    }
}

/// A piece of a brightness envelope.
#[derive(Debug, Clone, Copy)]
struct Segment {
    ms: u64,
    from: f32,
    to: f32,
    ease: Ease,
}

impl Segment {
    const fn hold(ms: u64, level: f32) -> Self {
        Self { ms, from: level, to: level, ease: Ease::Linear }
    }

    const fn ramp(ms: u64, from: f32, to: f32) -> Self {
        Self { ms, from, to, ease: Ease::Linear }
    }

    const fn eased(ms: u64, from: f32, to: f32, ease: Ease) -> Self {
        Self { ms, from, to, ease }
    }
}

const PULSE: [Segment; 2] = [Segment::ramp(500, 0.0, 1.0), Segment::ramp(500, 1.0, 0.0)];

const BREATHE: [Segment; 5] = [
    Segment::hold(200, 0.0),
    Segment::eased(1000, 0.0, 1.0, Ease::SineOut),
    Segment::hold(300, 1.0),
    Segment::eased(1000, 1.0, 0.0, Ease::SineIn),
    Segment::hold(200, 0.0),
];

const BLINK: [Segment; 4] = [
    Segment::hold(100, 0.0),
    Segment::hold(200, 1.0),
    Segment::hold(100, 0.0),
    Segment::hold(200, 1.0),
];

const HEARTBEAT: [Segment; 5] = [
    Segment::ramp(80, 0.0, 1.0),
    Segment::ramp(80, 1.0, 0.3),
    Segment::ramp(80, 0.3, 0.8),
    Segment::ramp(160, 0.8, 0.0),
    Segment::hold(400, 0.0),
];

/// Brightness level at `elapsed`, or `None` once past the last segment.
fn envelope(segments: &[Segment], elapsed: u64) -> Option<f32> {
    let mut start = 0;
    for seg in segments {
        if elapsed < start + seg.ms {
            let t = (elapsed - start) as f32 / seg.ms as f32;
            return Some(seg.from + (seg.to - seg.from) * seg.ease.apply(t));
        }
        start += seg.ms;
    }
    None
}

fn envelope_frame(segments: &[Segment], target: Color, elapsed: u64) -> Frame {
    match envelope(segments, elapsed) {
        Some(level) => Frame::running(scale(target, level)),
        None => Frame::settled(target),
    }
}

fn stepped_fade(target: Color, elapsed: u64, steps: u64, step_ms: u64) -> Frame {
    let step = elapsed / step_ms + 1;
    if step >= steps {
        return Frame::settled(target);
    }
    Frame::running(blend(COLOR_OFF, target, step as f32 / steps as f32))
}

fn progress(elapsed: u64, duration: u64) -> Option<f32> {
    (elapsed < duration).then(|| elapsed as f32 / duration as f32)
}

/// Elastic overshoot: `1 + sin((t - 1) * 2.5pi) * e^(-5t)`.
fn bounce_factor(t: f32) -> f32 {
    1.0 + libm::sinf((t - 1.0) * 2.5 * PI) * libm::expf(-5.0 * t)
}

/// `2t^2` for the first half, `1 - (-2t + 2)^2 / 2` after.
fn ease_in_out(t: f32) -> f32 {
    if t < 0.5 {
        2.0 * t * t
    } else {
        let u = -2.0 * t + 2.0;
        1.0 - u * u / 2.0
    }
}

/// Small xorshift generator; sparkle only needs cheap, repeatable noise.
struct XorShift32(u32);

impl XorShift32 {
    fn new(seed: u32) -> Self {
        Self(if seed == 0 { 0x9E37_79B9 } else { seed })
    }

    fn next(&mut self) -> u32 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.0 = x;
        x
    }

    fn range(&mut self, low: u32, high: u32) -> u32 {
        low + self.next() % (high - low + 1)
    }
}

fn sparkle(target: Color, seed: u32, elapsed: u64) -> Frame {
    let mut rng = XorShift32::new(seed);
    let mut start = 0u64;
    for _ in 0..SPARKLE_FLICKERS {
        let level = rng.range(SPARKLE_MIN_LEVEL, SPARKLE_MAX_LEVEL);
        let hold = u64::from(rng.range(SPARKLE_MIN_HOLD_MS, SPARKLE_MAX_HOLD_MS));
        if elapsed < start + hold {
            return Frame::running(scale(target, level as f32 / 255.0));
        }
        start += hold;
    }
    Frame::settled(target)
}

/// A one-shot effect bound to its target color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Animation {
    effect: Effect,
    target: Color,
    seed: u32,
}

impl Animation {
    /// Binds `effect` to `target`. `seed` drives sparkle's randomness and
    /// is ignored by the other effects.
    pub fn new(effect: Effect, target: Color, seed: u32) -> Self {
        Self { effect, target, seed }
    }

    pub fn effect(&self) -> Effect {
        self.effect
    }

    pub fn target(&self) -> Color {
        self.target
    }

    /// Evaluates the animation `elapsed_ms` after it started.
    ///
    /// Same inputs always give the same frame. Once `done` is reported,
    /// every later instant yields the settled target too.
    pub fn frame(&self, elapsed_ms: u64) -> Frame {
        let target = self.target;
        match self.effect {
            Effect::Instant => Frame::settled(target),
            Effect::Fade => stepped_fade(target, elapsed_ms, FADE_STEPS, FADE_STEP_MS),
            Effect::Wipe => stepped_fade(target, elapsed_ms, WIPE_STEPS, WIPE_STEP_MS),
            Effect::Pulse => envelope_frame(&PULSE, target, elapsed_ms),
            Effect::Breathe => envelope_frame(&BREATHE, target, elapsed_ms),
            Effect::Blink => envelope_frame(&BLINK, target, elapsed_ms),
            Effect::Heartbeat => envelope_frame(&HEARTBEAT, target, elapsed_ms),
            Effect::Strobe => {
                let phase = elapsed_ms / STROBE_PHASE_MS;
                if phase >= STROBE_FLASHES * 2 {
                    Frame::settled(target)
                } else if phase % 2 == 0 {
                    Frame::running(target)
                } else {
                    Frame::running(COLOR_OFF)
                }
            }
            Effect::Bounce => match progress(elapsed_ms, BOUNCE_MS) {
                Some(t) => Frame::running(scale(target, bounce_factor(t))),
                None => Frame::settled(target),
            },
            Effect::Smooth => match progress(elapsed_ms, SMOOTH_MS) {
                Some(t) => Frame::running(scale(target, ease_in_out(t))),
                None => Frame::settled(target),
            },
            Effect::Sparkle => sparkle(target, self.seed, elapsed_ms),
            Effect::ColorSweep { value } => {
                let step = elapsed_ms / SWEEP_STEP_MS;
                if step >= SWEEP_STEPS {
                    Frame::settled(target)
                } else {
                    let hue = (step * 255 / (SWEEP_STEPS - 1)) as u8;
                    Frame::running(hsv_to_rgb(hue, 255, value))
                }
            }
        }
    }
}

/// Cadence and output level of rainbow mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Rainbow {
    speed: u8,
    brightness: u8,
}

impl Rainbow {
    /// `speed` is clamped to 1-100, `brightness` to 0-100 (percent).
    pub fn new(speed: u8, brightness: u8) -> Self {
        Self {
            speed: speed.clamp(1, 100),
            brightness: brightness.min(100),
        }
    }

    /// Milliseconds between hue updates: 200 at speed 1 down to 10 at 100.
    pub fn interval_ms(&self) -> u64 {
        let span = RAINBOW_SLOWEST_MS - RAINBOW_FASTEST_MS;
        RAINBOW_SLOWEST_MS - u64::from(self.speed - 1) * span / 99
    }

    /// Hue increment per update: 1 at low speeds up to 3 at speed 100.
    pub fn hue_step(&self) -> u8 {
        let span = u16::from(RAINBOW_MAX_HUE_STEP - RAINBOW_MIN_HUE_STEP);
        RAINBOW_MIN_HUE_STEP + (u16::from(self.speed - 1) * span / 99) as u8
    }

    /// HSV value for the configured brightness percentage.
    pub fn value(&self) -> u8 {
        (u16::from(self.brightness) * 255 / 100) as u8
    }

    /// Fully saturated color for `hue` at the configured brightness.
    pub fn color(&self, hue: u8) -> Color {
        hsv_to_rgb(hue, 255, self.value())
    }
}
