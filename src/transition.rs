//! Transition kinds a pattern can request.

use crate::config::{DEFAULT_BRIGHTNESS, DEFAULT_SPEED};
use crate::effect::{Effect, Rainbow};

/// How a pattern's colors are rendered.
///
/// Parsed from the wire `transition` name. Only `ColorWheel` carries
/// parameters; its `speed` is 1-100 and `brightness` 0-100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Transition {
    /// Jump straight to the color.
    #[default]
    Instant,
    /// Linear fade up from black.
    Fade,
    /// Fast fade up from black.
    Wipe,
    /// Brightness envelope up and back down, then settle.
    Pulse,
    /// Five quick flashes, then settle.
    Strobe,
    /// Elastic overshoot into the color.
    Bounce,
    /// Sine fade in and out with holds.
    Breathe,
    /// Off/on/off/on.
    Blink,
    /// Double beat.
    Heartbeat,
    /// Eased fade up from black.
    Smooth,
    /// Random flickers, then settle.
    Sparkle,
    /// Continuous hue cycling, independent of the pattern colors.
    ColorWheel { speed: u8, brightness: u8 },
}

impl Transition {
    /// Resolves a wire name. Unknown names fall back to `Instant`.
    ///
    /// `speed` and `brightness` only matter for `color_wheel`; they are
    /// clamped to 1-100 and 0-100 respectively.
    pub fn parse(name: &str, speed: Option<u16>, brightness: Option<u16>) -> Self {
        match name {
            "instant" => Transition::Instant,
            "fade" => Transition::Fade,
            "wipe" => Transition::Wipe,
            "pulse" => Transition::Pulse,
            "strobe" => Transition::Strobe,
            "bounce" => Transition::Bounce,
            "breathe" => Transition::Breathe,
            "blink" => Transition::Blink,
            "heartbeat" => Transition::Heartbeat,
            "smooth" => Transition::Smooth,
            "sparkle" => Transition::Sparkle,
            "color_wheel" => Transition::ColorWheel {
                speed: speed.map_or(DEFAULT_SPEED, |s| s.clamp(1, 100) as u8),
                brightness: brightness.map_or(DEFAULT_BRIGHTNESS, |b| b.min(100) as u8),
            },
            _ => Transition::Instant,
        }
    }

    /// Wire name of this transition.
    pub fn name(&self) -> &'static str {
        match self {
            Transition::Instant => "instant",
            Transition::Fade => "fade",
            Transition::Wipe => "wipe",
            Transition::Pulse => "pulse",
            Transition::Strobe => "strobe",
            Transition::Bounce => "bounce",
            Transition::Breathe => "breathe",
            Transition::Blink => "blink",
            Transition::Heartbeat => "heartbeat",
            Transition::Smooth => "smooth",
            Transition::Sparkle => "sparkle",
            Transition::ColorWheel { .. } => "color_wheel",
        }
    }

    /// One-shot effect played when a color of this pattern becomes current.
    pub fn effect(&self) -> Effect {
        match self {
            Transition::Instant => Effect::Instant,
            Transition::Fade => Effect::Fade,
            Transition::Wipe => Effect::Wipe,
            Transition::Pulse => Effect::Pulse,
            Transition::Strobe => Effect::Strobe,
            Transition::Bounce => Effect::Bounce,
            Transition::Breathe => Effect::Breathe,
            Transition::Blink => Effect::Blink,
            Transition::Heartbeat => Effect::Heartbeat,
            Transition::Smooth => Effect::Smooth,
            Transition::Sparkle => Effect::Sparkle,
            Transition::ColorWheel { speed, brightness } => Effect::ColorSweep {
                value: Rainbow::new(*speed, *brightness).value(),
            },
        }
    }

    /// Whether a single-color pattern replays its effect to keep moving.
    pub fn loops(&self) -> bool {
        matches!(
            self,
            Transition::Fade
                | Transition::Pulse
                | Transition::Strobe
                | Transition::Breathe
                | Transition::Bounce
                | Transition::Blink
                | Transition::Heartbeat
                | Transition::Smooth
                | Transition::Sparkle
        )
    }

    /// Rainbow parameters, if this transition runs rainbow mode.
    pub fn rainbow(&self) -> Option<Rainbow> {
        match *self {
            Transition::ColorWheel { speed, brightness } => Some(Rainbow::new(speed, brightness)),
            _ => None,
        }
    }
}
