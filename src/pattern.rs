//! Pattern store: the authoritative pattern and the engine's cursor state.

use crate::color::{Color, WireColor};
use crate::config::{MAX_COLORS, STORED_JSON_CAPACITY};
use crate::effect::Animation;
use crate::time::TimeInstant;
use crate::transition::Transition;
use heapless::Vec;
use serde::Deserialize;

/// Inbound pattern payload as sent by the host.
///
/// ```json
/// {"count":3,"transition":"fade","pattern":[{"r":255,"g":0,"b":0}],"speed":50,"brightness":80}
/// ```
#[derive(Debug, Deserialize)]
pub struct PatternMessage<'a> {
    pub count: u16,
    #[serde(borrow, default)]
    pub transition: Option<&'a str>,
    pub pattern: Vec<WireColor, MAX_COLORS>,
    #[serde(default)]
    pub speed: Option<u16>,
    #[serde(default)]
    pub brightness: Option<u16>,
}

/// Pattern parsing errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PatternError {
    /// Payload is not a valid pattern object (includes more than
    /// `MAX_COLORS` entries, which no payload fitting storage can carry).
    Json,
}

impl core::fmt::Display for PatternError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PatternError::Json => write!(f, "invalid pattern JSON"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for PatternError {}

/// An ordered list of colors plus how to render them.
///
/// An empty pattern means "off", whatever its transition.
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    colors: Vec<Color, MAX_COLORS>,
    transition: Transition,
}

impl Pattern {
    /// The empty pattern.
    pub const fn off() -> Self {
        Self {
            colors: Vec::new(),
            transition: Transition::Instant,
        }
    }

    /// Parses a wire payload.
    pub fn from_json(json: &[u8]) -> Result<Self, PatternError> {
        let (message, _) = serde_json_core::from_slice::<PatternMessage<'_>>(json)
            .map_err(|_| PatternError::Json)?;
        Ok(Self::from_message(&message))
    }

    /// Builds a pattern from a decoded payload.
    ///
    /// `count` selects how many leading entries are used; it is clamped to
    /// the array length, so `count` larger than the array is not an error.
    pub fn from_message(message: &PatternMessage<'_>) -> Self {
        let len = usize::from(message.count).min(message.pattern.len());
        let colors = message.pattern[..len].iter().map(|&c| Color::from(c)).collect();
        let transition = Transition::parse(
            message.transition.unwrap_or("instant"),
            message.speed,
            message.brightness,
        );
        Self { colors, transition }
    }

    /// Number of colors.
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_off(&self) -> bool {
        self.colors.is_empty()
    }

    /// Color at `index`, if present.
    pub fn color(&self, index: usize) -> Option<Color> {
        self.colors.get(index).copied()
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    pub fn transition(&self) -> Transition {
        self.transition
    }
}

impl Default for Pattern {
    fn default() -> Self {
        Self::off()
    }
}

/// Everything the engine remembers between ticks.
///
/// Owned by the caller and handed to [`Scheduler`](crate::Scheduler) on
/// every tick.
pub struct EngineState<I: TimeInstant> {
    pub(crate) pattern: Pattern,
    pub(crate) raw: Vec<u8, STORED_JSON_CAPACITY>,
    pub(crate) color_index: usize,
    pub(crate) last_change: Option<I>,
    pub(crate) rainbow_hue: u8,
    pub(crate) rainbow_mode: bool,
    pub(crate) last_rainbow_step: Option<I>,
    pub(crate) animation: Option<(Animation, I)>,
}

impl<I: TimeInstant> EngineState<I> {
    /// Creates the "off" state.
    pub const fn new() -> Self {
        Self {
            pattern: Pattern::off(),
            raw: Vec::new(),
            color_index: 0,
            last_change: None,
            rainbow_hue: 0,
            rainbow_mode: false,
            last_rainbow_step: None,
            animation: None,
        }
    }

    /// Replaces the pattern wholesale and rewinds cursor and timers.
    ///
    /// `raw` is the payload the pattern was parsed from, kept verbatim for
    /// `GET_PATTERN`. The buffer holds anything the default storage region
    /// can; a longer payload is kept empty.
    pub fn replace(&mut self, pattern: Pattern, raw: &[u8], now: I) {
        self.raw.clear();
        if self.raw.extend_from_slice(raw).is_err() {
            self.raw.clear();
        }
        self.install(pattern, now);
    }

    /// Installs a pattern whose raw payload already sits in `self.raw`.
    pub(crate) fn install(&mut self, pattern: Pattern, now: I) {
        self.rainbow_mode = !pattern.is_off() && pattern.transition().rainbow().is_some();
        self.pattern = pattern;
        self.color_index = 0;
        self.last_change = Some(now);
        self.rainbow_hue = 0;
        self.last_rainbow_step = None;
        self.animation = None;
    }

    /// Drops the pattern and returns to the off state.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// Raw JSON of the last accepted pattern (empty if none).
    pub fn raw_json(&self) -> &[u8] {
        &self.raw
    }

    pub fn color_index(&self) -> usize {
        self.color_index
    }

    /// Color the cursor currently points at.
    pub fn current_target(&self) -> Option<Color> {
        self.pattern.color(self.color_index)
    }

    pub fn rainbow_hue(&self) -> u8 {
        self.rainbow_hue
    }

    pub fn is_rainbow_mode(&self) -> bool {
        self.rainbow_mode
    }

    /// Whether a one-shot animation is still playing.
    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    /// Moves the cursor to the next color, wrapping at the end.
    pub(crate) fn advance_cursor(&mut self) {
        let len = self.pattern.len();
        if len > 0 {
            self.color_index = (self.color_index + 1) % len;
        }
    }
}

impl<I: TimeInstant> Default for EngineState<I> {
    fn default() -> Self {
        Self::new()
    }
}
