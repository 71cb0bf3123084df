#![cfg_attr(not(feature = "std"), no_std)]
#![doc = include_str!("../README.md")]

//! # Core Concepts
//!
//! - **`Scheduler`**: The cooperative main loop; owns the LED, serial port and storage
//! - **`EngineState`**: The current pattern, color cursor and rainbow counters, owned by the caller
//! - **`Pattern`**: Ordered colors plus a `Transition`; an empty pattern means "off"
//! - **`Transition`**: Closed set of rendering styles (`Fade`, `Pulse`, ..., `ColorWheel`)
//! - **`Animation`**: A one-shot effect evaluated as a pure function of elapsed time
//! - **`PatternStorage`**: Magic-guarded image of the last accepted pattern in non-volatile memory
//! - **`RgbLed`**: Trait to implement for your LED hardware (`PwmRgbLed` covers active-low PWM)
//! - **`TimeSource`**: Trait to implement for your timing system
//!
//! Colors are 8-bit `Srgb<u8>` values, matching both the wire format and the
//! PWM resolution.

// Must come first so the logging macros are visible to the other modules.
#[macro_use]
mod fmt;

pub mod color;
pub mod config;
pub mod effect;
pub mod led;
pub mod pattern;
pub mod protocol;
pub mod scheduler;
pub mod storage;
pub mod time;
pub mod transition;

pub use color::{hsv_to_rgb, Color, WireColor, COLOR_OFF};
pub use effect::{Animation, Effect, Frame, Rainbow};
pub use led::{PwmRgbLed, RgbLed};
pub use palette::Srgb;
pub use pattern::{EngineState, Pattern, PatternError, PatternMessage};
pub use protocol::{Command, Feed, LineBuffer, ProtocolError, Reply};
pub use scheduler::Scheduler;
pub use storage::{PatternStorage, StorageError};
pub use time::{TimeDuration, TimeInstant, TimeSource};
pub use transition::Transition;
