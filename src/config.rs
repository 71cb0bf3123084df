//! Compile-time configuration for the pattern engine.
//!
//! Sizes are chosen for a small MCU with a ~2 KiB EEPROM region and a
//! serial receive line that holds one serialized pattern.

/// Firmware version reported by `GET_VERSION`.
pub const FIRMWARE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Baud rate the host side is expected to use. Board bring-up code
/// configures the UART with it; the engine itself never touches the UART.
pub const SERIAL_BAUD: u32 = 115_200;

/// Size of the non-volatile region holding the persisted image.
pub const STORAGE_CAPACITY: usize = 2048;

/// Magic sentinel at offset 0 of a valid persisted image.
pub const STORAGE_MAGIC: u16 = 0xC0_1A;

/// Bytes in front of the stored JSON: magic + length.
pub const STORAGE_HEADER_SIZE: usize = 4;

/// Largest raw pattern JSON the default storage region holds.
pub const STORED_JSON_CAPACITY: usize = STORAGE_CAPACITY - STORAGE_HEADER_SIZE;

/// Maximum length of one inbound line.
pub const LINE_CAPACITY: usize = 1536;

/// Shortest serialized color entry, `{"r":0,"g":0,"b":0},`.
pub const MIN_COLOR_ENTRY_LEN: usize = 20;

/// Maximum number of colors a pattern can carry.
///
/// Sized so that any payload fitting the stored image (and hence the
/// shorter line buffer) never runs out of color slots.
pub const MAX_COLORS: usize = STORED_JSON_CAPACITY / MIN_COLOR_ENTRY_LEN;

/// Hold time per pattern entry before the cursor advances.
pub const CYCLE_INTERVAL_MS: u64 = 1000;

/// Rainbow speed used when a `color_wheel` pattern omits `speed`.
pub const DEFAULT_SPEED: u8 = 50;

/// Rainbow brightness used when a `color_wheel` pattern omits `brightness`.
pub const DEFAULT_BRIGHTNESS: u8 = 100;

/// Rainbow update cadence at speed 100.
pub const RAINBOW_FASTEST_MS: u64 = 10;

/// Rainbow update cadence at speed 1.
pub const RAINBOW_SLOWEST_MS: u64 = 200;

/// Hue increment per rainbow update at speed 1.
pub const RAINBOW_MIN_HUE_STEP: u8 = 1;

/// Hue increment per rainbow update at speed 100.
pub const RAINBOW_MAX_HUE_STEP: u8 = 3;
