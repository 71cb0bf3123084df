//! Color types and integer color math.
//!
//! Colors are 8-bit `Srgb<u8>` triples, the same resolution the wire format
//! and the PWM hardware use. Interpolation goes through `Srgb<f32>` so that
//! palette's mixing does the arithmetic.

use palette::{Mix, Srgb};
use serde::{Deserialize, Serialize};

/// An 8-bit RGB color.
pub type Color = Srgb<u8>;

/// All channels off.
pub const COLOR_OFF: Color = Srgb::new(0, 0, 0);

/// Color as it appears on the wire: `{"r":255,"g":0,"b":0}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WireColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl From<WireColor> for Color {
    fn from(c: WireColor) -> Self {
        Srgb::new(c.r, c.g, c.b)
    }
}

impl From<Color> for WireColor {
    fn from(c: Color) -> Self {
        WireColor {
            r: c.red,
            g: c.green,
            b: c.blue,
        }
    }
}

/// Converts an HSV triple (all channels 0-255) to RGB.
///
/// The hue circle is split into six regions of 43 steps each (the last
/// region absorbs the remainder). Zero saturation yields a gray of `value`.
pub fn hsv_to_rgb(hue: u8, saturation: u8, value: u8) -> Color {
    if saturation == 0 {
        return Srgb::new(value, value, value);
    }

    let h = u16::from(hue);
    let s = u16::from(saturation);
    let v = u16::from(value);

    let region = h / 43;
    let remainder = (h - region * 43) * 6;

    let p = (v * (255 - s)) >> 8;
    let q = (v * (255 - ((s * remainder) >> 8))) >> 8;
    let t = (v * (255 - ((s * (255 - remainder)) >> 8))) >> 8;

    // All intermediates are <= 255 after the shift.
    let (r, g, b) = match region {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };

    Srgb::new(r as u8, g as u8, b as u8)
}

/// Scales every channel by `factor`, clamping to 0-255.
///
/// Factors above 1.0 are allowed (the bounce overshoot uses them).
pub fn scale(color: Color, factor: f32) -> Color {
    let channel = |c: u8| (f32::from(c) * factor).clamp(0.0, 255.0) as u8;
    Srgb::new(channel(color.red), channel(color.green), channel(color.blue))
}

/// Linear blend from `from` to `to`; `t` is clamped to 0.0-1.0.
pub fn blend(from: Color, to: Color, t: f32) -> Color {
    let from: Srgb<f32> = from.into_format();
    let to: Srgb<f32> = to.into_format();
    from.mix(to, t.clamp(0.0, 1.0)).into_format()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_saturation_is_gray() {
        assert_eq!(hsv_to_rgb(0, 0, 77), Srgb::new(77, 77, 77));
        assert_eq!(hsv_to_rgb(200, 0, 255), Srgb::new(255, 255, 255));
    }

    #[test]
    fn scale_clamps_overshoot() {
        let c = scale(Srgb::new(200, 100, 0), 1.5);
        assert_eq!(c, Srgb::new(255, 150, 0));
        assert_eq!(scale(Srgb::new(200, 100, 0), -0.2), COLOR_OFF);
    }

    #[test]
    fn blend_endpoints() {
        let target = Srgb::new(255, 0, 255);
        assert_eq!(blend(COLOR_OFF, target, 0.0), COLOR_OFF);
        assert_eq!(blend(COLOR_OFF, target, 1.0), target);
    }
}
