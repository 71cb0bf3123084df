//! LED driver abstraction and the PWM implementation for common-anode LEDs.

use crate::color::Color;
use embedded_hal::pwm::SetDutyCycle;

/// Trait for abstracting RGB LED hardware.
///
/// Implement this for your LED hardware (GPIO, PWM, SPI, etc.) to allow
/// the engine to control it.
pub trait RgbLed {
    /// Sets the LED to the specified RGB color.
    ///
    /// Writing the same color twice must leave the hardware in the same
    /// state. Handle any hardware errors internally - this method cannot
    /// fail.
    fn set_color(&mut self, color: Color);
}

/// Duty value for an active-low channel: 0 is fully on, 255 fully off.
#[inline]
pub const fn active_low(level: u8) -> u8 {
    u8::MAX - level
}

/// Three PWM channels driving a common-anode (active-low) RGB LED.
///
/// Channel levels are written as a fraction of 255 so the timer's actual
/// resolution does not matter. No gamma correction is applied.
pub struct PwmRgbLed<R, G, B> {
    red: R,
    green: G,
    blue: B,
}

impl<R, G, B> PwmRgbLed<R, G, B>
where
    R: SetDutyCycle,
    G: SetDutyCycle,
    B: SetDutyCycle,
{
    /// Wraps three PWM channels. The channels must already be enabled.
    pub fn new(red: R, green: G, blue: B) -> Self {
        Self { red, green, blue }
    }

    /// Releases the PWM channels.
    pub fn release(self) -> (R, G, B) {
        (self.red, self.green, self.blue)
    }
}

fn write_channel<P: SetDutyCycle>(channel: &mut P, level: u8) {
    // PWM writes are treated as infallible.
    let _ = channel.set_duty_cycle_fraction(u16::from(active_low(level)), u16::from(u8::MAX));
}

impl<R, G, B> RgbLed for PwmRgbLed<R, G, B>
where
    R: SetDutyCycle,
    G: SetDutyCycle,
    B: SetDutyCycle,
{
    fn set_color(&mut self, color: Color) {
        write_channel(&mut self.red, color.red);
        write_channel(&mut self.green, color.green);
        write_channel(&mut self.blue, color.blue);
    }
}
