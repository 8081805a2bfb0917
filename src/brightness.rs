//! Global brightness via PWM on the panel's output-enable line.
//!
//! The enable line is active low, so the duty cycle is inverted:
//! brightness 255 is duty 0 (always enabled), brightness 0 is duty 255.

use core::convert::Infallible;
use embedded_hal::pwm::{ErrorType, SetDutyCycle};

/// PWM carrier on the enable line.
pub const PWM_CARRIER_HZ: u32 = 5_000;

/// Inverted duty value (out of 255) for a brightness level.
pub fn duty_for(level: u8) -> u8 {
    u8::MAX - level
}

pub struct BrightnessController<P> {
    pwm: P,
    level: u8,
}

impl<P: SetDutyCycle> BrightnessController<P> {
    /// Wrap a PWM channel. Nothing is written until the first
    /// [`set_brightness`](Self::set_brightness).
    pub fn new(pwm: P) -> Self {
        Self { pwm, level: 0 }
    }

    /// Dim or brighten the whole panel without touching pixel data.
    pub fn set_brightness(&mut self, level: u8) -> Result<(), P::Error> {
        self.level = level;
        self.pwm
            .set_duty_cycle_fraction(u16::from(duty_for(level)), u16::from(u8::MAX))
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn pwm(&self) -> &P {
        &self.pwm
    }
}

// ── Simulated PWM ────────────────────────────────────────────────────

/// 8-bit PWM channel that only remembers its duty cycle.
#[derive(Debug, Default)]
pub struct SimulatedPwm {
    duty: u16,
}

impl SimulatedPwm {
    pub fn duty(&self) -> u16 {
        self.duty
    }
}

impl ErrorType for SimulatedPwm {
    type Error = Infallible;
}

impl SetDutyCycle for SimulatedPwm {
    fn max_duty_cycle(&self) -> u16 {
        u16::from(u8::MAX)
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Infallible> {
        self.duty = duty;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(0, 255)]
    #[case(255, 0)]
    #[case(200, 55)]
    #[case(10, 245)]
    fn duty_is_inverted(#[case] level: u8, #[case] duty: u16) {
        let mut controller = BrightnessController::new(SimulatedPwm::default());
        controller.set_brightness(level).unwrap();
        assert_eq!(controller.pwm().duty(), duty);
        assert_eq!(controller.level(), level);
    }
}
