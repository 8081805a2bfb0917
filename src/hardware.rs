//! Raspberry Pi wiring via `rppal`.
//!
//! Only compiled with the `hardware` feature. Everything above this module
//! sees plain `embedded-hal` traits, so the rest of the crate (and its
//! tests) never needs a Pi.

use crate::brightness::PWM_CARRIER_HZ;
use crate::button::DebouncedButton;
use crate::driver::ShiftRegisterDriver;
use crate::matrix::Matrix;
use crate::surface::Orientation;
use crate::PinConfig;
use embedded_hal::pwm::{self, ErrorKind, ErrorType, SetDutyCycle};
use rppal::gpio::{Gpio, InputPin, OutputPin};
use rppal::hal::Delay;
use std::fmt;

pub type HardwareDriver = ShiftRegisterDriver<OutputPin, OutputPin, OutputPin, Delay>;
pub type HardwareMatrix = Matrix<HardwareDriver, SoftPwm>;
pub type HardwareButton = DebouncedButton<InputPin>;

// ── Software PWM on the enable line ──────────────────────────────────

/// `rppal` GPIO error surfaced through `embedded-hal`'s PWM error trait.
#[derive(Debug)]
pub struct PwmError(rppal::gpio::Error);

impl fmt::Display for PwmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "software PWM failed: {}", self.0)
    }
}

impl std::error::Error for PwmError {}

impl pwm::Error for PwmError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// 8-bit software PWM on an output pin, at [`PWM_CARRIER_HZ`].
pub struct SoftPwm {
    pin: OutputPin,
}

impl SoftPwm {
    pub fn new(pin: OutputPin) -> Self {
        Self { pin }
    }
}

impl ErrorType for SoftPwm {
    type Error = PwmError;
}

impl SetDutyCycle for SoftPwm {
    fn max_duty_cycle(&self) -> u16 {
        u16::from(u8::MAX)
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), PwmError> {
        let fraction = f64::from(duty.min(self.max_duty_cycle())) / f64::from(self.max_duty_cycle());
        self.pin
            .set_pwm_frequency(f64::from(PWM_CARRIER_HZ), fraction)
            .map_err(PwmError)
    }
}

// ── Panel setup ──────────────────────────────────────────────────────

/// Claim the GPIO lines in `pins` and build the panel plus its button.
///
/// # Rust concept: Result and the ? operator
/// Opening `/dev/gpiomem` or claiming a pin can fail (wrong board, pin
/// already in use). Every step propagates with `?`.
pub fn create_panel(
    pins: PinConfig,
    orientation: Orientation,
) -> Result<(HardwareMatrix, HardwareButton), Box<dyn std::error::Error>> {
    let gpio = Gpio::new()?;
    let data = gpio.get(pins.data)?.into_output_low();
    let clock = gpio.get(pins.clock)?.into_output_low();
    let latch = gpio.get(pins.latch)?.into_output_low();
    let enable = gpio.get(pins.enable)?.into_output_low();
    let button = gpio.get(pins.button)?.into_input_pullup();

    let driver = ShiftRegisterDriver::new(data, clock, latch, Delay::new())?;
    let matrix = Matrix::new(orientation, driver, SoftPwm::new(enable));

    tracing::info!(
        "GPIO ready: data={} clock={} latch={} enable={} button={}",
        pins.data,
        pins.clock,
        pins.latch,
        pins.enable,
        pins.button
    );
    Ok((matrix, DebouncedButton::new(button)))
}
