//! Output side of the panel: pushing a [`PhysicalFrame`] into hardware.
//!
//! [`FrameSink`] is the capability boundary. The real implementation,
//! [`ShiftRegisterDriver`], bit-bangs the data/clock/latch lines through
//! `embedded-hal` traits, with pulse timing taken from an injected
//! [`DelayNs`]. [`SimulatedPanel`] stands in when no hardware is attached.
//!
//! ## Rust concepts
//! - Associated types (`type Error`) so each sink reports its own error
//! - Generic structs bounded by `embedded-hal` traits instead of concrete pins
//! - `core::convert::Infallible` for sinks that cannot fail

use crate::hw_map::PhysicalFrame;
use core::convert::Infallible;
use core::fmt::Debug;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{OutputPin, PinState};

/// Half-period of the shift clock, in microseconds.
pub const CLOCK_PULSE_US: u32 = 4;
/// Settle and pulse width around the latch strobe, in microseconds.
pub const LATCH_PULSE_US: u32 = 5;

// ── FrameSink ────────────────────────────────────────────────────────

/// Something that can make a physical frame visible.
pub trait FrameSink {
    type Error: Debug;

    /// Shift out all 256 bits and latch them. Pixels change only when this
    /// returns.
    fn commit(&mut self, frame: &PhysicalFrame) -> Result<(), Self::Error>;
}

// ── Shift register driver ────────────────────────────────────────────

/// Serial driver for the panel's chained shift registers.
pub struct ShiftRegisterDriver<DATA, CLK, LATCH, DELAY> {
    data: DATA,
    clock: CLK,
    latch: LATCH,
    delay: DELAY,
}

impl<DATA, CLK, LATCH, DELAY, E> ShiftRegisterDriver<DATA, CLK, LATCH, DELAY>
where
    DATA: OutputPin<Error = E>,
    CLK: OutputPin<Error = E>,
    LATCH: OutputPin<Error = E>,
    DELAY: DelayNs,
    E: Debug,
{
    /// Take ownership of the pins and drive them all low.
    pub fn new(mut data: DATA, mut clock: CLK, mut latch: LATCH, delay: DELAY) -> Result<Self, E> {
        data.set_low()?;
        clock.set_low()?;
        latch.set_low()?;
        Ok(Self {
            data,
            clock,
            latch,
            delay,
        })
    }

    fn shift_out(&mut self, frame: &PhysicalFrame) -> Result<(), E> {
        for bit in frame.iter_bits() {
            self.data.set_state(PinState::from(bit))?;
            self.clock.set_high()?;
            self.delay.delay_us(CLOCK_PULSE_US);
            self.clock.set_low()?;
            self.delay.delay_us(CLOCK_PULSE_US);
        }
        Ok(())
    }

    fn strobe_latch(&mut self) -> Result<(), E> {
        self.delay.delay_us(LATCH_PULSE_US);
        self.latch.set_high()?;
        self.delay.delay_us(LATCH_PULSE_US);
        self.latch.set_low()
    }

    /// Give the pins back, e.g. to reconfigure them.
    pub fn release(self) -> (DATA, CLK, LATCH, DELAY) {
        (self.data, self.clock, self.latch, self.delay)
    }
}

impl<DATA, CLK, LATCH, DELAY, E> FrameSink for ShiftRegisterDriver<DATA, CLK, LATCH, DELAY>
where
    DATA: OutputPin<Error = E>,
    CLK: OutputPin<Error = E>,
    LATCH: OutputPin<Error = E>,
    DELAY: DelayNs,
    E: Debug,
{
    type Error = E;

    fn commit(&mut self, frame: &PhysicalFrame) -> Result<(), E> {
        self.shift_out(frame)?;
        self.strobe_latch()
    }
}

// ── Simulated panel ──────────────────────────────────────────────────

/// In-memory sink: remembers the last latched frame and counts commits.
#[derive(Debug, Default)]
pub struct SimulatedPanel {
    latched: PhysicalFrame,
    commits: u64,
}

impl SimulatedPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latched(&self) -> &PhysicalFrame {
        &self.latched
    }

    pub fn commits(&self) -> u64 {
        self.commits
    }
}

impl FrameSink for SimulatedPanel {
    type Error = Infallible;

    fn commit(&mut self, frame: &PhysicalFrame) -> Result<(), Infallible> {
        if *frame != self.latched {
            tracing::trace!("frame {}:\n{}", self.commits, frame.to_ascii());
        }
        self.latched = *frame;
        self.commits += 1;
        Ok(())
    }
}
