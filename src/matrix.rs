//! The drawing context handed to every renderer.
//!
//! [`Matrix`] is constructed once at startup and owns the surface, the
//! output sink and the brightness controller. Engines and views never see
//! pins; they only get `&mut impl Canvas`.
//!
//! ## Rust concepts
//! - Traits with default methods: `set_pixel`/`clear` come for free
//! - Errors swallowed at a boundary on purpose: the core has no error path,
//!   so hardware failures are logged here and nowhere else

use crate::brightness::{BrightnessController, SimulatedPwm};
use crate::driver::{FrameSink, SimulatedPanel};
use crate::hw_map::PhysicalFrame;
use crate::surface::{Orientation, PixelSurface};
use embedded_hal::pwm::SetDutyCycle;

// ── Canvas ───────────────────────────────────────────────────────────

/// Drawing capability: a surface plus a commit point.
pub trait Canvas {
    fn surface(&self) -> &PixelSurface;

    fn surface_mut(&mut self) -> &mut PixelSurface;

    /// Make everything drawn since the last commit visible.
    fn render(&mut self);

    /// Change global brightness. Pixel data is left alone.
    fn set_brightness(&mut self, level: u8);

    fn set_pixel(&mut self, x: i32, y: i32, on: bool) {
        self.surface_mut().set_pixel(x, y, on);
    }

    fn clear(&mut self) {
        self.surface_mut().clear();
    }
}

// ── Matrix ───────────────────────────────────────────────────────────

pub struct Matrix<S, P> {
    surface: PixelSurface,
    sink: S,
    brightness: BrightnessController<P>,
    commits: u64,
}

impl<S: FrameSink, P: SetDutyCycle> Matrix<S, P> {
    pub fn new(orientation: Orientation, sink: S, pwm: P) -> Self {
        Self {
            surface: PixelSurface::new(orientation),
            sink,
            brightness: BrightnessController::new(pwm),
            commits: 0,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn brightness(&self) -> &BrightnessController<P> {
        &self.brightness
    }

    /// Number of render calls so far.
    pub fn commits(&self) -> u64 {
        self.commits
    }
}

/// A matrix backed by [`SimulatedPanel`] and [`SimulatedPwm`].
pub type SimulatedMatrix = Matrix<SimulatedPanel, SimulatedPwm>;

impl SimulatedMatrix {
    pub fn simulated(orientation: Orientation) -> Self {
        Self::new(orientation, SimulatedPanel::new(), SimulatedPwm::default())
    }
}

impl<S: FrameSink, P: SetDutyCycle> Canvas for Matrix<S, P> {
    fn surface(&self) -> &PixelSurface {
        &self.surface
    }

    fn surface_mut(&mut self) -> &mut PixelSurface {
        &mut self.surface
    }

    fn render(&mut self) {
        let frame = PhysicalFrame::from_surface(&self.surface);
        if let Err(e) = self.sink.commit(&frame) {
            tracing::warn!("Frame commit failed: {:?}", e);
        }
        self.commits += 1;
    }

    fn set_brightness(&mut self, level: u8) {
        if let Err(e) = self.brightness.set_brightness(level) {
            tracing::warn!("Failed to set brightness {}: {:?}", level, e);
        }
        self.surface.set_level(level);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn render_is_the_only_commit_point() {
        let mut matrix = SimulatedMatrix::simulated(Orientation::Normal);
        matrix.set_pixel(0, 15, true);
        assert_eq!(matrix.sink().latched().lit_count(), 0);

        matrix.render();

        assert_eq!(matrix.sink().commits(), 1);
        assert!(matrix.sink().latched().bit(0));
    }

    #[test]
    fn brightness_zero_keeps_pixels() {
        let mut matrix = SimulatedMatrix::simulated(Orientation::Rotated180);
        matrix.set_pixel(5, 5, true);
        matrix.set_brightness(0);
        matrix.set_pixel(6, 6, true);
        matrix.render();

        assert_eq!(matrix.sink().latched().lit_count(), 2);
        assert_eq!(matrix.brightness().pwm().duty(), 255);
    }

    #[test]
    fn clear_then_render_blanks_the_panel() {
        let mut matrix = SimulatedMatrix::simulated(Orientation::Normal);
        matrix.set_pixel(1, 1, true);
        matrix.render();
        matrix.clear();
        matrix.render();

        assert_eq!(matrix.sink().latched().lit_count(), 0);
        assert_eq!(matrix.commits(), 2);
    }
}
